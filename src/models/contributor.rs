//! Contributor payload and row types shared by all three contribution
//! layers (work, edition, short story).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::refs::IdName;

/// One contribution as it appears in API payloads:
/// `{"person": {"id": ..}, "role": {"id": ..}, "description": ".."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub person: ContributionRef,
    pub role: ContributionRef,
    #[serde(default)]
    pub description: Option<String>,
}

/// Reference to a person or role inside a contribution. Name is filled on
/// the way out and ignored on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRef {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Contribution {
    pub fn new(person: IdName, role: IdName, description: Option<String>) -> Self {
        Self {
            person: ContributionRef {
                id: person.id,
                name: Some(person.name),
            },
            role: ContributionRef {
                id: role.id,
                name: Some(role.name),
            },
            description,
        }
    }
}

/// A stored contributor row joined with person and role names.
#[derive(Debug, Clone, FromRow)]
pub struct ContributorRow {
    pub person_id: i32,
    pub person_name: String,
    pub role_id: i32,
    pub role_name: String,
    pub description: Option<String>,
}

impl From<ContributorRow> for Contribution {
    fn from(row: ContributorRow) -> Self {
        Contribution {
            person: ContributionRef {
                id: row.person_id,
                name: Some(row.person_name),
            },
            role: ContributionRef {
                id: row.role_id,
                name: Some(row.role_name),
            },
            description: row.description,
        }
    }
}
