//! Award models. An Awarded row links an award and category to exactly
//! one of person, work or short story.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::refs::IdName;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Award {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub domestic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AwardCategory {
    pub id: i32,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub category_type: Option<i32>,
}

/// Polymorphic target surfaced as a tagged variant in the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "lowercase")]
pub enum AwardTarget {
    Person(IdName),
    Work(IdName),
    Story(IdName),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Awarded {
    pub id: i32,
    pub award: IdName,
    pub category: IdName,
    pub year: Option<i32>,
    #[serde(flatten)]
    pub target: AwardTarget,
}
