//! Short story model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::contributor::Contribution;
use super::refs::IdName;

/// Brief schema used in contained-shorts lists and person pages.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShortBrief {
    pub id: i32,
    pub title: String,
    pub orig_title: Option<String>,
    pub pubyear: Option<i32>,
    #[sqlx(default)]
    pub story_type: Option<String>,
    #[sqlx(default)]
    pub author_str: Option<String>,
}

/// Plain short story row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct ShortRow {
    pub id: i32,
    pub title: String,
    pub orig_title: Option<String>,
    pub language: Option<i32>,
    pub pubyear: Option<i32>,
    pub story_type: Option<i32>,
}

/// Full short story schema.
#[derive(Debug, Clone, Serialize)]
pub struct Short {
    pub id: i32,
    pub title: String,
    pub orig_title: Option<String>,
    pub language_name: Option<IdName>,
    pub pubyear: Option<i32>,
    pub story_type: Option<IdName>,
    pub contributors: Vec<Contribution>,
    pub tags: Vec<IdName>,
    /// Editions this short appears in.
    pub editions: Vec<super::edition::EditionBrief>,
    /// Magazine issues this short appears in.
    pub issues: Vec<super::magazine::IssueBrief>,
}
