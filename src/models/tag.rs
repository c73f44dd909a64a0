//! Tag model. Tags attach to works, shorts, articles, issues, magazines
//! and persons through per-target junction tables.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::refs::IdName;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TagBrief {
    pub id: i32,
    pub name: String,
    #[sqlx(default)]
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub tag_type: Option<IdName>,
    pub description: Option<String>,
    pub works: Vec<super::work::WorkBrief>,
    pub stories: Vec<super::short::ShortBrief>,
    pub people: Vec<IdName>,
}

/// Reference counts used by the delete guard. A tag is only deletable
/// when every count is zero.
#[derive(Debug, Clone, Default, FromRow)]
pub struct TagRefCounts {
    pub works: i64,
    pub stories: i64,
    pub articles: i64,
    pub issues: i64,
    pub people: i64,
    pub magazines: i64,
}
