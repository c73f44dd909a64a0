//! Magazine, issue and article models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::contributor::Contribution;
use super::refs::IdName;
use super::short::ShortBrief;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MagazineBrief {
    pub id: i32,
    pub name: String,
    pub issn: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Magazine {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub issn: Option<String>,
    pub link: Option<String>,
    pub magazine_type: Option<IdName>,
    pub publisher: Option<IdName>,
    pub issues: Vec<IssueBrief>,
    pub tags: Vec<IdName>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IssueBrief {
    pub id: i32,
    pub magazine_id: i32,
    pub year: Option<i32>,
    pub number: Option<i32>,
    pub number_extra: Option<String>,
    pub count: Option<i32>,
    #[sqlx(default)]
    pub magazine_name: Option<String>,
    #[sqlx(default)]
    pub cover_number: Option<String>,
}

/// Plain issue row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct IssueRow {
    pub id: i32,
    pub magazine_id: i32,
    pub year: Option<i32>,
    pub number: Option<i32>,
    pub number_extra: Option<String>,
    pub count: Option<i32>,
    pub pages: Option<i32>,
    pub size_id: Option<i32>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub link: Option<String>,
    pub image_src: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub id: i32,
    pub magazine: IdName,
    pub year: Option<i32>,
    pub number: Option<i32>,
    pub number_extra: Option<String>,
    pub count: Option<i32>,
    pub pages: Option<i32>,
    pub size: Option<IdName>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub link: Option<String>,
    pub image_src: Option<String>,
    pub contributors: Vec<Contribution>,
    pub articles: Vec<ArticleBrief>,
    /// Contained shorts in reading order.
    pub stories: Vec<ShortBrief>,
    pub tags: Vec<IdName>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ArticleBrief {
    pub id: i32,
    pub title: String,
    pub person: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub person: Option<String>,
    pub issue_id: Option<i32>,
    pub excerpt: Option<String>,
    pub author_rel: Vec<IdName>,
    pub tags: Vec<IdName>,
}
