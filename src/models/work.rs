//! Work model. A work is the abstract literary entity; concrete printings
//! are editions. `author_str` is derived and persisted at write time.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::contributor::Contribution;
use super::edition::Edition;
use super::refs::{Genre, IdName, Link};
use super::short::ShortBrief;

/// Brief schema used in list results and person pages.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkBrief {
    pub id: i32,
    pub title: String,
    pub orig_title: Option<String>,
    pub pubyear: Option<i32>,
    pub author_str: Option<String>,
    #[sqlx(default)]
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Plain work row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct WorkRow {
    pub id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub orig_title: Option<String>,
    pub pubyear: Option<i32>,
    pub language: Option<i32>,
    pub bookseries_id: Option<i32>,
    pub bookseriesnum: Option<String>,
    pub bookseriesorder: Option<i32>,
    #[sqlx(rename = "type")]
    pub work_type: Option<i32>,
    pub description: Option<String>,
    pub descr_attr: Option<String>,
    pub misc: Option<String>,
    pub imported_string: Option<String>,
    pub author_str: Option<String>,
}

/// Full work schema.
#[derive(Debug, Clone, Serialize)]
pub struct Work {
    pub id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub orig_title: Option<String>,
    pub pubyear: Option<i32>,
    pub language_name: Option<IdName>,
    pub bookseries: Option<IdName>,
    pub bookseriesnum: Option<String>,
    pub bookseriesorder: Option<i32>,
    pub work_type: Option<IdName>,
    pub description: Option<String>,
    pub descr_attr: Option<String>,
    pub misc: Option<String>,
    pub author_str: Option<String>,
    pub contributions: Vec<Contribution>,
    pub genres: Vec<Genre>,
    pub tags: Vec<IdName>,
    pub links: Vec<Link>,
    pub editions: Vec<Edition>,
    /// Contained shorts in reading order.
    pub stories: Vec<ShortBrief>,
    pub awards: Vec<super::award::Awarded>,
}
