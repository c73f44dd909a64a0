//! Person model: brief schema for lists, full schema for GETs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::edition::EditionBrief;
use super::refs::{IdName, Link};
use super::short::ShortBrief;
use super::work::WorkBrief;

/// Brief schema used by the people list and filter endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PersonBrief {
    pub id: i32,
    pub name: String,
    pub alt_name: Option<String>,
    pub fullname: Option<String>,
    pub dob: Option<i32>,
    pub dod: Option<i32>,
    pub nationality: Option<String>,
    #[sqlx(default)]
    pub workcount: Option<i64>,
    #[sqlx(default)]
    pub storycount: Option<i64>,
    #[sqlx(default)]
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Plain person row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct PersonRow {
    pub id: i32,
    pub name: String,
    pub alt_name: Option<String>,
    pub fullname: Option<String>,
    pub other_names: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_src: Option<String>,
    pub image_attr: Option<String>,
    pub dob: Option<i32>,
    pub dod: Option<i32>,
    pub bio: Option<String>,
    pub bio_src: Option<String>,
    pub nationality_id: Option<i32>,
    pub imported_string: Option<String>,
}

/// Full person schema. When the requested id is an alias with exactly one
/// real person, the real person is returned with the alias's works, edits
/// and translations merged in.
#[derive(Debug, Clone, Serialize)]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub alt_name: Option<String>,
    pub fullname: Option<String>,
    pub other_names: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_src: Option<String>,
    pub image_attr: Option<String>,
    pub dob: Option<i32>,
    pub dod: Option<i32>,
    pub bio: Option<String>,
    pub bio_src: Option<String>,
    pub nationality: Option<IdName>,
    pub links: Vec<Link>,
    pub roles: Vec<String>,
    pub works: Vec<WorkBrief>,
    pub edits: Vec<EditionBrief>,
    pub translations: Vec<EditionBrief>,
    pub stories: Vec<ShortBrief>,
    pub aliases: Vec<IdName>,
    pub real_names: Vec<IdName>,
    pub personal_tags: Vec<IdName>,
}
