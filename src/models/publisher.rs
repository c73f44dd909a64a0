//! Publisher, publication series and book series models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::edition::EditionBrief;
use super::refs::IdName;
use super::work::WorkBrief;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublisherBrief {
    pub id: i32,
    pub name: String,
    pub fullname: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Publisher {
    pub id: i32,
    pub name: String,
    pub fullname: Option<String>,
    pub description: Option<String>,
    pub image_src: Option<String>,
    pub image_attr: Option<String>,
    pub editions: Vec<EditionBrief>,
    pub series: Vec<IdName>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PubseriesBrief {
    pub id: i32,
    pub name: String,
    pub important: bool,
    #[sqlx(default)]
    pub publisher_name: Option<String>,
}

/// Publisher imprint. Belongs to exactly one publisher.
#[derive(Debug, Clone, Serialize)]
pub struct Pubseries {
    pub id: i32,
    pub name: String,
    pub important: bool,
    pub image_src: Option<String>,
    pub image_attr: Option<String>,
    pub publisher: Option<IdName>,
    pub editions: Vec<EditionBrief>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookseriesBrief {
    pub id: i32,
    pub name: String,
    pub orig_name: Option<String>,
    pub important: bool,
}

/// Cross-publisher thematic grouping of works.
#[derive(Debug, Clone, Serialize)]
pub struct Bookseries {
    pub id: i32,
    pub name: String,
    pub orig_name: Option<String>,
    pub important: bool,
    pub image_src: Option<String>,
    pub image_attr: Option<String>,
    pub works: Vec<WorkBrief>,
}
