//! Edition model: one concrete printing of a work.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::contributor::Contribution;
use super::refs::IdName;
use super::short::ShortBrief;

/// Brief schema used by list results, front page and person pages.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EditionBrief {
    pub id: i32,
    pub title: String,
    pub pubyear: i32,
    pub editionnum: Option<i32>,
    pub version: Option<i32>,
    #[sqlx(default)]
    pub publisher_name: Option<String>,
    #[sqlx(default)]
    pub image_src: Option<String>,
    #[sqlx(default)]
    pub work_id: Option<i32>,
    #[sqlx(default)]
    pub author_str: Option<String>,
}

/// Plain edition row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct EditionRow {
    pub id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub pubyear: i32,
    pub publisher_id: Option<i32>,
    pub editionnum: Option<i32>,
    pub version: Option<i32>,
    pub isbn: Option<String>,
    pub printedin: Option<String>,
    pub pubseries_id: Option<i32>,
    pub pubseriesnum: Option<i32>,
    pub coll_info: Option<String>,
    pub pages: Option<i32>,
    pub binding_id: Option<i32>,
    pub format_id: Option<i32>,
    pub size: Option<i32>,
    pub dustcover: Option<i32>,
    pub coverimage: Option<i32>,
    pub misc: Option<String>,
    pub imported_string: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EditionImage {
    pub id: i32,
    pub edition_id: i32,
    pub image_src: String,
    pub image_attr: Option<String>,
}

/// Full edition schema. The role-specific person lists are derived from
/// the editioncontributor table at read time.
#[derive(Debug, Clone, Serialize)]
pub struct Edition {
    pub id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub pubyear: i32,
    pub publisher: Option<IdName>,
    pub editionnum: Option<i32>,
    pub version: Option<i32>,
    pub isbn: Option<String>,
    pub printedin: Option<String>,
    pub pubseries: Option<IdName>,
    pub pubseriesnum: Option<i32>,
    pub coll_info: Option<String>,
    pub pages: Option<i32>,
    pub binding: Option<IdName>,
    pub format: Option<IdName>,
    pub size: Option<i32>,
    /// 1 = unknown, 2 = yes, 3 = no.
    pub dustcover: Option<i32>,
    /// 1 = unknown, 2 = no, 3 = yes.
    pub coverimage: Option<i32>,
    pub misc: Option<String>,
    pub imported_string: Option<String>,
    pub verified: bool,
    pub work_id: Option<i32>,
    pub contributions: Vec<Contribution>,
    pub editors: Vec<IdName>,
    pub translators: Vec<IdName>,
    pub cover_artists: Vec<IdName>,
    pub illustrators: Vec<IdName>,
    pub chief_editors: Vec<IdName>,
    pub images: Vec<EditionImage>,
    /// Contained shorts in reading order.
    pub stories: Vec<ShortBrief>,
}

/// Ownership row for the user collection endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserBook {
    pub edition_id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub condition: Option<i32>,
    pub description: Option<String>,
}

/// Wishlist row; the edition wishlist endpoint returns these joined with
/// user names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WishlistEntry {
    pub edition_id: i32,
    pub user_id: i32,
    pub user_name: String,
}
