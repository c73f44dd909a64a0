//! Small reference entities: countries, languages, genres, roles and the
//! enumerated types (work type, story type, binding, format, ...).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Generic id + name pair used for all simple reference tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct IdName {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Genre {
    pub id: i32,
    pub name: String,
    pub abbr: String,
}

/// An external link attached to a work or person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Link {
    pub link: String,
    pub description: Option<String>,
}

/// Contributor role ids. Role 3 (editor) is legal both at work level
/// (editor of the work) and edition level (editor of the printing).
pub mod role {
    pub const AUTHOR: i32 = 1;
    pub const TRANSLATOR: i32 = 2;
    pub const EDITOR: i32 = 3;
    pub const COVER_ARTIST: i32 = 4;
    pub const ILLUSTRATOR: i32 = 5;
    pub const SUBJECT: i32 = 6;
    pub const EDITOR_IN_CHIEF: i32 = 7;

    /// Roles stored in workcontributor.
    pub const WORK_ROLES: [i32; 3] = [AUTHOR, EDITOR, SUBJECT];
    /// Roles stored in editioncontributor.
    pub const EDITION_ROLES: [i32; 5] = [
        TRANSLATOR,
        EDITOR,
        COVER_ARTIST,
        ILLUSTRATOR,
        EDITOR_IN_CHIEF,
    ];
    /// Roles valid for short stories.
    pub const SHORT_ROLES: [i32; 3] = [AUTHOR, TRANSLATOR, SUBJECT];
    /// Roles valid for magazine issues.
    pub const ISSUE_ROLES: [i32; 2] = [EDITOR_IN_CHIEF, COVER_ARTIST];
}
