//! Change log row. Emitted inside the same transaction as the mutation it
//! describes; never updated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LogEntry {
    pub id: i32,
    /// Localized table label, e.g. "Teos" or "Painos".
    pub table_name: String,
    pub field_name: Option<String>,
    pub table_id: i32,
    pub object_name: Option<String>,
    /// "Uusi", "Päivitys" or "Poisto".
    pub action: String,
    pub user_id: Option<i32>,
    pub old_value: Option<String>,
    pub date: DateTime<Utc>,
}
