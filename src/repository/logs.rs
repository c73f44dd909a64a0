//! Change-log persistence. Log rows are written through the caller's
//! transaction so a rolled-back mutation takes its log rows with it.

use once_cell::sync::Lazy;
use sqlx::{PgConnection, Pool, Postgres};
use std::collections::HashMap;

use crate::error::ApiResult;
use crate::models::log::LogEntry;
use crate::services::audit::OldValues;

pub const ACTION_CREATE: &str = "Uusi";
pub const ACTION_UPDATE: &str = "Päivitys";
pub const ACTION_DELETE: &str = "Poisto";

/// Localized table labels used in log rows and shown to users as-is.
static TABLE_LOCALS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("article", "Artikkeli"),
        ("bookseries", "Kirjasarja"),
        ("edition", "Painos"),
        ("issue", "Irtonumero"),
        ("magazine", "Lehti"),
        ("person", "Henkilö"),
        ("publisher", "Kustantaja"),
        ("pubseries", "Kustantajan sarja"),
        ("shortstory", "Novelli"),
        ("work", "Teos"),
    ])
});

pub fn table_local(table: &str) -> &str {
    TABLE_LOCALS.get(table).copied().unwrap_or(table)
}

/// Stored old values are capped; longer values are cut, not rejected.
const OLD_VALUE_MAX: usize = 499;

fn truncate_old_value(value: &str) -> String {
    value.chars().take(OLD_VALUE_MAX).collect()
}

async fn insert_row(
    conn: &mut PgConnection,
    table: &str,
    field_name: Option<&str>,
    table_id: i32,
    object_name: Option<&str>,
    action: &str,
    user_id: i32,
    old_value: Option<&str>,
) -> ApiResult<()> {
    sqlx::query(
        "INSERT INTO log (table_name, field_name, table_id, object_name, action, \
                          user_id, old_value) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(table_local(table))
    .bind(field_name)
    .bind(table_id)
    .bind(object_name)
    .bind(action)
    .bind(user_id)
    .bind(old_value.map(truncate_old_value))
    .execute(conn)
    .await?;
    Ok(())
}

/// One "Uusi" row for a created entity. Without an authenticated user the
/// emission is skipped and the mutation proceeds (system-originated
/// writes are not logged).
pub async fn log_create(
    conn: &mut PgConnection,
    table: &str,
    table_id: i32,
    object_name: &str,
    user_id: Option<i32>,
) -> ApiResult<()> {
    let Some(user_id) = user_id else {
        return Ok(());
    };
    insert_row(
        conn,
        table,
        None,
        table_id,
        Some(object_name),
        ACTION_CREATE,
        user_id,
        None,
    )
    .await
}

/// One "Päivitys" row per changed field.
pub async fn log_update(
    conn: &mut PgConnection,
    table: &str,
    table_id: i32,
    object_name: &str,
    user_id: Option<i32>,
    old_values: &OldValues,
) -> ApiResult<()> {
    let Some(user_id) = user_id else {
        return Ok(());
    };
    for (field, old_value) in &old_values.0 {
        insert_row(
            conn,
            table,
            Some(field),
            table_id,
            Some(object_name),
            ACTION_UPDATE,
            user_id,
            old_value.as_deref(),
        )
        .await?;
    }
    Ok(())
}

/// One "Poisto" row; old values carry what was deleted.
pub async fn log_delete(
    conn: &mut PgConnection,
    table: &str,
    table_id: i32,
    object_name: &str,
    user_id: Option<i32>,
    old_values: &OldValues,
) -> ApiResult<()> {
    let Some(user_id) = user_id else {
        return Ok(());
    };
    if old_values.is_empty() {
        return insert_row(
            conn,
            table,
            None,
            table_id,
            Some(object_name),
            ACTION_DELETE,
            user_id,
            None,
        )
        .await;
    }
    for (field, old_value) in &old_values.0 {
        insert_row(
            conn,
            table,
            Some(field),
            table_id,
            Some(object_name),
            ACTION_DELETE,
            user_id,
            old_value.as_deref(),
        )
        .await?;
    }
    Ok(())
}

/// Query parameters for the change listing.
#[derive(Debug, Default, Clone)]
pub struct ChangesQuery {
    /// Look-back window in days; defaults to 30.
    pub period: Option<i32>,
    pub table: Option<String>,
    pub table_id: Option<i32>,
    pub action: Option<String>,
    pub field: Option<String>,
    pub user_id: Option<i32>,
    pub limit: Option<i64>,
}

#[derive(Clone)]
pub struct LogsRepository {
    pool: Pool<Postgres>,
}

impl LogsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn changes(&self, query: &ChangesQuery) -> ApiResult<Vec<LogEntry>> {
        let mut sql = String::from(
            "SELECT id, table_name, field_name, table_id, object_name, action, \
                    user_id, old_value, date \
             FROM log WHERE date >= now() - ($1 || ' days')::interval",
        );
        let period = query.period.unwrap_or(30);
        let mut bind_pos = 1;
        let mut push = |sql: &mut String, fragment: &str| {
            bind_pos += 1;
            sql.push_str(&format!(" AND {fragment} = ${bind_pos}"));
        };
        if query.table.is_some() {
            push(&mut sql, "table_name");
        }
        if query.table_id.is_some() {
            push(&mut sql, "table_id");
        }
        if query.action.is_some() {
            push(&mut sql, "action");
        }
        if query.field.is_some() {
            push(&mut sql, "field_name");
        }
        if query.user_id.is_some() {
            push(&mut sql, "user_id");
        }
        sql.push_str(" ORDER BY date DESC");
        bind_pos += 1;
        sql.push_str(&format!(" LIMIT ${bind_pos}"));

        let mut q = sqlx::query_as::<_, LogEntry>(&sql).bind(period.to_string());
        if let Some(table) = &query.table {
            q = q.bind(table_local(table).to_string());
        }
        if let Some(id) = query.table_id {
            q = q.bind(id);
        }
        if let Some(action) = &query.action {
            q = q.bind(action.clone());
        }
        if let Some(field) = &query.field {
            q = q.bind(field.clone());
        }
        if let Some(user_id) = query.user_id {
            q = q.bind(user_id);
        }
        q = q.bind(query.limit.unwrap_or(200));

        Ok(q.fetch_all(&self.pool).await?)
    }

    /// All log rows for one entity, newest first.
    pub async fn entity_changes(&self, table: &str, table_id: i32) -> ApiResult<Vec<LogEntry>> {
        Ok(sqlx::query_as(
            "SELECT id, table_name, field_name, table_id, object_name, action, \
                    user_id, old_value, date \
             FROM log WHERE table_name = $1 AND table_id = $2 \
             ORDER BY date DESC",
        )
        .bind(table_local(table))
        .bind(table_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Admin-only removal of one log row.
    pub async fn delete(&self, id: i32) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM log WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tables_are_localized() {
        assert_eq!(table_local("work"), "Teos");
        assert_eq!(table_local("edition"), "Painos");
        assert_eq!(table_local("shortstory"), "Novelli");
        assert_eq!(table_local("person"), "Henkilö");
        assert_eq!(table_local("unknown"), "unknown");
    }

    #[test]
    fn old_values_are_truncated() {
        let long = "x".repeat(600);
        assert_eq!(truncate_old_value(&long).chars().count(), 499);
        assert_eq!(truncate_old_value("short"), "short");
    }
}
