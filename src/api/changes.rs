//! Change log listing and administration.

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use std::collections::BTreeMap;

use crate::error::{ApiError, ApiResult};
use crate::repository::logs::ChangesQuery;
use crate::services::audit::parse_id;
use crate::AppState;

use super::{ok, AdminUser};

fn int_param(query: &BTreeMap<String, String>, key: &str) -> ApiResult<Option<i32>> {
    match query.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Virheellinen parametri {key}."))),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> ApiResult<Response> {
    let changes_query = ChangesQuery {
        period: int_param(&query, "period")?,
        table: query.get("table").cloned(),
        table_id: int_param(&query, "id")?,
        action: query.get("action").cloned(),
        field: query.get("field").cloned(),
        user_id: int_param(&query, "userid")?,
        limit: int_param(&query, "limit")?.map(i64::from),
    };
    Ok(ok(state.services.repo.logs.changes(&changes_query).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    if !state.services.repo.logs.delete(id).await? {
        return Err(ApiError::NotFound("Ei löytynyt.".to_string()));
    }
    Ok(ok("OK"))
}
