//! Tag endpoints.

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::services::audit::{self, parse_id, rel_id, IntOpts};
use crate::AppState;

use super::{created, data_of, ok, AdminUser};

pub async fn list(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.tags.list().await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let tag = state
        .services
        .repo
        .tags
        .get(id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Asiasanaa ei löydy.".to_string()))?;
    Ok(ok(tag))
}

pub async fn types(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.tag_types().await?))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    let name = data
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Nimi puuttuu.".to_string()))?;
    let id = state.services.repo.tags.create(name).await?;
    Ok(created(id.to_string()))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    let id = audit::require_int(
        data.get("id"),
        IntOpts::positive(),
        "Virheellinen tunniste.",
    )?;
    let name = data
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Nimi puuttuu.".to_string()))?;
    let type_id = rel_id(data.get("type"));
    let description = data.get("description").and_then(Value::as_str);
    state
        .services
        .repo
        .tags
        .update(id, name, type_id, description)
        .await?;
    Ok(ok("OK"))
}

pub async fn merge(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((source, target)): Path<(String, String)>,
) -> ApiResult<Response> {
    let source = parse_id(&source)?;
    let target = parse_id(&target)?;
    state.services.repo.tags.merge(target, source).await?;
    Ok(ok("OK"))
}

pub async fn delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    state.services.repo.tags.delete(id).await?;
    Ok(ok("OK"))
}
