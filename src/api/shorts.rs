//! Short story endpoints.

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::services::audit::parse_id;
use crate::AppState;

use super::{created, data_of, ok, AdminUser};

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let short = state
        .services
        .repo
        .shorts
        .get(id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Novellia ei löydy.".to_string()))?;
    Ok(ok(short))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    let id = state.services.shorts.create(claims.user_id(), data).await?;
    Ok(created(id.to_string()))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    state.services.shorts.update(claims.user_id(), data).await?;
    Ok(ok("OK"))
}

pub async fn delete(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    state.services.shorts.delete(claims.user_id(), id).await?;
    Ok(ok("OK"))
}

pub async fn add_tag(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let tag_id = parse_id(&tag_id)?;
    state.services.shorts.add_tag(id, tag_id).await?;
    Ok(ok("OK"))
}

pub async fn remove_tag(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let tag_id = parse_id(&tag_id)?;
    state.services.shorts.remove_tag(id, tag_id).await?;
    Ok(ok("OK"))
}

pub async fn awarded(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.awards.for_story(id).await?))
}

pub async fn changes(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state
        .services
        .repo
        .logs
        .entity_changes("shortstory", id)
        .await?))
}

pub async fn latest(
    State(state): State<AppState>,
    Path(count): Path<String>,
) -> ApiResult<Response> {
    let count = parse_id(&count)?;
    Ok(ok(state.services.repo.shorts.latest(count as i64).await?))
}
