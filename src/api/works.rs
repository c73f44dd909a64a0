//! Work endpoints.

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::services::audit::{check_int, parse_id, rel_id_list, IntOpts};
use crate::AppState;

use super::{created, data_of, ok, AdminUser};

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let work = state
        .services
        .repo
        .works
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Teosta ei löydy.".to_string()))?;
    Ok(ok(work))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    let id = state.services.works.create(claims.user_id(), data).await?;
    Ok(created(id.to_string()))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    state.services.works.update(claims.user_id(), data).await?;
    Ok(ok("OK"))
}

pub async fn delete(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    state.services.works.delete(claims.user_id(), id).await?;
    Ok(ok("OK"))
}

/// Contained shorts in reading order.
pub async fn shorts(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.works.contained_shorts(id).await?))
}

/// Replace-and-reorder the contained-shorts list.
pub async fn save_shorts(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let work_id = check_int(body.get("work_id"), IntOpts::positive())
        .ok_or_else(|| ApiError::BadRequest("Virheellinen teoksen tunniste.".to_string()))?;
    let shorts = rel_id_list(body.get("shorts"))
        .ok_or_else(|| ApiError::BadRequest("Novellilista puuttuu.".to_string()))?;
    state.services.works.save_shorts(work_id, &shorts).await?;
    Ok(ok("OK"))
}

pub async fn add_tag(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let tag_id = parse_id(&tag_id)?;
    state.services.works.add_tag(id, tag_id).await?;
    Ok(ok("OK"))
}

pub async fn remove_tag(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let tag_id = parse_id(&tag_id)?;
    state.services.works.remove_tag(id, tag_id).await?;
    Ok(ok("OK"))
}

pub async fn awards(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.awards.for_work(id).await?))
}

pub async fn changes(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.logs.entity_changes("work", id).await?))
}

pub async fn latest(
    State(state): State<AppState>,
    Path(count): Path<String>,
) -> ApiResult<Response> {
    let count = parse_id(&count)?;
    Ok(ok(state.services.repo.works.latest(count as i64).await?))
}

pub async fn by_initial(
    State(state): State<AppState>,
    Path(letter): Path<String>,
) -> ApiResult<Response> {
    Ok(ok(state.services.repo.works.by_initial(&letter).await?))
}
