//! Person endpoints, including the filtered listing.

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::{ApiError, ApiResult};
use crate::services::audit::parse_id;
use crate::services::filters::{build_people_query, parse_list_params};
use crate::AppState;

use super::{created, data_of, ok, AdminUser};

/// Filtered, sorted, paged listing. The response carries the page and
/// the pre-pagination row count.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> ApiResult<Response> {
    let params = parse_list_params(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    let people_query = build_people_query(&params)?;
    let (people, total) = state.services.repo.people.list(&people_query).await?;
    Ok(ok(json!({ "people": people, "totalRecords": total })))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let person = state
        .services
        .repo
        .people
        .get(id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Henkilöä ei löydy.".to_string()))?;
    Ok(ok(person))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    let id = state.services.people.create(claims.user_id(), data).await?;
    Ok(created(id.to_string()))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    state.services.people.update(claims.user_id(), data).await?;
    Ok(ok("OK"))
}

pub async fn delete(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    state.services.people.delete(claims.user_id(), id).await?;
    Ok(ok("OK"))
}

pub async fn add_tag(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let tag_id = parse_id(&tag_id)?;
    state.services.people.add_tag(id, tag_id).await?;
    Ok(ok("OK"))
}

pub async fn remove_tag(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let tag_id = parse_id(&tag_id)?;
    state.services.people.remove_tag(id, tag_id).await?;
    Ok(ok("OK"))
}

pub async fn awarded(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.awards.for_person(id).await?))
}

pub async fn shorts(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.people.shorts(id).await?))
}

pub async fn chief_editor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.people.chief_editor_issues(id).await?))
}

pub async fn changes(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state
        .services
        .repo
        .logs
        .entity_changes("person", id)
        .await?))
}

pub async fn latest(
    State(state): State<AppState>,
    Path(count): Path<String>,
) -> ApiResult<Response> {
    let count = parse_id(&count)?;
    Ok(ok(state.services.repo.people.latest(count as i64).await?))
}
