//! Magazine, issue and article endpoints.

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

pub async fn list(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.magazines.list().await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let magazine = state
        .services
        .repo
        .magazines
        .get(id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Lehteä ei löydy.".to_string()))?;
    Ok(ok(magazine))
}

/// Legacy editor endpoint, disabled.
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> ApiResult<Response> {
    state.services.magazines.update_magazine()?;
    Ok(ok("OK"))
}

pub async fn get_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let issue = state
        .services
        .repo
        .magazines
        .get_issue(id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Numeroa ei löydy.".to_string()))?;
    Ok(ok(issue))
}

pub async fn create_issue(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    let id = state
        .services
        .magazines
        .create_issue(claims.user_id(), data)
        .await?;
    Ok(created(id.to_string()))
}

pub async fn update_issue(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    state
        .services
        .magazines
        .update_issue(claims.user_id(), data)
        .await?;
    Ok(ok("OK"))
}

pub async fn delete_issue(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    state
        .services
        .magazines
        .delete_issue(claims.user_id(), id)
        .await?;
    Ok(ok("OK"))
}

pub async fn issue_shorts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.magazines.issue_shorts(id).await?))
}

pub async fn save_issue_shorts(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let issue_id = check_int(body.get("issue_id"), IntOpts::positive())
        .ok_or_else(|| ApiError::BadRequest("Virheellinen numeron tunniste.".to_string()))?;
    let shorts = rel_id_list(body.get("shorts"))
        .ok_or_else(|| ApiError::BadRequest("Novellilista puuttuu.".to_string()))?;
    state
        .services
        .magazines
        .save_issue_shorts(issue_id, &shorts)
        .await?;
    Ok(ok("OK"))
}

pub async fn issue_articles(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.magazines.issue_articles(id).await?))
}

pub async fn add_issue_tag(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let tag_id = parse_id(&tag_id)?;
    state.services.magazines.add_issue_tag(id, tag_id).await?;
    Ok(ok("OK"))
}

pub async fn remove_issue_tag(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let tag_id = parse_id(&tag_id)?;
    state.services.magazines.remove_issue_tag(id, tag_id).await?;
    Ok(ok("OK"))
}

pub async fn set_issue_image(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let filename = body
        .get("filename")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("Kuvan nimi puuttuu.".to_string()))?;
    state
        .services
        .magazines
        .set_issue_image(claims.user_id(), id, filename)
        .await?;
    Ok(ok("OK"))
}

pub async fn remove_issue_image(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    state
        .services
        .magazines
        .remove_issue_image(claims.user_id(), id)
        .await?;
    Ok(ok("OK"))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let article = state
        .services
        .repo
        .magazines
        .get_article(id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Artikkelia ei löydy.".to_string()))?;
    Ok(ok(article))
}

pub async fn add_article_tag(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let tag_id = parse_id(&tag_id)?;
    state.services.magazines.add_article_tag(id, tag_id).await?;
    Ok(ok("OK"))
}

pub async fn remove_article_tag(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let tag_id = parse_id(&tag_id)?;
    state
        .services
        .magazines
        .remove_article_tag(id, tag_id)
        .await?;
    Ok(ok("OK"))
}
