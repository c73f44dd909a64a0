//! Edition endpoints, including the user collection and wishlist.

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::services::audit::{check_int, parse_id, rel_id_list, require_int, IntOpts};
use crate::AppState;

use super::{created, data_of, ok, AdminUser, AuthenticatedUser};

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let edition = state
        .services
        .repo
        .editions
        .get(id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Painosta ei löydy.".to_string()))?;
    Ok(ok(edition))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    let id = state
        .services
        .editions
        .create(claims.user_id(), data)
        .await?;
    Ok(created(id.to_string()))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    state
        .services
        .editions
        .update(claims.user_id(), data)
        .await?;
    Ok(ok("OK"))
}

pub async fn delete(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    state.services.editions.delete(claims.user_id(), id).await?;
    Ok(ok("OK"))
}

/// Duplicate an edition as the next printing.
pub async fn copy(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let new_id = state.services.editions.copy(claims.user_id(), id).await?;
    Ok(created(new_id.to_string()))
}

pub async fn shorts(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.editions.shorts(id).await?))
}

pub async fn save_shorts(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let edition_id = check_int(body.get("edition_id"), IntOpts::positive())
        .ok_or_else(|| ApiError::BadRequest("Virheellinen painoksen tunniste.".to_string()))?;
    let shorts = rel_id_list(body.get("shorts"))
        .ok_or_else(|| ApiError::BadRequest("Novellilista puuttuu.".to_string()))?;
    state
        .services
        .editions
        .save_shorts(edition_id, &shorts)
        .await?;
    Ok(ok("OK"))
}

pub async fn changes(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state
        .services
        .repo
        .logs
        .entity_changes("edition", id)
        .await?))
}

pub async fn latest(
    State(state): State<AppState>,
    Path(count): Path<String>,
) -> ApiResult<Response> {
    let count = parse_id(&count)?;
    Ok(ok(state.services.repo.editions.latest(count as i64).await?))
}

pub async fn latest_covers(
    State(state): State<AppState>,
    Path(count): Path<String>,
) -> ApiResult<Response> {
    let count = parse_id(&count)?;
    Ok(ok(state
        .services
        .repo
        .editions
        .latest_covers(count as i64)
        .await?))
}

pub async fn add_image(
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
        .editions
        .add_image(claims.user_id(), id, filename)
        .await?;
    Ok(ok("OK"))
}

pub async fn remove_image(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path((id, image_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let image_id = parse_id(&image_id)?;
    state
        .services
        .editions
        .remove_image(claims.user_id(), id, image_id)
        .await?;
    Ok(ok("OK"))
}

pub async fn owners(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.editions.owners(id).await?))
}

pub async fn owned_by(
    State(state): State<AppState>,
    AuthenticatedUser(_): AuthenticatedUser,
    Path(user_id): Path<String>,
) -> ApiResult<Response> {
    let user_id = parse_id(&user_id)?;
    Ok(ok(state.services.repo.editions.owned_by(user_id).await?))
}

pub async fn owner_info(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let user_id = parse_id(&user_id)?;
    Ok(ok(state.services.repo.editions.owner(id, user_id).await?))
}

/// Add or update a user's copy of an edition. The edition and user come
/// from the body; a missing user means the caller.
pub async fn set_owner(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let id = require_int(
        body.get("edition_id"),
        IntOpts::positive(),
        "Virheellinen painos.",
    )?;
    let user_id = match check_int(body.get("user_id"), IntOpts::positive()) {
        Some(user_id) => user_id,
        None => claims
            .user_id()
            .ok_or_else(|| ApiError::Unauthorized("Virheellinen kirjautuminen.".to_string()))?,
    };
    let condition = check_int(body.get("condition"), IntOpts::allowed(&[1, 2, 3, 4]));
    let description = body
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    state
        .services
        .repo
        .editions
        .set_owner(id, user_id, condition, description.as_deref())
        .await?;
    Ok(ok("OK"))
}

pub async fn remove_owner(
    State(state): State<AppState>,
    AuthenticatedUser(_): AuthenticatedUser,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let user_id = parse_id(&user_id)?;
    state.services.repo.editions.remove_owner(id, user_id).await?;
    Ok(ok("OK"))
}

pub async fn user_wishlist(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Response> {
    let user_id = parse_id(&user_id)?;
    Ok(ok(state.services.repo.editions.wishlist_of(user_id).await?))
}

pub async fn wishlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.editions.wishlist(id).await?))
}

pub async fn wishlist_contains(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let user_id = parse_id(&user_id)?;
    Ok(ok(state
        .services
        .repo
        .editions
        .wishlist_contains(id, user_id)
        .await?))
}

pub async fn add_to_wishlist(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let user_id = parse_id(&user_id)?;
    if claims.user_id() != Some(user_id) && !claims.is_admin {
        return Err(ApiError::Forbidden("Ei käyttöoikeutta.".to_string()));
    }
    state
        .services
        .repo
        .editions
        .add_to_wishlist(id, user_id)
        .await?;
    Ok(ok("OK"))
}

pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let user_id = parse_id(&user_id)?;
    if claims.user_id() != Some(user_id) && !claims.is_admin {
        return Err(ApiError::Forbidden("Ei käyttöoikeutta.".to_string()));
    }
    state
        .services
        .repo
        .editions
        .remove_from_wishlist(id, user_id)
        .await?;
    Ok(ok("OK"))
}
