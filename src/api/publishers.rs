//! Publisher, book series and publication series endpoints.

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

pub async fn list(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.publishers.list().await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let publisher = state
        .services
        .repo
        .publishers
        .get(id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Kustantajaa ei löydy.".to_string()))?;
    Ok(ok(publisher))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    let id = state
        .services
        .publishers
        .create_publisher(claims.user_id(), data)
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
        .publishers
        .update_publisher(claims.user_id(), data)
        .await?;
    Ok(ok("OK"))
}

pub async fn delete(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    state
        .services
        .publishers
        .delete_publisher(claims.user_id(), id)
        .await?;
    Ok(ok("OK"))
}

pub async fn list_bookseries(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.publishers.list_bookseries().await?))
}

pub async fn get_bookseries(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let series = state
        .services
        .repo
        .publishers
        .get_bookseries(id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Kirjasarjaa ei löydy.".to_string()))?;
    Ok(ok(series))
}

pub async fn create_bookseries(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    let id = state
        .services
        .publishers
        .create_bookseries(claims.user_id(), data)
        .await?;
    Ok(created(id.to_string()))
}

pub async fn update_bookseries(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    state
        .services
        .publishers
        .update_bookseries(claims.user_id(), data)
        .await?;
    Ok(ok("OK"))
}

pub async fn delete_bookseries(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    state
        .services
        .publishers
        .delete_bookseries(claims.user_id(), id)
        .await?;
    Ok(ok("OK"))
}

pub async fn list_pubseries(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.publishers.list_pubseries().await?))
}

pub async fn get_pubseries(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let series = state
        .services
        .repo
        .publishers
        .get_pubseries(id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Sarjaa ei löydy.".to_string()))?;
    Ok(ok(series))
}

pub async fn create_pubseries(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    let id = state
        .services
        .publishers
        .create_pubseries(claims.user_id(), data)
        .await?;
    Ok(created(id.to_string()))
}

pub async fn update_pubseries(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let data = data_of(&body)?;
    state
        .services
        .publishers
        .update_pubseries(claims.user_id(), data)
        .await?;
    Ok(ok("OK"))
}

pub async fn delete_pubseries(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    state
        .services
        .publishers
        .delete_pubseries(claims.user_id(), id)
        .await?;
    Ok(ok("OK"))
}
