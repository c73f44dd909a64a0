//! Login, registration and token refresh.

use axum::{extract::State, response::Response, Json};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::{ok, AuthenticatedUser};

fn credentials(body: &Value) -> ApiResult<(&str, &str)> {
    let username = body
        .get("username")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("Käyttäjätunnus puuttuu.".to_string()))?;
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("Salasana puuttuu.".to_string()))?;
    Ok((username, password))
}

pub async fn login(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<Response> {
    let (username, password) = credentials(&body)?;
    let response = state.services.users.login(username, password).await?;
    Ok(ok(response))
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let (username, password) = credentials(&body)?;
    let response = state.services.users.register(username, password).await?;
    Ok(ok(response))
}

pub async fn refresh(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let username = body
        .get("username")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("Käyttäjätunnus puuttuu.".to_string()))?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| ApiError::Unauthorized("Virheellinen kirjautuminen.".to_string()))?;
    let response = state.services.users.refresh(user_id, username).await?;
    Ok(ok(response))
}
