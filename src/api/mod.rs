//! HTTP handlers: path/query coercion, auth preconditions and the
//! response envelope. Business rules live in the services.

pub mod auth;
pub mod awards;
pub mod changes;
pub mod editions;
pub mod magazines;
pub mod misc;
pub mod people;
pub mod publishers;
pub mod search;
pub mod shorts;
pub mod stats;
pub mod tags;
pub mod users;
pub mod works;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::user::UserClaims;
use crate::AppState;

/// Success envelope: `{"response": <payload>, "status": <code>}`.
#[derive(Serialize)]
struct Envelope<T: Serialize> {
    response: T,
    status: u16,
}

pub fn ok<T: Serialize>(payload: T) -> Response {
    (
        StatusCode::OK,
        Json(Envelope {
            response: payload,
            status: 200,
        }),
    )
        .into_response()
}

pub fn created<T: Serialize>(payload: T) -> Response {
    (
        StatusCode::CREATED,
        Json(Envelope {
            response: payload,
            status: 201,
        }),
    )
        .into_response()
}

/// Pull the `data` object out of a mutation body.
pub fn data_of(body: &Value) -> ApiResult<&Value> {
    body.get("data")
        .filter(|d| d.is_object())
        .ok_or_else(|| ApiError::BadRequest("Virheellinen pyyntö.".to_string()))
}

fn claims_from_parts(parts: &Parts, state: &AppState) -> ApiResult<UserClaims> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Kirjautuminen puuttuu.".to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Virheellinen kirjautuminen.".to_string()))?;
    UserClaims::from_token(token, &state.config.auth.jwt_secret)
        .map_err(|_| ApiError::Unauthorized("Virheellinen kirjautuminen.".to_string()))
}

/// Extractor for any authenticated user.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        Ok(AuthenticatedUser(claims_from_parts(parts, state)?))
    }
}

/// Extractor for administrator routes.
pub struct AdminUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let claims = claims_from_parts(parts, state)?;
        if !claims.is_admin {
            return Err(ApiError::Forbidden(
                "Ei käyttöoikeutta.".to_string(),
            ));
        }
        Ok(AdminUser(claims))
    }
}
