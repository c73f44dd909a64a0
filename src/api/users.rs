//! User listing and lookup.

use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::error::ApiResult;
use crate::services::audit::parse_id;
use crate::AppState;

use super::ok;

pub async fn list(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.users.list().await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.users.get(id).await?))
}
