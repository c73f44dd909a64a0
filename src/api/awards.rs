//! Award endpoints.

use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::error::{ApiError, ApiResult};
use crate::services::audit::parse_id;
use crate::AppState;

use super::ok;

pub async fn list(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.awards.list().await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let award = state
        .services
        .repo
        .awards
        .get(id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Palkintoa ei löydy.".to_string()))?;
    Ok(ok(award))
}

pub async fn winners(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    Ok(ok(state.services.repo.awards.winners(id).await?))
}

pub async fn person_categories(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.awards.person_categories().await?))
}

pub async fn work_categories(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.awards.work_categories().await?))
}

pub async fn story_categories(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.awards.story_categories().await?))
}
