//! Aggregate statistics endpoints.

use axum::{
    extract::{Query, State},
    response::Response,
};
use std::collections::BTreeMap;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::ok;

fn count_param(query: &BTreeMap<String, String>) -> ApiResult<Option<usize>> {
    match query.get("count") {
        None => Ok(None),
        Some(raw) => raw
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Virheellinen määrä {raw}."))),
    }
}

pub async fn genre_counts(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.stats.genre_counts().await?))
}

pub async fn author_counts(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> ApiResult<Response> {
    let count = count_param(&query)?;
    let genre = query.get("genre").map(String::as_str);
    Ok(ok(state.services.stats.author_counts(count, genre).await?))
}

pub async fn story_person_counts(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> ApiResult<Response> {
    let count = count_param(&query)?;
    Ok(ok(state.services.stats.story_person_counts(count).await?))
}

pub async fn publisher_counts(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> ApiResult<Response> {
    let count = count_param(&query)?;
    Ok(ok(state.services.stats.publisher_counts(count).await?))
}

pub async fn works_by_year(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.stats.works_by_year().await?))
}

pub async fn orig_works_by_year(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.stats.orig_works_by_year().await?))
}

pub async fn stories_by_year(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.stats.stories_by_year().await?))
}

pub async fn issues_per_year(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.stats.issues_per_year().await?))
}

pub async fn nationality_counts(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.stats.nationality_counts().await?))
}

pub async fn story_nationality_counts(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.stats.story_nationality_counts().await?))
}

pub async fn misc(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.stats.misc().await?))
}
