//! Reference data, quick filters, the front page payload and the
//! author initial vector.

use axum::{
    extract::{Path, State},
    response::Response,
};
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::ok;

/// Minimum pattern length for quick filters. People get a longer
/// minimum because two letters match most of the corpus.
const FILTER_MIN: usize = 2;
const FILTER_MIN_PEOPLE: usize = 3;

fn filter_pattern(pattern: &str, min: usize) -> ApiResult<&str> {
    let trimmed = pattern.trim();
    if trimmed.chars().count() < min {
        return Err(ApiError::BadRequest("Liian lyhyt hakuehto".to_string()));
    }
    Ok(trimmed)
}

pub async fn genres(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.genres().await?))
}

pub async fn countries(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.countries().await?))
}

pub async fn languages(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.languages().await?))
}

pub async fn roles(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.roles().await?))
}

pub async fn roles_for_target(
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.roles_for_target(&target).await?))
}

pub async fn work_types(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.work_types().await?))
}

pub async fn story_types(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.story_types().await?))
}

pub async fn bindings(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.bindings().await?))
}

pub async fn formats(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.formats().await?))
}

pub async fn publication_sizes(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.publication_sizes().await?))
}

pub async fn magazine_types(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(ok(state.services.repo.refs.magazine_types().await?))
}

pub async fn filter_people(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> ApiResult<Response> {
    let pattern = filter_pattern(&pattern, FILTER_MIN_PEOPLE)?;
    Ok(ok(state.services.repo.people.filter(pattern).await?))
}

pub async fn filter_works(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> ApiResult<Response> {
    let pattern = filter_pattern(&pattern, FILTER_MIN)?;
    Ok(ok(state.services.repo.works.filter(pattern).await?))
}

pub async fn filter_publishers(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> ApiResult<Response> {
    let pattern = filter_pattern(&pattern, FILTER_MIN)?;
    Ok(ok(state.services.repo.publishers.filter(pattern).await?))
}

pub async fn filter_bookseries(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> ApiResult<Response> {
    let pattern = filter_pattern(&pattern, FILTER_MIN)?;
    Ok(ok(state
        .services
        .repo
        .publishers
        .filter_bookseries(pattern)
        .await?))
}

pub async fn filter_pubseries(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> ApiResult<Response> {
    let pattern = filter_pattern(&pattern, FILTER_MIN)?;
    Ok(ok(state
        .services
        .repo
        .publishers
        .filter_pubseries(pattern)
        .await?))
}

pub async fn filter_tags(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> ApiResult<Response> {
    let pattern = filter_pattern(&pattern, FILTER_MIN)?;
    Ok(ok(state.services.repo.tags.filter(pattern).await?))
}

pub async fn filter_countries(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> ApiResult<Response> {
    let pattern = filter_pattern(&pattern, FILTER_MIN)?;
    Ok(ok(state.services.repo.refs.filter_countries(pattern).await?))
}

pub async fn filter_languages(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> ApiResult<Response> {
    let pattern = filter_pattern(&pattern, FILTER_MIN)?;
    Ok(ok(state.services.repo.refs.filter_languages(pattern).await?))
}

/// Summary counts plus the four latest editions, one per work.
pub async fn frontpage(State(state): State<AppState>) -> ApiResult<Response> {
    let counts = state.services.repo.frontpage_counts().await?;
    let latest = state.services.repo.editions.latest_per_work(4).await?;
    Ok(ok(json!({
        "works": counts.works,
        "editions": counts.editions,
        "shorts": counts.shorts,
        "magazines": counts.magazines,
        "covers": counts.covers,
        "latest": latest,
    })))
}

/// Letter histogram over author strings, used for initial-based
/// browsing. Only works are supported.
pub async fn first_letters(
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> ApiResult<Response> {
    if target != "works" {
        return Err(ApiError::BadRequest(format!(
            "Virheellinen kohde {target}."
        )));
    }
    Ok(ok(state.services.repo.works.first_letters().await?))
}
