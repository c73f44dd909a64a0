//! Free-text search and the structured work/story search forms.

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde_json::Value;

use crate::error::ApiResult;
use crate::repository::shorts::ShortSearchParams;
use crate::repository::works::WorkSearchParams;
use crate::services::audit::{check_int, IntOpts};
use crate::services::search;
use crate::AppState;

use super::ok;

fn text_param(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn int_param(body: &Value, key: &str) -> Option<i32> {
    check_int(body.get(key), IntOpts::lenient())
}

pub async fn all(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> ApiResult<Response> {
    let results = search::search_all(&state.services.repo.pool, pattern.trim()).await?;
    Ok(ok(results))
}

pub async fn works(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let params = WorkSearchParams {
        author: text_param(&body, "author"),
        title: text_param(&body, "title"),
        orig_title: text_param(&body, "orig_name"),
        printyear_first: int_param(&body, "printyear_first"),
        printyear_last: int_param(&body, "printyear_last"),
        genre: int_param(&body, "genre"),
        nationality: int_param(&body, "nationality"),
        work_type: int_param(&body, "type"),
    };
    Ok(ok(state.services.repo.works.search(&params).await?))
}

pub async fn shorts(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let params = ShortSearchParams {
        author: text_param(&body, "author"),
        title: text_param(&body, "title"),
        orig_title: text_param(&body, "orig_name"),
        pubyear_first: int_param(&body, "pubyear_first"),
        pubyear_last: int_param(&body, "pubyear_last"),
        story_type: int_param(&body, "type"),
    };
    Ok(ok(state.services.repo.shorts.search(&params).await?))
}
