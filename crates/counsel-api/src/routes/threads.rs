use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use counsel_types::{Domain, NewThread, Thread, ThreadFilters, ThreadPatch, ThreadStats};

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadRequest {
    pub title: String,
    #[serde(default)]
    pub domain: Option<Domain>,
    #[serde(default)]
    pub pinned: bool,
}

pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateThreadRequest>,
) -> ApiResult<(StatusCode, Json<Thread>)> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }

    let thread = state
        .threads
        .create(NewThread {
            title: req.title,
            user_id: user.user_id,
            domain: req.domain,
            pinned: req.pinned,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(thread)))
}

pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(filters): Query<ThreadFilters>,
) -> ApiResult<Json<Vec<Thread>>> {
    let threads = state.threads.list(&user.user_id, filters).await?;
    Ok(Json(threads))
}

pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Thread>> {
    let thread = state
        .threads
        .get(&thread_id, &user.user_id)
        .await?
        .ok_or(ApiError::NotFound(thread_id))?;
    Ok(Json(thread))
}

pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(thread_id): Path<String>,
    Json(patch): Json<ThreadPatch>,
) -> ApiResult<Json<Thread>> {
    let thread = state
        .threads
        .update(&thread_id, &user.user_id, patch)
        .await?;
    Ok(Json(thread))
}

pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(thread_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.threads.delete(&thread_id, &user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Thread>> {
    let thread = state.threads.toggle_pin(&thread_id, &user.user_id).await?;
    Ok(Json(thread))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 {
    20
}

pub async fn search_threads(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Thread>>> {
    let limit = query.limit.min(100);
    let threads = state.threads.search(&user.user_id, &query.q, limit).await?;
    Ok(Json(threads))
}

pub async fn thread_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ThreadStats>> {
    let stats = state.threads.stats(&user.user_id).await?;
    Ok(Json(stats))
}

pub async fn clear_all_threads(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = state.threads.clear_all(&user.user_id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
