use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use counsel_types::{ChatMode, ItemStatus, NewThreadItem, ThreadItem, ThreadItemPatch};

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    state::AppState,
};

/// Item routes resolve the thread through the owning user first, so a
/// foreign thread id reads as not-found rather than leaking existence.
async fn owned_thread(
    state: &AppState,
    thread_id: &str,
    user_id: &str,
) -> ApiResult<counsel_types::Thread> {
    state
        .threads
        .get(thread_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(thread_id.to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub query: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub mode: ChatMode,
    #[serde(default)]
    pub status: Option<ItemStatus>,
    #[serde(default)]
    pub image_attachment: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(thread_id): Path<String>,
    Json(req): Json<CreateItemRequest>,
) -> ApiResult<(StatusCode, Json<ThreadItem>)> {
    if req.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query is required".to_string()));
    }
    owned_thread(&state, &thread_id, &user.user_id).await?;

    let item = state
        .items
        .create(NewThreadItem {
            thread_id,
            query: req.query,
            parent_id: req.parent_id,
            mode: req.mode,
            status: req.status,
            error: None,
            image_attachment: req.image_attachment,
            tool_calls: None,
            tool_results: None,
            steps: None,
            answer: None,
            metadata: req.metadata,
            sources: vec![],
            suggestions: vec![],
            object: None,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Vec<ThreadItem>>> {
    owned_thread(&state, &thread_id, &user.user_id).await?;
    let items = state.items.list(&thread_id).await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((thread_id, item_id)): Path<(String, String)>,
) -> ApiResult<Json<ThreadItem>> {
    owned_thread(&state, &thread_id, &user.user_id).await?;
    let item = state
        .items
        .get(&item_id)
        .await?
        .filter(|item| item.thread_id == thread_id)
        .ok_or(ApiError::NotFound(item_id))?;
    Ok(Json(item))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((thread_id, item_id)): Path<(String, String)>,
    Json(patch): Json<ThreadItemPatch>,
) -> ApiResult<Json<ThreadItem>> {
    owned_thread(&state, &thread_id, &user.user_id).await?;
    let item = state.items.update(&item_id, patch).await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((thread_id, item_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    owned_thread(&state, &thread_id, &user.user_id).await?;
    state.items.delete(&item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_followups(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((thread_id, item_id)): Path<(String, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    owned_thread(&state, &thread_id, &user.user_id).await?;
    let deleted = state.items.delete_followups(&item_id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
