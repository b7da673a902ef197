use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use counsel_identity::{LifecycleEvent, LifecycleKind};
use counsel_types::UserRecord;

use crate::{error::ApiResult, middleware::AuthUser, state::AppState};

/// Mirrors the authenticated user into the local user collection.
pub async fn sync_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    let profile = state.identity.fetch_profile(&user.user_id).await?;

    let existing = state.users.get(&user.user_id).await?;
    let record = UserRecord {
        id: user.user_id.clone(),
        email: profile
            .as_ref()
            .map(|p| p.email.clone())
            .or_else(|| existing.as_ref().map(|u| u.email.clone()))
            .unwrap_or_default(),
        name: profile
            .as_ref()
            .and_then(|p| p.name.clone())
            .or_else(|| existing.as_ref().and_then(|u| u.name.clone())),
        role: existing
            .as_ref()
            .map(|u| u.role.clone())
            .unwrap_or_else(|| "USER".to_string()),
        created_at: existing.map(|u| u.created_at).unwrap_or_else(Utc::now),
    };
    let synced = state.users.upsert(record).await?;

    Ok(Json(json!({ "userId": synced.id })))
}

/// Identity provider lifecycle webhook: keeps the user mirror in step
/// with creations, profile updates, and deletions.
pub async fn identity_webhook(
    State(state): State<Arc<AppState>>,
    Json(event): Json<LifecycleEvent>,
) -> ApiResult<Json<serde_json::Value>> {
    match event.kind {
        LifecycleKind::UserCreated | LifecycleKind::UserUpdated => {
            let existing = state.users.get(&event.data.id).await?;
            let record = UserRecord {
                id: event.data.id.clone(),
                email: event
                    .primary_email()
                    .map(str::to_string)
                    .or_else(|| existing.as_ref().map(|u| u.email.clone()))
                    .unwrap_or_default(),
                name: event.full_name().or_else(|| {
                    existing.as_ref().and_then(|u| u.name.clone())
                }),
                role: existing
                    .as_ref()
                    .map(|u| u.role.clone())
                    .unwrap_or_else(|| "USER".to_string()),
                created_at: existing.map(|u| u.created_at).unwrap_or_else(Utc::now),
            };
            state.users.upsert(record).await?;
        }
        LifecycleKind::UserDeleted => {
            state.users.delete(&event.data.id).await?;
        }
    }
    Ok(Json(json!({ "received": true })))
}
