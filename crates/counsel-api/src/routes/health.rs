use axum::Json;
use serde_json::json;

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "counsel-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
