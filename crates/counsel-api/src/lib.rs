pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::handlers::generate;
use crate::middleware::{logging, require_auth};
use crate::routes::{auth, health, items, threads};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Everything behind the bearer check; webhook and health stay open.
    let protected = Router::new()
        // Threads
        .route("/api/threads", post(threads::create_thread))
        .route("/api/threads", get(threads::list_threads))
        .route("/api/threads/search", get(threads::search_threads))
        .route("/api/threads/stats", get(threads::thread_stats))
        .route("/api/threads/clear", delete(threads::clear_all_threads))
        .route("/api/threads/:thread_id", get(threads::get_thread))
        .route("/api/threads/:thread_id", patch(threads::update_thread))
        .route("/api/threads/:thread_id", delete(threads::delete_thread))
        .route("/api/threads/:thread_id/pin", post(threads::toggle_pin))
        // Thread items
        .route("/api/threads/:thread_id/items", post(items::create_item))
        .route("/api/threads/:thread_id/items", get(items::list_items))
        .route("/api/threads/:thread_id/items/:item_id", get(items::get_item))
        .route(
            "/api/threads/:thread_id/items/:item_id",
            patch(items::update_item),
        )
        .route(
            "/api/threads/:thread_id/items/:item_id",
            delete(items::delete_item),
        )
        .route(
            "/api/threads/:thread_id/items/:item_id/followups",
            delete(items::delete_followups),
        )
        // Generation
        .route(
            "/api/threads/:thread_id/items/:item_id/generate",
            post(generate::generate),
        )
        // Identity
        .route("/api/auth/sync-user", post(auth::sync_user))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/webhooks/identity", post(auth::identity_webhook))
        .merge(protected)
        .layer(axum::middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(300)))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PATCH,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            let parsed_origins: Vec<axum::http::HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        CorsLayer::permissive()
    }
}

pub fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
