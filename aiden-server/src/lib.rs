//! HTTP surface of the Aiden backend: configuration, wiring, handlers and
//! routes. The binary in `main.rs` adds the CLI and the runtime.

pub mod handlers;
pub mod infra;
pub mod middleware;
pub mod routes;

use axum::{Router, http::HeaderValue};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub use infra::app_state::AppState;
pub use infra::config::Config;
pub use infra::startup::{ServiceDeps, build_app_state};

pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config()
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };
    let cors_layer = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::create_api_router(state.clone())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
}
