use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use pricegate_core::Engine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// All routes, with request tracing and fully open CORS.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/price/:symbol", get(routes::price))
        .route("/futures/:symbol", get(routes::futures))
        .route("/index/:symbol", get(routes::index))
        .route("/crypto/:symbol", get(routes::crypto))
        .route("/history/:symbol", get(routes::history))
        .route("/proxy", get(routes::proxy).post(routes::proxy))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
