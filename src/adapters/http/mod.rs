pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::post, Router};
use tower_http::cors::CorsLayer;

use crate::adapters::http::state::HttpState;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/analyze", post(routes::analyze))
        .route("/predict", post(routes::predict))
        .route("/debug_detect", post(routes::debug_detect))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
        .layer(CorsLayer::permissive()) // abierto para el frontend en desarrollo
        .with_state(state)
}
