use axum::{http::StatusCode, middleware, routing::get, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{
        providers::{AccountProvider, CatalogProvider},
        recommendations::RecommendationService,
    },
};

pub mod auth;
pub mod catalog;
pub mod genres;
pub mod me;
pub mod playlists;
pub mod recommendations;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogProvider>,
    pub account: Arc<dyn AccountProvider>,
    pub recommendations: Arc<RecommendationService>,
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations", get(recommendations::recommend))
        .route("/genres", get(genres::list))
        .route("/tracks/:id", get(catalog::get_track))
        .route("/search/tracks", get(catalog::search_tracks))
        .route("/search/artists", get(catalog::search_artists))
        .route("/playlists", post(playlists::create))
        .route("/me/top/tracks", get(me::top_tracks))
        .route("/me/top/artists", get(me::top_artists))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
