use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{CatalogTrack, SeedSet},
    routes::AppState,
    services::finalizer,
};

/// Comma-separated seed lists; `limit` stays raw so bad values fall back to the default
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub seed_tracks: Option<String>,
    pub seed_artists: Option<String>,
    pub seed_genres: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub tracks: Vec<CatalogTrack>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    request_id: RequestId,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let seeds = SeedSet::from_lists(
        params.seed_tracks.as_deref(),
        params.seed_artists.as_deref(),
        params.seed_genres.as_deref(),
    );
    let limit = finalizer::clamp_limit(params.limit.as_deref());

    tracing::debug!(%request_id, seeds = ?seeds.refs(), limit, "Recommendation request");

    let tracks = state.recommendations.recommend(&seeds, limit).await?;
    Ok(Json(RecommendationResponse { tracks }))
}
