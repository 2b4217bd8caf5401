use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::CatalogTrack,
    routes::AppState,
};

const DEFAULT_SEARCH_LIMIT: u32 = 20;
const MAX_SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<u32>,
}

impl SearchQuery {
    fn query(&self) -> AppResult<&str> {
        let q = self.q.trim();
        if q.is_empty() {
            return Err(AppError::InvalidInput("Search query is required.".to_string()));
        }
        Ok(q)
    }

    fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }
}

/// Handler for a single catalog track
pub async fn get_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<CatalogTrack>> {
    state
        .catalog
        .get_track(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Track {} not found", id)))
}

/// Handler for track search, used to pick seed tracks
pub async fn search_tracks(
    State(state): State<AppState>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(params) = params?;
    let tracks = state
        .catalog
        .search_tracks(params.query()?, params.limit(), None)
        .await?;
    Ok(Json(json!({ "tracks": tracks })))
}

/// Handler for artist search, used to pick seed artists
pub async fn search_artists(
    State(state): State<AppState>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(params) = params?;
    let artists = state
        .catalog
        .search_artists(params.query()?, params.limit())
        .await?;
    Ok(Json(json!({ "artists": artists })))
}
