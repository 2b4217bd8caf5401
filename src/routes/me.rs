use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    models::TopTimeRange,
    routes::{auth::UserToken, AppState},
};

const DEFAULT_TOP_LIMIT: u32 = 20;
const MAX_TOP_LIMIT: u32 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct TopItemsQuery {
    #[serde(default)]
    time_range: TopTimeRange,
    limit: Option<u32>,
}

impl TopItemsQuery {
    fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT)
    }
}

/// Handler for the user's top tracks, used to pick seed tracks
pub async fn top_tracks(
    State(state): State<AppState>,
    UserToken(token): UserToken,
    params: Result<Query<TopItemsQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(params) = params?;
    let tracks = state
        .account
        .top_tracks(&token, params.time_range, params.limit())
        .await?;
    Ok(Json(json!({ "tracks": tracks })))
}

/// Handler for the user's top artists, used to pick seed artists
pub async fn top_artists(
    State(state): State<AppState>,
    UserToken(token): UserToken,
    params: Result<Query<TopItemsQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(params) = params?;
    let artists = state
        .account
        .top_artists(&token, params.time_range, params.limit())
        .await?;
    Ok(Json(json!({ "artists": artists })))
}
