use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{CreatePlaylistRequest, PublishedPlaylist},
    routes::{auth::UserToken, AppState},
};

/// Handler for publishing a playlist to the connected user's account
pub async fn create(
    State(state): State<AppState>,
    UserToken(token): UserToken,
    body: Result<Json<CreatePlaylistRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PublishedPlaylist>)> {
    let Json(request) = body?;

    if request.track_ids.iter().all(|id| id.trim().is_empty()) {
        return Err(AppError::InvalidInput(
            "At least one track is required.".to_string(),
        ));
    }

    let playlist = state.account.publish(&token, &request).await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}
