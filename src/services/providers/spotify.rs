/// Spotify Web API provider
///
/// Serves as the authoritative catalog: id lookups and full-text search for
/// tracks and artists, plus playlist publishing on behalf of a user.
///
/// API Flow:
/// 1. Lookups: /v1/tracks/{id}, /v1/artists/{id} → 404/400 means "unknown id"
/// 2. Search: /v1/search?q=…&type=track|artist → paged items
/// 3. Publishing: /v1/me → /v1/users/{id}/playlists → /v1/playlists/{id}/tracks
/// 4. Top items: /v1/me/top/tracks|artists with the user's token
use crate::{
    error::{AppError, AppResult},
    models::{
        CatalogArtist, CatalogTrack, CreatePlaylistRequest, HasCatalogId, PublishedPlaylist,
        SpotifyPage, SpotifySearchResponse, SpotifyUser, TopTimeRange,
    },
    services::{
        credentials::CredentialProvider,
        providers::{AccountProvider, CatalogProvider},
    },
};
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::instrument;

/// Largest page the search endpoint accepts
const SEARCH_LIMIT_MAX: u32 = 50;
/// Largest batch accepted when adding tracks to a playlist
const PLAYLIST_ADD_BATCH: usize = 100;
/// Largest page `/v1/me/top` accepts
const TOP_ITEMS_LIMIT_MAX: u32 = 50;

#[derive(Clone)]
pub struct SpotifyCatalog {
    http_client: HttpClient,
    api_url: String,
    credentials: Arc<dyn CredentialProvider>,
    limiter: Arc<Semaphore>,
}

impl SpotifyCatalog {
    pub fn new(
        http_client: HttpClient,
        api_url: String,
        credentials: Arc<dyn CredentialProvider>,
        max_concurrent_requests: usize,
    ) -> Self {
        tracing::debug!(api_url = %api_url, max_concurrent_requests, "Initialized Spotify catalog");
        Self {
            http_client,
            api_url,
            credentials,
            limiter: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        build_endpoint(&self.api_url, segments)
    }

    /// Authenticated GET; `Ok(None)` when the catalog does not know the resource
    #[instrument(skip_all, fields(path = url.path()))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> AppResult<Option<T>> {
        let token = self.credentials.bearer_token().await?;
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| AppError::Internal("Catalog rate limiter closed".to_string()))?;

        let response = self
            .http_client
            .get(url.clone())
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
            tracing::debug!(url = %url, status = %status, "Catalog resource not found");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Spotify API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        let parsed = serde_json::from_str::<T>(&response_text).map_err(|e| {
            tracing::debug!(
                error = %e,
                response = %response_text,
                "Failed to deserialize Spotify response"
            );
            AppError::ExternalApi(format!("Failed to parse Spotify response: {}", e))
        })?;

        Ok(Some(parsed))
    }

    async fn search(
        &self,
        query: &str,
        kind: &str,
        limit: u32,
        offset: Option<u32>,
    ) -> AppResult<SpotifySearchResponse> {
        let url = self.endpoint(&["v1", "search"])?;

        let mut params = vec![
            ("q", query.to_string()),
            ("type", kind.to_string()),
            ("limit", limit.clamp(1, SEARCH_LIMIT_MAX).to_string()),
        ];
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }

        Ok(self.get_json(url, &params).await?.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for SpotifyCatalog {
    async fn get_track(&self, id: &str) -> AppResult<Option<CatalogTrack>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        let url = self.endpoint(&["v1", "tracks", id])?;
        let track: Option<CatalogTrack> = self.get_json(url, &[]).await?;
        Ok(track.filter(|t| !t.id.is_empty()))
    }

    async fn get_artist(&self, id: &str) -> AppResult<Option<CatalogArtist>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        let url = self.endpoint(&["v1", "artists", id])?;
        let artist: Option<CatalogArtist> = self.get_json(url, &[]).await?;
        Ok(artist.filter(|a| !a.id.is_empty()))
    }

    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
        offset: Option<u32>,
    ) -> AppResult<Vec<CatalogTrack>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let response = self.search(query, "track", limit, offset).await?;
        let tracks: Vec<CatalogTrack> = response
            .tracks
            .map(|page| page.parse_items())
            .unwrap_or_default();

        tracing::debug!(
            query = %query,
            results = tracks.len(),
            provider = "spotify",
            "Track search completed"
        );

        Ok(tracks)
    }

    async fn search_exact_track(
        &self,
        title: &str,
        artist: &str,
    ) -> AppResult<Option<CatalogTrack>> {
        let tracks = self
            .search_tracks(&exact_track_query(title, artist), 1, None)
            .await?;
        Ok(tracks.into_iter().next())
    }

    async fn search_tracks_by_artist_name(
        &self,
        name: &str,
        limit: u32,
    ) -> AppResult<Vec<CatalogTrack>> {
        self.search_tracks(&artist_query(name), limit, None).await
    }

    async fn search_artists(&self, query: &str, limit: u32) -> AppResult<Vec<CatalogArtist>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let response = self.search(query, "artist", limit, None).await?;
        Ok(response
            .artists
            .map(|page| page.parse_items())
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "spotify"
    }
}

/// User-scoped calls: playlist publishing and the user's top items
///
/// Every call carries the user's own bearer token; a 401 from the API is
/// surfaced as [`AppError::Unauthorized`] so the client can re-authenticate.
#[derive(Clone)]
pub struct SpotifyAccount {
    http_client: HttpClient,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    id: String,
    name: String,
    #[serde(default)]
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

impl SpotifyAccount {
    pub fn new(http_client: HttpClient, api_url: String) -> Self {
        Self {
            http_client,
            api_url,
        }
    }

    async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized(
                "Spotify rejected the user token".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Spotify API returned status {}: {}",
                status, body
            )));
        }
        Ok(response)
    }

    async fn current_user(&self, user_token: &str) -> AppResult<SpotifyUser> {
        let url = build_endpoint(&self.api_url, &["v1", "me"])?;
        let response = self
            .http_client
            .get(url)
            .bearer_auth(user_token)
            .send()
            .await?;
        Ok(Self::check_status(response).await?.json().await?)
    }

    /// `/v1/me/top/{kind}`, dropping malformed entries
    #[instrument(skip(self, user_token, time_range), fields(time_range = time_range.as_str()))]
    async fn top_items<T>(
        &self,
        user_token: &str,
        kind: &str,
        time_range: TopTimeRange,
        limit: u32,
    ) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned + HasCatalogId,
    {
        let url = build_endpoint(&self.api_url, &["v1", "me", "top", kind])?;
        let response = self
            .http_client
            .get(url)
            .bearer_auth(user_token)
            .query(&[
                ("time_range", time_range.as_str().to_string()),
                ("limit", limit.clamp(1, TOP_ITEMS_LIMIT_MAX).to_string()),
            ])
            .send()
            .await?;
        let page: SpotifyPage = Self::check_status(response).await?.json().await?;
        let items = page.parse_items();

        tracing::debug!(results = items.len(), "Top items fetched");

        Ok(items)
    }
}

#[async_trait::async_trait]
impl AccountProvider for SpotifyAccount {
    #[instrument(skip_all, fields(track_count = request.track_ids.len()))]
    async fn publish(
        &self,
        user_token: &str,
        request: &CreatePlaylistRequest,
    ) -> AppResult<PublishedPlaylist> {
        let user = self.current_user(user_token).await?;

        let url = build_endpoint(&self.api_url, &["v1", "users", user.id.as_str(), "playlists"])?;
        let response = self
            .http_client
            .post(url)
            .bearer_auth(user_token)
            .json(&json!({
                "name": request.name(),
                "description": request.description(),
                "public": request.is_public(),
            }))
            .send()
            .await?;
        let playlist: CreatedPlaylist = Self::check_status(response).await?.json().await?;

        tracing::info!(
            playlist_id = %playlist.id,
            user_id = %user.id,
            display_name = ?user.display_name,
            "Playlist created"
        );

        let uris: Vec<String> = request
            .track_ids
            .iter()
            .filter(|id| !id.trim().is_empty())
            .map(|id| track_uri(id))
            .collect();

        let tracks_url = build_endpoint(&self.api_url, &["v1", "playlists", playlist.id.as_str(), "tracks"])?;
        for batch in uris.chunks(PLAYLIST_ADD_BATCH) {
            let response = self
                .http_client
                .post(tracks_url.clone())
                .bearer_auth(user_token)
                .json(&json!({ "uris": batch }))
                .send()
                .await?;
            Self::check_status(response).await?;
        }

        tracing::info!(
            playlist_id = %playlist.id,
            tracks_added = uris.len(),
            "Tracks added to playlist"
        );

        Ok(PublishedPlaylist {
            id: playlist.id,
            name: playlist.name,
            url: playlist.external_urls.and_then(|urls| urls.spotify),
            tracks_added: uris.len(),
        })
    }

    async fn top_tracks(
        &self,
        user_token: &str,
        time_range: TopTimeRange,
        limit: u32,
    ) -> AppResult<Vec<CatalogTrack>> {
        self.top_items(user_token, "tracks", time_range, limit).await
    }

    async fn top_artists(
        &self,
        user_token: &str,
        time_range: TopTimeRange,
        limit: u32,
    ) -> AppResult<Vec<CatalogArtist>> {
        self.top_items(user_token, "artists", time_range, limit).await
    }
}

/// Appends path segments to a base URL, percent-encoding each one
fn build_endpoint(base: &str, segments: &[&str]) -> AppResult<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| AppError::Internal(format!("Invalid Spotify API URL {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Internal(format!("Spotify API URL cannot be a base: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn exact_track_query(title: &str, artist: &str) -> String {
    format!("track:{} artist:{}", title, artist)
}

fn artist_query(name: &str) -> String {
    format!("artist:{}", name)
}

fn track_uri(id: &str) -> String {
    format!("spotify:track:{}", id)
}
