/// External data provider abstraction
///
/// Recommendations combine two independent sources: an authoritative music
/// catalog (ids, metadata, full-text search) and a social similarity graph that
/// only knows free-text names. Each source sits behind its own trait so the
/// aggregation engine can be exercised against in-memory fakes.
use crate::{
    error::AppResult,
    models::{
        CatalogArtist, CatalogTrack, CreatePlaylistRequest, PublishedPlaylist, SimilarArtist,
        SimilarTrack, TopTimeRange,
    },
};

pub mod lastfm;
pub mod spotify;

/// Catalog of catalog-identified tracks and artists
///
/// Lookups by id return `Ok(None)` when the catalog does not know the id;
/// `Err` is reserved for transport, credential, and protocol failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn get_track(&self, id: &str) -> AppResult<Option<CatalogTrack>>;

    async fn get_artist(&self, id: &str) -> AppResult<Option<CatalogArtist>>;

    /// Free-text track search; `query` may use field filters such as `artist:` or `genre:`
    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
        offset: Option<u32>,
    ) -> AppResult<Vec<CatalogTrack>>;

    /// Best catalog match for a free-text title and artist pair
    async fn search_exact_track(&self, title: &str, artist: &str)
        -> AppResult<Option<CatalogTrack>>;

    async fn search_tracks_by_artist_name(
        &self,
        name: &str,
        limit: u32,
    ) -> AppResult<Vec<CatalogTrack>>;

    async fn search_artists(&self, query: &str, limit: u32) -> AppResult<Vec<CatalogArtist>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Social "similar items" graph
///
/// Results are unverified names that must be cross-resolved against the
/// catalog before they can be recommended.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SimilarityProvider: Send + Sync {
    async fn similar_tracks(
        &self,
        artist: &str,
        title: &str,
        limit: u32,
    ) -> AppResult<Vec<SimilarTrack>>;

    async fn similar_artists(&self, artist: &str, limit: u32) -> AppResult<Vec<SimilarArtist>>;

    async fn top_tracks_by_tag(
        &self,
        tag: &str,
        limit: u32,
        page: u32,
    ) -> AppResult<Vec<SimilarTrack>>;

    /// Whether credentials are present; similarity lookups are skipped otherwise
    fn is_configured(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Calls made on behalf of a signed-in user with their own bearer token
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AccountProvider: Send + Sync {
    /// Creates a playlist on the user's account and fills it with the tracks
    async fn publish(
        &self,
        user_token: &str,
        request: &CreatePlaylistRequest,
    ) -> AppResult<PublishedPlaylist>;

    /// The user's most played tracks, offered as seed candidates
    async fn top_tracks(
        &self,
        user_token: &str,
        time_range: TopTimeRange,
        limit: u32,
    ) -> AppResult<Vec<CatalogTrack>>;

    async fn top_artists(
        &self,
        user_token: &str,
        time_range: TopTimeRange,
        limit: u32,
    ) -> AppResult<Vec<CatalogArtist>>;
}
