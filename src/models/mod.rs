use serde::{Deserialize, Serialize};

pub mod account;
pub mod playlist;
pub mod seeds;

pub use account::TopTimeRange;
pub use playlist::{CreatePlaylistRequest, PublishedPlaylist};
pub use seeds::{SeedRef, SeedSet, MAX_SEEDS_PER_KIND};

/// A track as identified by the catalog
///
/// Field names follow the catalog's wire format so the UI can render
/// recommendation results and search results with the same component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub uri: Option<String>,
}

impl CatalogTrack {
    /// Name of the first credited artist, if any
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists
            .first()
            .map(|artist| artist.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Artist credit embedded in a track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtistRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlbumRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// An artist as identified by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

// ============================================================================
// Similarity Provider Types
// ============================================================================

/// A track suggested by the similarity graph. Names are unverified free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarTrack {
    pub name: String,
    pub artist: String,
}

/// An artist suggested by the similarity graph
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarArtist {
    pub name: String,
    pub match_score: f64,
}

// ============================================================================
// Spotify Web API Types
// ============================================================================

/// Envelope returned by `/v1/search`
///
/// Items are kept as raw values and converted one by one, since the
/// catalog occasionally returns `null` or partial entries inside `items`.
#[derive(Debug, Default, Deserialize)]
pub struct SpotifySearchResponse {
    #[serde(default)]
    pub tracks: Option<SpotifyPage>,
    #[serde(default)]
    pub artists: Option<SpotifyPage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpotifyPage {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

impl SpotifyPage {
    /// Converts the page items, dropping entries that do not parse or have no id
    pub fn parse_items<T>(self) -> Vec<T>
    where
        T: serde::de::DeserializeOwned + HasCatalogId,
    {
        self.items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<T>(item).ok())
            .filter(|entity| !entity.catalog_id().is_empty())
            .collect()
    }
}

/// Entities with a catalog identity
pub trait HasCatalogId {
    fn catalog_id(&self) -> &str;
}

impl HasCatalogId for CatalogTrack {
    fn catalog_id(&self) -> &str {
        &self.id
    }
}

impl HasCatalogId for CatalogArtist {
    fn catalog_id(&self) -> &str {
        &self.id
    }
}

/// Token endpoint response for the client-credentials grant
#[derive(Debug, Deserialize)]
pub struct SpotifyTokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// `/v1/me` profile, only the fields playlist publishing needs
#[derive(Debug, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_track_deserialization() {
        let json = r#"{
            "id": "4uLU6hMCjMI75M1A2tKUQC",
            "name": "Never Gonna Give You Up",
            "artists": [{"id": "0gxyHStUsqpMadRV0Di1Qt", "name": "Rick Astley", "type": "artist"}],
            "album": {"id": "6XhjNHCyCDyyGJRM5mg40G", "name": "Whenever You Need Somebody",
                      "images": [{"url": "https://i.scdn.co/image/a", "width": 640, "height": 640}]},
            "duration_ms": 213573,
            "popularity": 77,
            "preview_url": null,
            "explicit": false,
            "uri": "spotify:track:4uLU6hMCjMI75M1A2tKUQC",
            "disc_number": 1
        }"#;

        let track: CatalogTrack = serde_json::from_str(json).unwrap();
        assert_eq!(track.id, "4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(track.primary_artist(), Some("Rick Astley"));
        assert_eq!(track.duration_ms, 213573);
        assert_eq!(track.preview_url, None);
        assert_eq!(track.album.unwrap().images[0].width, Some(640));
    }

    #[test]
    fn test_primary_artist_missing() {
        let json = r#"{"id": "t1", "name": "Untitled", "artists": []}"#;
        let track: CatalogTrack = serde_json::from_str(json).unwrap();
        assert_eq!(track.primary_artist(), None);
    }

    #[test]
    fn test_search_page_drops_null_and_idless_items() {
        let json = r#"{
            "tracks": {
                "items": [
                    {"id": "a", "name": "One"},
                    null,
                    {"id": "", "name": "No id"},
                    {"name": "Missing id"},
                    {"id": "b", "name": "Two"}
                ]
            }
        }"#;

        let response: SpotifySearchResponse = serde_json::from_str(json).unwrap();
        let tracks: Vec<CatalogTrack> = response.tracks.unwrap().parse_items();
        let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_token_response_default_expiry() {
        let token: SpotifyTokenResponse =
            serde_json::from_str(r#"{"access_token": "abc", "token_type": "Bearer"}"#).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 3600);
    }
}
