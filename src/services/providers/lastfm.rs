/// Last.fm similarity provider
///
/// Provides the "similar items" graph: similar tracks, similar artists and the
/// top tracks for a tag. Everything returned is free text and must be
/// cross-resolved against the catalog.
///
/// Last.fm's JSON is loosely shaped. A list with a single entry comes back as
/// a bare object, artists are sometimes a string and sometimes `{name}`, and
/// match scores arrive as strings. All of that is normalized here so callers
/// always see a plain sequence.
use crate::{
    error::{AppError, AppResult},
    models::{SimilarArtist, SimilarTrack},
    services::providers::SimilarityProvider,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::instrument;

pub struct LastFmClient {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    limiter: Arc<Semaphore>,
}

impl LastFmClient {
    /// `api_key` of `None` yields an unconfigured client whose lookups return nothing
    pub fn new(
        http_client: HttpClient,
        api_key: Option<String>,
        api_url: String,
        max_concurrent_requests: usize,
    ) -> Self {
        tracing::debug!(
            api_url = %api_url,
            configured = api_key.is_some(),
            "Initialized Last.fm client"
        );
        Self {
            http_client,
            api_key,
            api_url,
            limiter: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }

    async fn call(&self, params: &[(&str, String)]) -> AppResult<Option<Value>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| AppError::Internal("Last.fm rate limiter closed".to_string()))?;

        let response = self
            .http_client
            .get(&self.api_url)
            .query(params)
            .query(&[("api_key", api_key), ("format", "json")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_lastfm_body(status, &body).map(Some)
    }
}

#[async_trait::async_trait]
impl SimilarityProvider for LastFmClient {
    #[instrument(skip(self))]
    async fn similar_tracks(
        &self,
        artist: &str,
        title: &str,
        limit: u32,
    ) -> AppResult<Vec<SimilarTrack>> {
        let params = [
            ("method", "track.getsimilar".to_string()),
            ("artist", artist.to_string()),
            ("track", title.to_string()),
            ("autocorrect", "1".to_string()),
            ("limit", limit.to_string()),
        ];
        let value = self.call(&params).await?;
        let tracks = value
            .map(|v| parse_tracks(&v, "similartracks"))
            .unwrap_or_default();

        tracing::debug!(artist = %artist, title = %title, results = tracks.len(), "Similar tracks fetched");

        Ok(tracks)
    }

    #[instrument(skip(self))]
    async fn similar_artists(&self, artist: &str, limit: u32) -> AppResult<Vec<SimilarArtist>> {
        let params = [
            ("method", "artist.getsimilar".to_string()),
            ("artist", artist.to_string()),
            ("autocorrect", "1".to_string()),
            ("limit", limit.to_string()),
        ];
        let value = self.call(&params).await?;
        let artists = value.map(|v| parse_artists(&v)).unwrap_or_default();

        tracing::debug!(artist = %artist, results = artists.len(), "Similar artists fetched");

        Ok(artists)
    }

    #[instrument(skip(self))]
    async fn top_tracks_by_tag(
        &self,
        tag: &str,
        limit: u32,
        page: u32,
    ) -> AppResult<Vec<SimilarTrack>> {
        let params = [
            ("method", "tag.gettoptracks".to_string()),
            ("tag", tag.to_string()),
            ("limit", limit.to_string()),
            ("page", page.to_string()),
        ];
        let value = self.call(&params).await?;
        let tracks = value.map(|v| parse_tracks(&v, "tracks")).unwrap_or_default();

        tracing::debug!(tag = %tag, page, results = tracks.len(), "Tag top tracks fetched");

        Ok(tracks)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn name(&self) -> &'static str {
        "lastfm"
    }
}

/// Checks HTTP status and the in-body `{error, message}` convention
fn parse_lastfm_body(status: StatusCode, body: &str) -> AppResult<Value> {
    if !status.is_success() {
        return Err(AppError::ExternalApi(format!(
            "Last.fm API returned status {}: {}",
            status, body
        )));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::ExternalApi(format!("Failed to parse Last.fm response: {}", e)))?;

    if let Some(code) = value.get("error").and_then(Value::as_i64) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Last.fm error");
        return Err(AppError::ExternalApi(format!(
            "Last.fm API error {}: {}",
            code, message
        )));
    }

    Ok(value)
}

/// A list field that may be an array, a single object, or missing
fn one_or_many(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item) if item.is_object() => vec![item],
        _ => Vec::new(),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Artist credit as either `"Name"` or `{"name": "Name"}`
fn artist_name(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::Object(obj)) => non_empty_str(obj.get("name")),
        other => non_empty_str(other),
    }
}

fn parse_tracks(value: &Value, container: &str) -> Vec<SimilarTrack> {
    one_or_many(value.get(container).and_then(|c| c.get("track")))
        .into_iter()
        .filter_map(|track| {
            Some(SimilarTrack {
                name: non_empty_str(track.get("name"))?,
                artist: artist_name(track.get("artist"))?,
            })
        })
        .collect()
}

fn parse_artists(value: &Value) -> Vec<SimilarArtist> {
    one_or_many(value.get("similarartists").and_then(|c| c.get("artist")))
        .into_iter()
        .filter_map(|artist| {
            let match_score = match artist.get("match") {
                Some(Value::String(s)) => s.parse::<f64>().unwrap_or(0.0),
                Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
                _ => 0.0,
            };
            Some(SimilarArtist {
                name: non_empty_str(artist.get("name"))?,
                match_score,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{serve, InFlight};
    use axum::{
        extract::{Query, State},
        routing::get,
        Json, Router,
    };
    use futures::future::join_all;
    use serde_json::json;
    use std::{collections::HashMap, time::Duration};

    #[test]
    fn test_parse_similar_tracks_array() {
        let value = json!({
            "similartracks": {
                "track": [
                    {"name": "Song2", "artist": {"name": "Artur", "mbid": ""}, "match": 1.0},
                    {"name": "Song3", "artist": "Someone Else"},
                    {"name": "", "artist": {"name": "Nobody"}},
                    {"name": "No Artist"}
                ]
            }
        });

        let tracks = parse_tracks(&value, "similartracks");
        assert_eq!(
            tracks,
            vec![
                SimilarTrack { name: "Song2".to_string(), artist: "Artur".to_string() },
                SimilarTrack { name: "Song3".to_string(), artist: "Someone Else".to_string() },
            ]
        );
    }

    #[test]
    fn test_parse_single_track_object_is_normalized() {
        let value = json!({
            "tracks": {
                "track": {"name": "Only One", "artist": {"name": "Solo"}}
            }
        });

        let tracks = parse_tracks(&value, "tracks");
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "Only One");
    }

    #[test]
    fn test_parse_tracks_missing_or_odd_container() {
        assert!(parse_tracks(&json!({}), "similartracks").is_empty());
        assert!(parse_tracks(&json!({"similartracks": {"track": ""}}), "similartracks").is_empty());
        assert!(parse_tracks(&json!({"similartracks": {"#text": "\n"}}), "similartracks").is_empty());
    }

    #[test]
    fn test_parse_artists_match_scores() {
        let value = json!({
            "similarartists": {
                "artist": [
                    {"name": "A", "match": "0.87"},
                    {"name": "B", "match": 0.5},
                    {"name": "C", "match": "n/a"},
                    {"match": "1"}
                ]
            }
        });

        let artists = parse_artists(&value);
        assert_eq!(artists.len(), 3);
        assert_eq!(artists[0].match_score, 0.87);
        assert_eq!(artists[1].match_score, 0.5);
        assert_eq!(artists[2].match_score, 0.0);
    }

    #[test]
    fn test_parse_single_artist_object() {
        let value = json!({"similarartists": {"artist": {"name": "Lonely", "match": "1"}}});
        let artists = parse_artists(&value);
        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].name, "Lonely");
    }

    #[test]
    fn test_parse_body_api_error() {
        let body = r#"{"error": 6, "message": "Track not found"}"#;
        let result = parse_lastfm_body(StatusCode::OK, body);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Track not found"));
    }

    #[test]
    fn test_parse_body_http_error() {
        let result = parse_lastfm_body(StatusCode::SERVICE_UNAVAILABLE, "down");
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[test]
    fn test_parse_body_malformed_json() {
        let result = parse_lastfm_body(StatusCode::OK, "<html>");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_client_returns_nothing() {
        let client = LastFmClient::new(
            reqwest::Client::new(),
            None,
            "http://test.local/2.0/".to_string(),
            2,
        );

        assert!(!client.is_configured());
        assert!(client.similar_tracks("Artur", "Song", 30).await.unwrap().is_empty());
        assert!(client.similar_artists("Artur", 15).await.unwrap().is_empty());
        assert!(client.top_tracks_by_tag("rock", 30, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_flight_calls_are_bounded() {
        let in_flight = InFlight::default();
        let app = Router::new()
            .route(
                "/2.0/",
                get(
                    |State(in_flight): State<InFlight>,
                     Query(params): Query<HashMap<String, String>>| async move {
                        let _guard = in_flight.enter();
                        tokio::time::sleep(Duration::from_millis(40)).await;
                        let artist = params.get("artist").cloned().unwrap_or_default();
                        Json(json!({
                            "similarartists": {
                                "artist": {"name": format!("Like {}", artist), "match": "0.5"}
                            }
                        }))
                    },
                ),
            )
            .with_state(in_flight.clone());
        let addr = serve(app).await;

        let client = LastFmClient::new(
            reqwest::Client::new(),
            Some("key".to_string()),
            format!("http://{}/2.0/", addr),
            3,
        );

        let artists: Vec<String> = (0..9).map(|i| format!("Artist {}", i)).collect();
        let results = join_all(artists.iter().map(|a| client.similar_artists(a, 15))).await;

        for (artist, result) in artists.iter().zip(results) {
            let similar = result.unwrap();
            assert_eq!(similar[0].name, format!("Like {}", artist));
        }
        assert_eq!(in_flight.total(), 9);
        assert!(in_flight.peak() <= 3, "peak was {}", in_flight.peak());
    }
}
