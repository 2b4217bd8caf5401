use serde::Deserialize;
use std::time::Duration;

/// Placeholder shipped in sample `.env` files; treated as "not configured"
const LASTFM_PLACEHOLDER_KEY: &str = "YOUR_LASTFM_API_KEY";

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Spotify application client ID (client-credentials grant)
    pub spotify_client_id: String,

    /// Spotify application client secret
    pub spotify_client_secret: String,

    /// Spotify Web API base URL
    #[serde(default = "default_spotify_api_url")]
    pub spotify_api_url: String,

    /// Spotify accounts service base URL (token endpoint)
    #[serde(default = "default_spotify_accounts_url")]
    pub spotify_accounts_url: String,

    /// Last.fm API key. Similarity lookups are skipped when absent.
    #[serde(default)]
    pub lastfm_api_key: Option<String>,

    /// Last.fm API endpoint
    #[serde(default = "default_lastfm_api_url")]
    pub lastfm_api_url: String,

    /// Timeout applied to every outbound HTTP call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Overall deadline for one recommendation request
    #[serde(default = "default_recommendation_deadline_secs")]
    pub recommendation_deadline_secs: u64,

    /// Maximum in-flight calls per external dependency
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_spotify_api_url() -> String {
    "https://api.spotify.com".to_string()
}

fn default_spotify_accounts_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_lastfm_api_url() -> String {
    "https://ws.audioscrobbler.com/2.0/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    8
}

fn default_recommendation_deadline_secs() -> u64 {
    25
}

fn default_max_concurrent_requests() -> usize {
    8
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Last.fm key, filtered of blanks and the sample placeholder
    pub fn lastfm_key(&self) -> Option<&str> {
        self.lastfm_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != LASTFM_PLACEHOLDER_KEY)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn recommendation_deadline(&self) -> Duration {
        Duration::from_secs(self.recommendation_deadline_secs)
    }
}
