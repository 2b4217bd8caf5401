use serde::{Deserialize, Serialize};

pub const DEFAULT_PLAYLIST_NAME: &str = "TeraHz Playlist";
pub const DEFAULT_PLAYLIST_DESCRIPTION: &str = "Generated by TeraHz";

/// Request to publish curated recommendations as a playlist
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlaylistRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    pub track_ids: Vec<String>,
}

impl CreatePlaylistRequest {
    pub fn name(&self) -> &str {
        non_blank(self.name.as_deref()).unwrap_or(DEFAULT_PLAYLIST_NAME)
    }

    pub fn description(&self) -> &str {
        non_blank(self.description.as_deref()).unwrap_or(DEFAULT_PLAYLIST_DESCRIPTION)
    }

    pub fn is_public(&self) -> bool {
        self.public.unwrap_or(true)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A playlist created on the user's account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishedPlaylist {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub tracks_added: usize,
}
