use serde::Serialize;

/// Upper bound on seeds of each kind, mirroring the catalog's seed ceiling
pub const MAX_SEEDS_PER_KIND: usize = 5;

/// A single user-chosen seed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedRef {
    Track { id: String },
    Artist { id: String },
    Genre { name: String },
}

/// Seeds for one recommendation request, already split and capped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSet {
    pub tracks: Vec<String>,
    pub artists: Vec<String>,
    pub genres: Vec<String>,
}

impl SeedSet {
    /// Builds a seed set from comma-separated query values
    ///
    /// Blank entries are dropped and each list keeps at most
    /// [`MAX_SEEDS_PER_KIND`] entries; extras are ignored.
    pub fn from_lists(
        tracks: Option<&str>,
        artists: Option<&str>,
        genres: Option<&str>,
    ) -> Self {
        Self {
            tracks: split_list(tracks),
            artists: split_list(artists),
            genres: split_list(genres),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.artists.is_empty() && self.genres.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len() + self.artists.len() + self.genres.len()
    }

    /// All seeds as tagged references, tracks first
    pub fn refs(&self) -> Vec<SeedRef> {
        let tracks = self.tracks.iter().map(|id| SeedRef::Track { id: id.clone() });
        let artists = self.artists.iter().map(|id| SeedRef::Artist { id: id.clone() });
        let genres = self.genres.iter().map(|name| SeedRef::Genre { name: name.clone() });
        tracks.chain(artists).chain(genres).collect()
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .take(MAX_SEEDS_PER_KIND)
        .map(str::to_string)
        .collect()
}
