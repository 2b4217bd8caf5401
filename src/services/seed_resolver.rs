use futures::future::join_all;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogArtist, CatalogTrack, SeedSet},
    services::providers::CatalogProvider,
};

/// Seeds hydrated into catalog entities
#[derive(Debug, Clone, Default)]
pub struct ResolvedSeeds {
    /// Track ids exactly as requested, including ones the catalog did not resolve
    pub requested_track_ids: Vec<String>,
    pub tracks: Vec<CatalogTrack>,
    pub artists: Vec<CatalogArtist>,
    pub genres: Vec<String>,
}

/// Hydrates seed ids through the catalog
pub struct SeedResolver {
    catalog: Arc<dyn CatalogProvider>,
}

impl SeedResolver {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self { catalog }
    }

    /// Looks up every seed track and artist concurrently
    ///
    /// Unknown ids and individual lookup failures are dropped. Only when every
    /// lookup failed is the catalog considered unavailable.
    pub async fn resolve(&self, seeds: &SeedSet) -> AppResult<ResolvedSeeds> {
        let track_lookups = join_all(seeds.tracks.iter().map(|id| self.catalog.get_track(id)));
        let artist_lookups = join_all(seeds.artists.iter().map(|id| self.catalog.get_artist(id)));
        let (track_results, artist_results) = futures::join!(track_lookups, artist_lookups);

        let attempted = track_results.len() + artist_results.len();
        let (tracks, track_failures) = settle("track", &seeds.tracks, track_results);
        let (artists, artist_failures) = settle("artist", &seeds.artists, artist_results);
        let failures = track_failures + artist_failures;

        if attempted > 0 && failures == attempted {
            tracing::error!(attempted, "Every seed lookup failed");
            return Err(AppError::ExternalApi(
                "Catalog unavailable: no seed could be looked up".to_string(),
            ));
        }

        tracing::info!(
            tracks = tracks.len(),
            artists = artists.len(),
            genres = seeds.genres.len(),
            failed_lookups = failures,
            "Seeds resolved"
        );

        Ok(ResolvedSeeds {
            requested_track_ids: seeds.tracks.clone(),
            tracks,
            artists,
            genres: seeds.genres.clone(),
        })
    }
}

/// Keeps found entities and counts failed lookups
fn settle<T>(kind: &str, ids: &[String], results: Vec<AppResult<Option<T>>>) -> (Vec<T>, usize) {
    let mut found = Vec::with_capacity(results.len());
    let mut failures = 0;

    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(Some(entity)) => found.push(entity),
            Ok(None) => tracing::debug!(kind, id = %id, "Seed not found in catalog"),
            Err(e) => {
                tracing::warn!(kind, id = %id, error = %e, "Seed lookup failed");
                failures += 1;
            }
        }
    }

    (found, failures)
}
