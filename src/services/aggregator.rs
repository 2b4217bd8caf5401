use futures::future::join_all;
use rand::Rng;
use std::sync::Arc;

use crate::{
    models::{CatalogArtist, CatalogTrack, SimilarTrack},
    services::{
        candidate_pool::CandidatePool,
        providers::{CatalogProvider, SimilarityProvider},
        seed_resolver::ResolvedSeeds,
    },
};

const SIMILAR_TRACKS_FETCHED: u32 = 30;
const SIMILAR_TRACKS_USED: usize = 15;
const SIMILAR_ARTISTS_FETCHED: u32 = 15;
const SIMILAR_ARTISTS_USED: usize = 10;
const TRACKS_PER_SIMILAR_ARTIST: u32 = 5;
const TAG_TRACKS_FETCHED: u32 = 30;
const TAG_TRACKS_USED: usize = 15;
/// Tag pages are drawn from 1..=TAG_PAGES so repeated requests vary
const TAG_PAGES: u32 = 3;

const ARTIST_SEARCH_LIMIT: u32 = 20;
const TRACK_NAME_SEARCH_LIMIT: u32 = 10;
const GENRE_SEARCH_LIMIT: u32 = 20;

/// One catalog keyword search issued for a seed
#[derive(Debug, Clone, PartialEq, Eq)]
enum KeywordSearch {
    Artist { name: String, limit: u32 },
    Query { query: String, limit: u32 },
}

/// Builds the deduplicated candidate pool for a set of resolved seeds
///
/// Two strategies feed the pool:
/// - similarity: similar tracks, similar artists, and tag top tracks,
///   cross-resolved into catalog tracks (only when the provider is configured)
/// - keyword: catalog searches by seed artist, track name, and genre (always)
///
/// Both run concurrently and are merged afterwards into a single pool, so no
/// shared state is touched while calls are in flight.
pub struct CandidateAggregator {
    catalog: Arc<dyn CatalogProvider>,
    similarity: Arc<dyn SimilarityProvider>,
}

impl CandidateAggregator {
    pub fn new(catalog: Arc<dyn CatalogProvider>, similarity: Arc<dyn SimilarityProvider>) -> Self {
        Self {
            catalog,
            similarity,
        }
    }

    pub async fn aggregate<R>(&self, seeds: &ResolvedSeeds, rng: &mut R) -> CandidatePool
    where
        R: Rng + Send,
    {
        let tag_pages: Vec<u32> = seeds
            .genres
            .iter()
            .map(|_| rng.gen_range(1..=TAG_PAGES))
            .collect();

        let use_similarity = self.similarity.is_configured();
        if !use_similarity {
            tracing::info!("Similarity provider not configured, using catalog search only");
        }

        let similarity = async {
            if use_similarity {
                self.similarity_candidates(seeds, &tag_pages).await
            } else {
                Vec::new()
            }
        };
        let (similar, keyword) = futures::join!(similarity, self.keyword_candidates(seeds));

        let mut pool = CandidatePool::excluding(seeds.requested_track_ids.iter().cloned());
        let from_similarity = pool.offer_all(similar);
        let from_keywords = pool.offer_all(keyword);

        tracing::info!(
            from_similarity,
            from_keywords,
            pool_size = pool.len(),
            "Candidate pool assembled"
        );

        pool
    }

    async fn similarity_candidates(
        &self,
        seeds: &ResolvedSeeds,
        tag_pages: &[u32],
    ) -> Vec<CatalogTrack> {
        let by_track = join_all(seeds.tracks.iter().map(|t| self.similar_to_track(t)));
        let by_artist = join_all(seeds.artists.iter().map(|a| self.similar_to_artist(a)));
        let by_tag = join_all(
            seeds
                .genres
                .iter()
                .zip(tag_pages)
                .map(|(genre, &page)| self.top_for_tag(genre, page)),
        );

        let (by_track, by_artist, by_tag) = futures::join!(by_track, by_artist, by_tag);

        by_track
            .into_iter()
            .chain(by_artist)
            .chain(by_tag)
            .flatten()
            .collect()
    }

    async fn similar_to_track(&self, seed: &CatalogTrack) -> Vec<CatalogTrack> {
        let Some(artist) = seed.primary_artist() else {
            return Vec::new();
        };

        match self
            .similarity
            .similar_tracks(artist, &seed.name, SIMILAR_TRACKS_FETCHED)
            .await
        {
            Ok(similar) => {
                let batch: Vec<SimilarTrack> = similar.into_iter().take(SIMILAR_TRACKS_USED).collect();
                self.cross_resolve(batch).await
            }
            Err(e) => {
                tracing::warn!(seed_track = %seed.id, error = %e, "Similar tracks lookup failed");
                Vec::new()
            }
        }
    }

    async fn similar_to_artist(&self, seed: &CatalogArtist) -> Vec<CatalogTrack> {
        if seed.name.trim().is_empty() {
            return Vec::new();
        }

        let similar = match self
            .similarity
            .similar_artists(&seed.name, SIMILAR_ARTISTS_FETCHED)
            .await
        {
            Ok(similar) => similar,
            Err(e) => {
                tracing::warn!(seed_artist = %seed.id, error = %e, "Similar artists lookup failed");
                return Vec::new();
            }
        };

        let searches = similar
            .into_iter()
            .take(SIMILAR_ARTISTS_USED)
            .map(|artist| async move {
                self.catalog
                    .search_tracks_by_artist_name(&artist.name, TRACKS_PER_SIMILAR_ARTIST)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(artist = %artist.name, error = %e, "Similar artist search failed");
                        Vec::new()
                    })
            });

        join_all(searches).await.into_iter().flatten().collect()
    }

    async fn top_for_tag(&self, genre: &str, page: u32) -> Vec<CatalogTrack> {
        match self
            .similarity
            .top_tracks_by_tag(genre, TAG_TRACKS_FETCHED, page)
            .await
        {
            Ok(top) => {
                let batch: Vec<SimilarTrack> = top.into_iter().take(TAG_TRACKS_USED).collect();
                self.cross_resolve(batch).await
            }
            Err(e) => {
                tracing::warn!(genre = %genre, page, error = %e, "Tag top tracks lookup failed");
                Vec::new()
            }
        }
    }

    /// Maps free-text matches onto catalog tracks; misses and failures are skipped
    async fn cross_resolve(&self, matches: Vec<SimilarTrack>) -> Vec<CatalogTrack> {
        let lookups = matches.into_iter().map(|candidate| async move {
            match self
                .catalog
                .search_exact_track(&candidate.name, &candidate.artist)
                .await
            {
                Ok(hit) => hit,
                Err(e) => {
                    tracing::warn!(
                        track = %candidate.name,
                        artist = %candidate.artist,
                        error = %e,
                        "Cross-resolution failed"
                    );
                    None
                }
            }
        });

        join_all(lookups).await.into_iter().flatten().collect()
    }

    async fn keyword_candidates(&self, seeds: &ResolvedSeeds) -> Vec<CatalogTrack> {
        let plan = keyword_plan(seeds);
        tracing::debug!(searches = plan.len(), "Running catalog keyword searches");

        join_all(plan.iter().map(|search| self.run_keyword_search(search)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn run_keyword_search(&self, search: &KeywordSearch) -> Vec<CatalogTrack> {
        let result = match search {
            KeywordSearch::Artist { name, limit } => {
                self.catalog.search_tracks_by_artist_name(name, *limit).await
            }
            KeywordSearch::Query { query, limit } => {
                self.catalog.search_tracks(query, *limit, None).await
            }
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(search = ?search, error = %e, "Catalog keyword search failed");
            Vec::new()
        })
    }
}

/// Catalog searches for every seed: artist neighbours and alternate versions
/// for tracks, the artist's catalogue for artists, and genre-scoped searches
fn keyword_plan(seeds: &ResolvedSeeds) -> Vec<KeywordSearch> {
    let mut plan = Vec::new();

    for track in &seeds.tracks {
        if let Some(artist) = track.primary_artist() {
            plan.push(KeywordSearch::Artist {
                name: artist.to_string(),
                limit: ARTIST_SEARCH_LIMIT,
            });
        }
        if !track.name.trim().is_empty() {
            plan.push(KeywordSearch::Query {
                query: track.name.clone(),
                limit: TRACK_NAME_SEARCH_LIMIT,
            });
        }
    }

    for artist in &seeds.artists {
        if !artist.name.trim().is_empty() {
            plan.push(KeywordSearch::Artist {
                name: artist.name.clone(),
                limit: ARTIST_SEARCH_LIMIT,
            });
        }
    }

    for genre in &seeds.genres {
        plan.push(KeywordSearch::Query {
            query: format!("genre:{}", genre),
            limit: GENRE_SEARCH_LIMIT,
        });
    }

    plan
}
