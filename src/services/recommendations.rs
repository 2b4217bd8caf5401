use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{sync::Arc, time::Duration};

use crate::{
    error::{AppError, AppResult},
    models::{CatalogTrack, SeedSet},
    services::{
        aggregator::CandidateAggregator,
        finalizer,
        providers::{CatalogProvider, SimilarityProvider},
        seed_resolver::SeedResolver,
    },
};

/// Generates track recommendations from up to five track, artist and genre seeds
///
/// A request resolves its seeds, gathers candidates from the similarity graph
/// and catalog keyword searches, then returns a random sample of the pool.
/// Seed tracks never appear in the output. The whole pipeline runs under a
/// single deadline; on timeout nothing partial is returned.
pub struct RecommendationService {
    resolver: SeedResolver,
    aggregator: CandidateAggregator,
    deadline: Duration,
}

impl RecommendationService {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        similarity: Arc<dyn SimilarityProvider>,
        deadline: Duration,
    ) -> Self {
        Self {
            resolver: SeedResolver::new(catalog.clone()),
            aggregator: CandidateAggregator::new(catalog, similarity),
            deadline,
        }
    }

    pub async fn recommend(&self, seeds: &SeedSet, limit: usize) -> AppResult<Vec<CatalogTrack>> {
        let mut rng = StdRng::from_entropy();
        self.recommend_with_rng(seeds, limit, &mut rng).await
    }

    pub async fn recommend_with_rng<R>(
        &self,
        seeds: &SeedSet,
        limit: usize,
        rng: &mut R,
    ) -> AppResult<Vec<CatalogTrack>>
    where
        R: Rng + Send,
    {
        if seeds.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one seed is required.".to_string(),
            ));
        }

        tracing::info!(
            seed_tracks = seeds.tracks.len(),
            seed_artists = seeds.artists.len(),
            seed_genres = seeds.genres.len(),
            limit,
            "Generating recommendations"
        );

        let pipeline = async {
            let resolved = self.resolver.resolve(seeds).await?;
            Ok::<_, AppError>(self.aggregator.aggregate(&resolved, &mut *rng).await)
        };

        let outcome = tokio::time::timeout(self.deadline, pipeline).await;
        let pool = match outcome {
            Ok(Ok(pool)) => pool,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Recommendation pipeline failed");
                return Err(AppError::RecommendationFailed);
            }
            Err(_) => {
                tracing::error!(deadline = ?self.deadline, "Recommendation pipeline timed out");
                return Err(AppError::RecommendationFailed);
            }
        };

        let tracks = finalizer::finalize(pool, limit, rng);
        tracing::info!(returned = tracks.len(), "Recommendations generated");

        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArtistRef, CatalogArtist, SimilarArtist, SimilarTrack};
    use crate::services::providers::{MockCatalogProvider, MockSimilarityProvider};

    fn track(id: &str, name: &str, artist: &str) -> CatalogTrack {
        CatalogTrack {
            id: id.to_string(),
            name: name.to_string(),
            artists: vec![ArtistRef {
                id: None,
                name: artist.to_string(),
            }],
            album: None,
            duration_ms: 210_000,
            popularity: 60,
            preview_url: None,
            explicit: false,
            uri: None,
        }
    }

    fn service(catalog: MockCatalogProvider, similarity: MockSimilarityProvider) -> RecommendationService {
        RecommendationService::new(Arc::new(catalog), Arc::new(similarity), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_empty_seeds_make_no_calls() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_get_track().never();
        catalog.expect_get_artist().never();
        catalog.expect_search_tracks().never();
        let mut similarity = MockSimilarityProvider::new();
        similarity.expect_is_configured().never();

        let service = service(catalog, similarity);
        let seeds = SeedSet::from_lists(Some(" , "), None, Some(""));
        let err = service.recommend(&seeds, 30).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(ref m) if m == "At least one seed is required."));
    }

    #[tokio::test]
    async fn test_seed_track_scenario() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_get_track()
            .returning(|id| Ok(Some(track(id, "Song", "Artur"))));
        catalog
            .expect_search_exact_track()
            .returning(|title, artist| match title {
                "Song2" => Ok(Some(track("T2", title, artist))),
                _ => Ok(None),
            });
        catalog
            .expect_search_tracks_by_artist_name()
            .returning(|_, _| Ok(vec![track("T1", "Song", "Artur"), track("T3", "Song3", "Artur")]));
        catalog.expect_search_tracks().returning(|_, _, _| Ok(vec![]));

        let mut similarity = MockSimilarityProvider::new();
        similarity.expect_is_configured().return_const(true);
        similarity.expect_similar_tracks().returning(|_, _, _| {
            Ok(vec![SimilarTrack {
                name: "Song2".to_string(),
                artist: "Artur".to_string(),
            }])
        });

        let service = service(catalog, similarity);
        let seeds = SeedSet::from_lists(Some("T1"), None, None);
        let mut rng = StdRng::seed_from_u64(99);
        let tracks = service.recommend_with_rng(&seeds, 10, &mut rng).await.unwrap();

        let mut ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["T2", "T3"]);
    }

    #[tokio::test]
    async fn test_limit_caps_output() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_get_artist().returning(|id| {
            Ok(Some(CatalogArtist {
                id: id.to_string(),
                name: "Artur".to_string(),
                genres: vec![],
                images: vec![],
            }))
        });
        catalog
            .expect_search_tracks_by_artist_name()
            .returning(|name, _| {
                Ok((0..5)
                    .map(|i| track(&format!("{}-{}", name, i), "x", name))
                    .collect())
            });

        let mut similarity = MockSimilarityProvider::new();
        similarity.expect_is_configured().return_const(true);
        similarity.expect_similar_artists().returning(|_, _| {
            Ok((0..10)
                .map(|i| SimilarArtist {
                    name: format!("Similar {}", i),
                    match_score: 0.5,
                })
                .collect())
        });

        let service = service(catalog, similarity);
        let seeds = SeedSet::from_lists(None, Some("A1"), None);
        let tracks = service.recommend(&seeds, 7).await.unwrap();
        assert_eq!(tracks.len(), 7);
    }

    #[tokio::test]
    async fn test_catalog_outage_fails_request() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_get_track()
            .returning(|_| Err(AppError::ExternalApi("503".to_string())));
        let similarity = MockSimilarityProvider::new();

        let service = service(catalog, similarity);
        let seeds = SeedSet::from_lists(Some("T1"), None, None);
        let err = service.recommend(&seeds, 30).await.unwrap_err();
        assert!(matches!(err, AppError::RecommendationFailed));
    }

    /// Catalog that never answers in time
    struct StalledCatalog;

    #[async_trait::async_trait]
    impl CatalogProvider for StalledCatalog {
        async fn get_track(&self, _id: &str) -> AppResult<Option<CatalogTrack>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn get_artist(&self, _id: &str) -> AppResult<Option<CatalogArtist>> {
            Ok(None)
        }

        async fn search_tracks(
            &self,
            _query: &str,
            _limit: u32,
            _offset: Option<u32>,
        ) -> AppResult<Vec<CatalogTrack>> {
            Ok(vec![])
        }

        async fn search_exact_track(
            &self,
            _title: &str,
            _artist: &str,
        ) -> AppResult<Option<CatalogTrack>> {
            Ok(None)
        }

        async fn search_tracks_by_artist_name(
            &self,
            _name: &str,
            _limit: u32,
        ) -> AppResult<Vec<CatalogTrack>> {
            Ok(vec![])
        }

        async fn search_artists(&self, _query: &str, _limit: u32) -> AppResult<Vec<CatalogArtist>> {
            Ok(vec![])
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_deadline_exceeded_fails_request() {
        let mut similarity = MockSimilarityProvider::new();
        similarity.expect_is_configured().return_const(false);

        let service = RecommendationService::new(
            Arc::new(StalledCatalog),
            Arc::new(similarity),
            Duration::from_millis(50),
        );
        let seeds = SeedSet::from_lists(Some("T1"), None, None);
        let err = service.recommend(&seeds, 30).await.unwrap_err();
        assert!(matches!(err, AppError::RecommendationFailed));
    }
}
