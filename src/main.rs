use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use terahz_api::{
    config::Config,
    routes::{create_router, AppState},
    services::{
        credentials::ClientCredentialsProvider,
        providers::{
            lastfm::LastFmClient,
            spotify::{SpotifyAccount, SpotifyCatalog},
            CatalogProvider, SimilarityProvider,
        },
        recommendations::RecommendationService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let credentials = Arc::new(ClientCredentialsProvider::new(
        http_client.clone(),
        config.spotify_accounts_url.clone(),
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
    ));

    let catalog: Arc<dyn CatalogProvider> = Arc::new(SpotifyCatalog::new(
        http_client.clone(),
        config.spotify_api_url.clone(),
        credentials,
        config.max_concurrent_requests,
    ));

    let similarity: Arc<dyn SimilarityProvider> = Arc::new(LastFmClient::new(
        http_client.clone(),
        config.lastfm_key().map(str::to_string),
        config.lastfm_api_url.clone(),
        config.max_concurrent_requests,
    ));

    if similarity.is_configured() {
        tracing::info!(catalog = catalog.name(), similarity = similarity.name(), "Providers ready");
    } else {
        tracing::warn!(
            catalog = catalog.name(),
            "LASTFM_API_KEY not set, recommendations will use catalog search only"
        );
    }

    let recommendations = Arc::new(RecommendationService::new(
        catalog.clone(),
        similarity,
        config.recommendation_deadline(),
    ));

    let state = AppState {
        catalog,
        account: Arc::new(SpotifyAccount::new(http_client, config.spotify_api_url.clone())),
        recommendations,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
