use chrono::{DateTime, Duration, Utc};
use reqwest::Client as HttpClient;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::SpotifyTokenResponse,
};

/// Refresh a lease this long before it actually expires
const REFRESH_MARGIN_SECS: i64 = 60;
/// Lifetime assumed when the token endpoint reports one that cannot be represented
const FALLBACK_LEASE_SECS: i64 = 3600;

/// Source of bearer credentials for outbound catalog calls
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn bearer_token(&self) -> AppResult<String>;
}

/// An access token together with the instant it stops being valid
#[derive(Debug, Clone, PartialEq)]
pub struct TokenLease {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenLease {
    pub fn new(access_token: String, expires_in_secs: i64, now: DateTime<Utc>) -> Self {
        let expires_at = Duration::try_seconds(expires_in_secs)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .or_else(|| {
                tracing::warn!(expires_in_secs, "Token lifetime out of range, using fallback");
                now.checked_add_signed(Duration::seconds(FALLBACK_LEASE_SECS))
            })
            .unwrap_or(now);

        Self {
            access_token,
            expires_at,
        }
    }

    /// A lease is usable while more than the refresh margin remains
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now > Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

/// Client-credentials grant with lazy refresh
///
/// The lease is fetched on first use and re-fetched only once it is about to
/// expire. The mutex serializes refreshes so a burst of concurrent callers
/// results in a single token request.
pub struct ClientCredentialsProvider {
    http_client: HttpClient,
    accounts_url: String,
    client_id: String,
    client_secret: String,
    lease: Mutex<Option<TokenLease>>,
}

impl ClientCredentialsProvider {
    pub fn new(
        http_client: HttpClient,
        accounts_url: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            http_client,
            accounts_url,
            client_id,
            client_secret,
            lease: Mutex::new(None),
        }
    }

    #[tracing::instrument(skip_all)]
    async fn request_lease(&self) -> AppResult<TokenLease> {
        let url = format!("{}/api/token", self.accounts_url.trim_end_matches('/'));

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, "Client credentials grant rejected");
            return Err(AppError::ExternalApi(format!(
                "Token endpoint returned status {}: {}",
                status, body
            )));
        }

        let token: SpotifyTokenResponse = response.json().await?;
        let lease = TokenLease::new(token.access_token, token.expires_in, Utc::now());

        tracing::info!(expires_at = %lease.expires_at, "Catalog access token refreshed");

        Ok(lease)
    }
}

#[async_trait::async_trait]
impl CredentialProvider for ClientCredentialsProvider {
    async fn bearer_token(&self) -> AppResult<String> {
        let mut lease = self.lease.lock().await;

        if let Some(current) = lease.as_ref() {
            if current.is_fresh(Utc::now()) {
                return Ok(current.access_token.clone());
            }
        }

        let fresh = self.request_lease().await?;
        let token = fresh.access_token.clone();
        *lease = Some(fresh);
        Ok(token)
    }
}

/// A fixed token, e.g. a user token supplied with a request
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait::async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> AppResult<String> {
        Ok(self.token.clone())
    }
}
