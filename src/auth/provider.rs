//! Credential providers
//!
//! `TokenProvider` obtains bearer tokens by trying each configured
//! `AuthStrategy` in rank order and caches the first one that works.
//! Refresh is synchronous with respect to the caller: a call made inside the
//! expiry buffer blocks on the token endpoint. Failures are not retried here.

use super::types::{AuthStrategy, CachedToken, Credentials, InstanceUrls, TokenResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Source of bearer tokens for remote calls
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a valid token, refreshing it first if it is about to expire
    async fn token(&self) -> Result<String>;

    /// Whether the cached token (if any) is missing or inside the refresh buffer
    async fn is_expired(&self) -> bool;

    /// Instance URLs learned during authentication
    async fn instance_urls(&self) -> InstanceUrls {
        InstanceUrls::default()
    }
}

/// Provider backed by the remote token endpoints
pub struct TokenProvider {
    credentials: Credentials,
    strategies: Vec<AuthStrategy>,
    http_client: Client,
    cached_token: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    /// Create a provider trying `strategies` in order
    pub fn new(
        credentials: Credentials,
        strategies: Vec<AuthStrategy>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Http)?;
        Ok(Self {
            credentials,
            strategies,
            http_client,
            cached_token: RwLock::new(None),
        })
    }

    /// Drop the cached token so the next call re-authenticates
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    /// Walk the ranked strategy list until one yields a token
    async fn fetch_new_token(&self) -> Result<CachedToken> {
        let mut failures = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            match self.request_token(*strategy).await {
                Ok(token) => {
                    info!(strategy = strategy.name(), "Authenticated");
                    return Ok(token);
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Auth strategy failed");
                    failures.push(format!("{}: {e}", strategy.name()));
                }
            }
        }

        if failures.is_empty() {
            return Err(Error::auth("no auth strategies configured"));
        }
        Err(Error::auth(failures.join("; ")))
    }

    async fn request_token(&self, strategy: AuthStrategy) -> Result<CachedToken> {
        let url = format!(
            "{}{}",
            self.credentials.auth_url.trim_end_matches('/'),
            strategy.token_path()
        );
        debug!(%url, "Requesting token");

        let response = self
            .http_client
            .post(&url)
            .json(&strategy.request_body(&self.credentials))
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "token request failed with status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::auth(format!("unreadable token response: {e}")))?;
        Ok(token_response.into_cached_token())
    }
}

#[async_trait]
impl CredentialProvider for TokenProvider {
    async fn token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
            debug!("Token inside refresh buffer, refreshing");
        }

        let new_token = self.fetch_new_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);
        Ok(token_str)
    }

    async fn is_expired(&self) -> bool {
        self.cached_token
            .read()
            .await
            .as_ref()
            .map_or(true, CachedToken::is_expired)
    }

    async fn instance_urls(&self) -> InstanceUrls {
        self.cached_token
            .read()
            .await
            .as_ref()
            .map(|t| t.instance.clone())
            .unwrap_or_default()
    }
}

/// Provider that always hands out the same token
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create a provider for a fixed token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }

    async fn is_expired(&self) -> bool {
        false
    }
}
