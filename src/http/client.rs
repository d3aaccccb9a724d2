//! HTTP client with retry and rate limiting
//!
//! Provides the single-attempt request primitives used by the transport
//! (`post_soap`, `get_json`) and `execute`, which runs an attempt closure
//! under the retry policy and the rate limiter.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::error::{Error, Result};
use crate::soap::soap_fault;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-call timeout
    pub timeout: Duration,
    /// Retry policy for transient faults
    pub retry: RetryPolicy,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(900),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
            user_agent: format!("mc-extract/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Set the per-call timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Disable rate limiting
    #[must_use]
    pub fn no_rate_limit(mut self) -> Self {
        self.rate_limit = None;
        self
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
    sleeper: Arc<dyn Sleeper>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(Error::Http)?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the sleeper used between retries
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The active retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry
    }

    /// Run one logical call, retrying transient faults.
    ///
    /// `attempt` is invoked once per try with the 1-based attempt number.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let limiter = self.rate_limiter.clone();
        self.config
            .retry
            .run(self.sleeper.as_ref(), label, move |n| {
                let limiter = limiter.clone();
                let call = attempt(n);
                async move {
                    if let Some(limiter) = limiter {
                        limiter.wait().await;
                    }
                    call.await
                }
            })
            .await
    }

    /// POST a SOAP envelope once and return the response body
    pub async fn post_soap(&self, url: &str, action: &str, envelope: String) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", action)
            .body(envelope)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        // faults arrive as 500 but are logical errors, not transport faults
        if response.status() == StatusCode::INTERNAL_SERVER_ERROR {
            let body = response.text().await.map_err(Error::Http)?;
            return Err(soap_fault(&body).unwrap_or_else(|| Error::http_status(500, body)));
        }

        let response = check_status(response).await?;
        debug!("SOAP {action} succeeded: {url}");
        response.text().await.map_err(Error::Http)
    }

    /// GET a JSON document once with a bearer token
    pub async fn get_json(&self, url: &str, query: &[(String, String)], token: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let response = check_status(response).await?;
        debug!("GET succeeded: {url}");
        let body = response.text().await.map_err(Error::Http)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::malformed(format!("invalid JSON from {url}: {e}")))
    }

    fn classify_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else {
            Error::Http(e)
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Turn non-success statuses into typed errors.
///
/// 429 and 5xx stay retryable; 401/403 mean the credentials lack access.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::PermissionFailure {
            object_type: String::new(),
            message: format!("HTTP {}: {body}", status.as_u16()),
        }),
        s if s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error() => {
            Err(Error::http_status(s.as_u16(), body))
        }
        s => Err(Error::remote(format!("HTTP {}: {body}", s.as_u16()))),
    }
}
