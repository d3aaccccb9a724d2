//! Source configuration
//!
//! Credentials, endpoint selection and tuning knobs for a sync run.
//! Loaded from a JSON or YAML file (chosen by extension) and validated
//! before any network call is made.

use crate::auth::{AuthStrategy, Credentials};
use crate::error::{Error, Result};
use crate::http::RetryPolicy;
use crate::types::parse_datetime;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Complete source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Installed package client id
    pub client_id: String,

    /// Installed package client secret
    pub client_secret: String,

    /// Tenant subdomain used to derive auth/SOAP/REST endpoints
    #[serde(default)]
    pub tenant_subdomain: Option<String>,

    /// Explicit auth base URL (overrides the tenant-derived one)
    #[serde(default)]
    pub auth_url: Option<String>,

    /// Explicit SOAP endpoint (overrides the tenant-derived one)
    #[serde(default)]
    pub soap_url: Option<String>,

    /// Explicit REST base URL (overrides the tenant-derived one)
    #[serde(default)]
    pub rest_url: Option<String>,

    /// Business unit MID passed to client-credentials auth
    #[serde(default)]
    pub account_id: Option<String>,

    /// Start of history for streams without a bookmark
    pub start_date: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Incremental window size in days
    #[serde(default = "default_date_window")]
    pub date_window: u32,

    /// Page size requested from the remote service
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Total attempts per remote call, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for retry backoff in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Cap for retry backoff in milliseconds
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Try the legacy token endpoint before client credentials
    #[serde(default)]
    pub use_legacy_auth: bool,

    /// When incremental bookmarks advance
    #[serde(default)]
    pub bookmark_granularity: BookmarkGranularity,
}

/// When an incremental stream's bookmark is advanced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkGranularity {
    /// Only once the whole stream has completed
    #[default]
    Stream,
    /// After every date window
    Window,
}

fn default_request_timeout() -> u64 {
    900
}

fn default_date_window() -> u32 {
    1
}

fn default_batch_size() -> u32 {
    2500
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_retry_max_delay_ms() -> u64 {
    60_000
}

/// Resolved base URLs for the three remote surfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Token endpoint base
    pub auth_url: String,
    /// SOAP service endpoint; the token response may supply it instead
    pub soap_url: Option<String>,
    /// REST API base; the token response may supply it instead
    pub rest_url: Option<String>,
}

impl Endpoints {
    /// Derive all endpoints from a tenant subdomain
    pub fn for_tenant(subdomain: &str) -> Self {
        Self {
            auth_url: format!("https://{subdomain}.auth.marketingcloudapis.com"),
            soap_url: Some(format!("https://{subdomain}.soap.marketingcloudapis.com/Service.asmx")),
            rest_url: Some(format!("https://{subdomain}.rest.marketingcloudapis.com")),
        }
    }
}

impl SourceConfig {
    /// Load configuration from a JSON or YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&contents)?,
            _ => serde_json::from_str(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::missing_field("client_id"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(Error::missing_field("client_secret"));
        }
        if self.tenant_subdomain.is_none() && self.auth_url.is_none() {
            return Err(Error::missing_field("tenant_subdomain"));
        }
        if parse_datetime(&self.start_date).is_none() {
            return Err(Error::invalid_value(
                "start_date",
                format!("'{}' is not an ISO-8601 timestamp", self.start_date),
            ));
        }
        if self.date_window == 0 {
            return Err(Error::invalid_value("date_window", "must be at least 1 day"));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_value("batch_size", "must be positive"));
        }
        if self.max_retries == 0 {
            return Err(Error::invalid_value("max_retries", "must be at least 1"));
        }
        self.endpoints()?;
        Ok(())
    }

    /// Start date as a timestamp
    pub fn start_date(&self) -> Result<DateTime<Utc>> {
        parse_datetime(&self.start_date).ok_or_else(|| {
            Error::invalid_value("start_date", format!("'{}' is not a timestamp", self.start_date))
        })
    }

    /// Per-call timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Incremental window size
    pub fn date_window(&self) -> ChronoDuration {
        ChronoDuration::days(i64::from(self.date_window))
    }

    /// Retry policy for remote calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }

    /// Resolve endpoints: explicit URLs win over tenant-derived ones
    pub fn endpoints(&self) -> Result<Endpoints> {
        let derived = self.tenant_subdomain.as_deref().map(Endpoints::for_tenant);

        let check = |field: &str, value: String| -> Result<String> {
            Url::parse(&value)
                .map_err(|e| Error::invalid_value(field, format!("'{value}': {e}")))?;
            Ok(value.trim_end_matches('/').to_string())
        };
        let pick = |explicit: &Option<String>, derived: Option<String>, field: &str| {
            explicit
                .clone()
                .or(derived)
                .map(|value| check(field, value))
                .transpose()
        };

        let auth_url = pick(
            &self.auth_url,
            derived.as_ref().map(|d| d.auth_url.clone()),
            "auth_url",
        )?
        .ok_or_else(|| Error::missing_field("auth_url"))?;

        Ok(Endpoints {
            auth_url,
            soap_url: pick(&self.soap_url, derived.as_ref().and_then(|d| d.soap_url.clone()), "soap_url")?,
            rest_url: pick(&self.rest_url, derived.as_ref().and_then(|d| d.rest_url.clone()), "rest_url")?,
        })
    }

    /// Credentials handed to the token provider
    pub fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            account_id: self.account_id.clone(),
            auth_url: self.endpoints()?.auth_url,
        })
    }

    /// Auth strategies in the order they should be attempted
    pub fn auth_strategies(&self) -> Vec<AuthStrategy> {
        if self.use_legacy_auth {
            vec![AuthStrategy::LegacyRequestToken, AuthStrategy::ClientCredentials]
        } else {
            vec![AuthStrategy::ClientCredentials, AuthStrategy::LegacyRequestToken]
        }
    }
}
