//! Auth types
//!
//! Credentials, the ranked strategy list, and the cached bearer token.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Tokens are refreshed when they expire within this many seconds
pub const REFRESH_BUFFER_SECONDS: i64 = 300;

/// Client credentials for the token endpoint
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Client id
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Business unit MID (client-credentials flow only)
    pub account_id: Option<String>,
    /// Token endpoint base URL
    pub auth_url: String,
}

/// One way of obtaining a token; strategies are tried in rank order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// `POST /v2/token` with a client-credentials grant
    ClientCredentials,
    /// `POST /v1/requestToken` with `clientId`/`clientSecret`
    LegacyRequestToken,
}

impl AuthStrategy {
    /// Short name for logs and failure reasons
    pub fn name(&self) -> &'static str {
        match self {
            AuthStrategy::ClientCredentials => "client_credentials",
            AuthStrategy::LegacyRequestToken => "legacy_request_token",
        }
    }

    /// Path of the token endpoint relative to the auth base URL
    pub fn token_path(&self) -> &'static str {
        match self {
            AuthStrategy::ClientCredentials => "/v2/token",
            AuthStrategy::LegacyRequestToken => "/v1/requestToken",
        }
    }

    /// JSON body for the token request
    pub fn request_body(&self, credentials: &Credentials) -> serde_json::Value {
        match self {
            AuthStrategy::ClientCredentials => {
                let mut body = serde_json::json!({
                    "grant_type": "client_credentials",
                    "client_id": credentials.client_id,
                    "client_secret": credentials.client_secret,
                });
                if let Some(account_id) = &credentials.account_id {
                    body["account_id"] = serde_json::Value::String(account_id.clone());
                }
                body
            }
            AuthStrategy::LegacyRequestToken => serde_json::json!({
                "clientId": credentials.client_id,
                "clientSecret": credentials.client_secret,
            }),
        }
    }
}

/// Instance-specific base URLs handed back by the token endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceUrls {
    /// SOAP endpoint for this tenant
    pub soap_url: Option<String>,
    /// REST base for this tenant
    pub rest_url: Option<String>,
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: DateTime<Utc>,
    /// Instance URLs returned alongside the token
    pub instance: InstanceUrls,
}

impl CachedToken {
    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        Self {
            token,
            expires_at: Utc::now() + Duration::seconds(seconds),
            instance: InstanceUrls::default(),
        }
    }

    /// Whether the token is inside the refresh buffer at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_BUFFER_SECONDS) >= self.expires_at
    }

    /// Whether the token is inside the refresh buffer
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Token endpoint response; field names differ between the two strategies
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(default, alias = "expiresIn")]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub soap_instance_url: Option<String>,
    #[serde(default)]
    pub rest_instance_url: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_cached_token(self) -> CachedToken {
        // Tokens without an expiry are treated as short-lived
        let mut token = CachedToken::expires_in(self.access_token, self.expires_in.unwrap_or(1200));
        token.instance = InstanceUrls {
            soap_url: self
                .soap_instance_url
                .map(|u| format!("{}Service.asmx", ensure_trailing_slash(&u))),
            rest_url: self.rest_instance_url.map(|u| u.trim_end_matches('/').to_string()),
        };
        token
    }
}

fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}
