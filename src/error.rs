//! Error types for mc-extract
//!
//! This module defines the error hierarchy for the whole extractor.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into three groups that drive the engine's behaviour:
//! - transient transport faults, retried locally by the HTTP layer
//! - stream-recoverable remote errors, which fail one stream and let the run continue
//! - fatal errors, which abort the whole run

use thiserror::Error;

/// The main error type for mc-extract
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ============================================================================
    // Transport Errors (retryable until the retry budget is spent)
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport fault surfaced after the retry budget was exhausted
    #[error("Marketing Cloud API call failed after {attempts} attempts: {message}")]
    SoapApi { message: String, attempts: u32 },

    // ============================================================================
    // Remote Logical Errors
    // ============================================================================
    #[error("Incompatible field selection for '{object_type}': {message}")]
    IncompatibleFieldSelection { object_type: String, message: String },

    #[error("Insufficient permissions for '{object_type}': {message}")]
    PermissionFailure { object_type: String, message: String },

    #[error("Marketing Cloud error: {message}")]
    MarketingCloud { message: String },

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Record does not match schema at '{field}': {message}")]
    SchemaMismatch { field: String, message: String },

    // ============================================================================
    // State / Catalog Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    #[error("Catalog error: {message}")]
    Catalog { message: String },

    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound { stream: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a generic remote logical error
    pub fn remote(message: impl Into<String>) -> Self {
        Self::MarketingCloud {
            message: message.into(),
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a catalog error
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Check if this error is a transient transport fault worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Error::Timeout { .. } | Error::MalformedResponse { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Check if this error only fails the stream that raised it
    pub fn is_stream_recoverable(&self) -> bool {
        matches!(
            self,
            Error::IncompatibleFieldSelection { .. }
                | Error::PermissionFailure { .. }
                | Error::MarketingCloud { .. }
        )
    }

    /// Check if this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        !self.is_stream_recoverable()
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for mc-extract
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }
}
