//! Authentication module
//!
//! Supports: client-credentials (`/v2/token`) and legacy (`/v1/requestToken`)
//!
//! The `TokenProvider` tries a ranked list of `AuthStrategy` values and
//! caches the resulting bearer token until it enters the refresh buffer.

mod provider;
mod types;

pub use provider::{CredentialProvider, StaticTokenProvider, TokenProvider};
pub use types::{AuthStrategy, CachedToken, Credentials, InstanceUrls, REFRESH_BUFFER_SECONDS};
