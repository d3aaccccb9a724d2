// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # mc-extract
//!
//! Incremental extraction from an ExactTarget-style marketing cloud.
//!
//! Objects are read over the SOAP `Retrieve` API (and a few REST
//! collections), reshaped to a declared JSON schema and written as a
//! stream of schema, record and state messages. Incremental streams
//! resume from a persisted bookmark and walk forward in date windows.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mc_extract::{
//!     catalog::ConfiguredCatalog, config::SourceConfig, engine::SyncEngine,
//!     sink::JsonLinesSink, state::SyncState, streams::SyncSettings,
//!     transport::HttpTransport, Result,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SourceConfig::from_file("config.json")?;
//!     let transport = HttpTransport::from_config(&config)?;
//!     let engine = SyncEngine::new(&transport, SyncSettings::from_config(&config)?);
//!
//!     let catalog = engine.discover().await?;
//!     let selection = ConfiguredCatalog::select_all(&catalog);
//!     let mut state = SyncState::new();
//!     let report = engine
//!         .sync(&catalog, &selection, &mut state, &mut JsonLinesSink::stdout())
//!         .await?;
//!     assert!(report.is_success());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          SyncEngine                             │
//! │  check()    discover() → StreamCatalog    sync() → SyncReport   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │ Transport │  Pagination   │  Streams  │    Sink     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ v2 token │ SOAP      │ Retrieve      │ Windows   │ JSON lines  │
//! │ v1 token │ REST      │ REST pages    │ Transform │ Memory      │
//! │ Refresh  │ Retry     │               │ Bookmarks │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Source configuration
pub mod config;

/// Token acquisition and caching
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// SOAP envelopes, filters and responses
pub mod soap;

/// Remote access behind a trait
pub mod transport;

/// Page-by-page record cursors
pub mod pagination;

/// Bookmarks, date windows and state files
pub mod state;

/// JSON schema model and validation
pub mod schema;

/// Record reshaping and coercion
pub mod transform;

/// Stream descriptors and the per-stream sync
pub mod streams;

/// Data extension discovery and the stream catalog
pub mod discovery;

/// Catalog metadata and selection
pub mod catalog;

/// Message output
pub mod sink;

/// Sync orchestration
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::SourceConfig;
pub use engine::{SyncEngine, SyncReport};
pub use state::SyncState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
