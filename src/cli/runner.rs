//! CLI runner - executes commands

use crate::catalog::ConfiguredCatalog;
use crate::cli::commands::{Cli, Commands};
use crate::config::SourceConfig;
use crate::discovery::StreamCatalog;
use crate::engine::SyncEngine;
use crate::error::{Error, Result};
use crate::sink::JsonLinesSink;
use crate::state::{StateManager, SyncState};
use crate::streams::SyncSettings;
use crate::transport::HttpTransport;
use serde_json::json;
use tracing::{error, info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command.
    ///
    /// `Ok(false)` means the command ran but did not fully succeed: a
    /// failed connection check or streams that failed during sync.
    pub async fn run(&self) -> Result<bool> {
        let config = self.load_config()?;
        let transport = HttpTransport::from_config(&config)?;
        let engine = SyncEngine::new(&transport, SyncSettings::from_config(&config)?);

        match self.cli.command {
            Commands::Check => Ok(Self::check(&engine).await),
            Commands::Discover => Self::discover(&engine).await.map(|()| true),
            Commands::Sync => self.sync(&engine).await,
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<SourceConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use --config)"))?;
        SourceConfig::from_file(path)
    }

    /// Load the input state
    fn load_state(&self) -> Result<SyncState> {
        match &self.cli.state {
            Some(path) => StateManager::new(path).load(),
            None => Ok(SyncState::new()),
        }
    }

    /// Load the catalog, or select every known stream
    fn load_catalog(&self) -> Result<ConfiguredCatalog> {
        match &self.cli.catalog {
            Some(path) => ConfiguredCatalog::from_file(path),
            None => {
                warn!("No catalog given, syncing every known stream");
                Ok(ConfiguredCatalog::select_all(&StreamCatalog::known()?))
            }
        }
    }

    /// Check connection
    async fn check(engine: &SyncEngine<'_>) -> bool {
        let (status, message, ok) = match engine.check().await {
            Ok(()) => ("SUCCEEDED", "Connection successful".to_string(), true),
            Err(e) => ("FAILED", format!("Connection failed: {e}"), false),
        };
        println!(
            "{}",
            json!({"type": "CONNECTION_STATUS", "connectionStatus": {"status": status, "message": message}})
        );
        ok
    }

    /// Discover streams
    async fn discover(engine: &SyncEngine<'_>) -> Result<()> {
        let catalog = engine.discover().await?;
        let configured = ConfiguredCatalog::from_streams(&catalog);
        println!("{}", serde_json::to_string_pretty(&configured)?);
        info!(streams = catalog.len(), "Discovery finished");
        Ok(())
    }

    /// Sync the selected streams
    async fn sync(&self, engine: &SyncEngine<'_>) -> Result<bool> {
        let selection = self.load_catalog()?;
        let mut state = self.load_state()?;
        let mut sink = JsonLinesSink::stdout();

        let outcome = engine.sync_selected(&selection, &mut state, &mut sink).await;

        // progress made before an abort is still worth keeping
        if let Some(path) = &self.cli.state_out {
            StateManager::new(path).save(&state).await?;
        }

        let report = outcome?;
        for failure in &report.failures {
            error!(stream = %failure.stream, cause = %failure.cause, "Stream failed");
        }
        Ok(report.is_success())
    }
}
