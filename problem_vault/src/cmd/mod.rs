pub mod capture;
pub mod config;
pub mod list;
pub mod ping;
pub mod server;
pub mod show;
pub mod stats;

use anyhow::{Context, Result};
use clap::Args;
use problem_vault_libs::client::{ConfigFile, SyncClient};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ConfigFileArgs {
    /// Client configuration file. Defaults to `<config dir>/problem_vault/client.json`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl ConfigFileArgs {
    pub fn config_file(&self) -> Result<ConfigFile> {
        match &self.config {
            Some(path) => Ok(ConfigFile::new(path)),
            None => ConfigFile::at_default_location().with_context(|| {
                let message = "couldn't locate the client configuration. pass --config explicitly.";
                tracing::error!(message);
                format!("{}", message)
            }),
        }
    }
}

/// Options shared by the commands that talk to the ingest API.
#[derive(Debug, Args)]
pub struct ClientArgs {
    #[command(flatten)]
    file: ConfigFileArgs,
    /// Backend base URL for this run only, overriding the stored one.
    #[arg(long, value_name = "URL")]
    backend: Option<String>,
}

impl ClientArgs {
    pub fn client(&self) -> Result<SyncClient> {
        let file = self.file.config_file()?;
        let config = file
            .load()
            .with_context(|| format!("failed to load {}", file.path().display()))?
            .merge(self.backend.as_deref(), None);

        tracing::debug!("using backend {}", config.base_url());
        SyncClient::new(config).with_context(|| {
            let message = "couldn't create the API client. check the configured base URL.";
            tracing::error!(message);
            format!("{}", message)
        })
    }
}
