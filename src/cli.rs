use crate::error::{Result, StarSyncError};
use crate::github::GRAPHQL_URL;
use crate::sync::{SyncConfig, MAX_BATCH_SIZE};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "github-star-sync")]
#[command(about = "Refreshes the GitHub star counts stored in each project's project.json")]
#[command(version)]
pub struct Cli {
    /// Catalog root holding one folder per project
    #[arg(long, env = "STAR_SYNC_ROOT", default_value = "projects")]
    pub root: PathBuf,

    /// GitHub token used as the bearer credential
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub GraphQL endpoint
    #[arg(long, env = "GITHUB_GRAPHQL_URL", default_value = GRAPHQL_URL)]
    pub api_url: String,

    /// Repositories per GraphQL request (at most 50)
    #[arg(long, default_value_t = MAX_BATCH_SIZE)]
    pub batch_size: usize,

    /// Pause between batches in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Report changes without rewriting any file
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Validate the arguments and extract the bearer credential.
    pub fn into_config(self) -> Result<(SyncConfig, String)> {
        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| StarSyncError::AuthError("GITHUB_TOKEN is not set".to_string()))?;

        let api_url = Url::parse(&self.api_url).map_err(|e| {
            StarSyncError::EnvError(format!("Invalid --api-url {}: {}", self.api_url, e))
        })?;

        let config = SyncConfig {
            root: self.root,
            api_url,
            batch_size: self.batch_size.clamp(1, MAX_BATCH_SIZE),
            batch_delay: Duration::from_millis(self.delay_ms),
            dry_run: self.dry_run,
        };

        Ok((config, token))
    }
}
