use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarSyncError {
    #[error("GitHub API returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),

    #[error("Invalid descriptor {}: {reason}", .path.display())]
    InvalidDescriptor { path: PathBuf, reason: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Environment error: {0}")]
    EnvError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),
}

pub type Result<T> = std::result::Result<T, StarSyncError>;
