use hubarchive_totp::totp::TotpError;
use std::path::PathBuf;
use thiserror::Error;

/// Application-level error for configuration, manifest and CLI handling.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} must be set")]
    MissingVar(&'static str),

    #[error("{name} is invalid: {reason}")]
    InvalidVar { name: &'static str, reason: String },

    #[error(transparent)]
    Totp(#[from] TotpError),

    #[error("no TOTP secret configured (set DOCKER_TOTP_SECRET or pass --secret)")]
    TotpNotConfigured,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("repository #{index} ({url}) is not a repository URL: {reason}")]
    InvalidRepositoryUrl {
        index: usize,
        url: String,
        reason: String,
    },

    #[error("failed to encode output: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("code does not match the configured secret")]
    CodeRejected,

    #[error("invalid time '{0}': expected unix seconds or RFC 3339")]
    InvalidTime(String),
}

pub type AppResult<T> = Result<T, AppError>;
