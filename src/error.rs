//! Error taxonomy.
//!
//! Storage read problems never escape [`crate::activity::ActivityLog::load`];
//! they are logged and the log falls back to its seed list. Everything else is
//! surfaced to the caller, which decides whether to degrade or abort.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or writing the persisted history file.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to read history at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history at {path} is not a JSON array of strings: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write history to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures from the language-model call.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned an empty completion")]
    EmptyResponse,
}

/// Failures delivering a message to the chat bot.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("delivery timed out after {0}s")]
    Timeout(u64),

    #[error("delivery request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("delivery rejected with HTTP {status}: {description}")]
    Rejected { status: u16, description: String },
}

/// Invalid or incomplete configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required credential {0} (set it in the environment or config file)")]
    MissingCredential(&'static str),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
