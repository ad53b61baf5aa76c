use std::path::PathBuf;

use thiserror::Error;

/// Precondition failures found while resolving run parameters.
///
/// All of these are reported before any stream resource is opened.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("either --input_rtmp or --input_file is required")]
    MissingInput,
    #[error("either --output_rtmp or --output_hls_dir is required")]
    MissingOutput,
    #[error("stored configuration for '{0}' sets both output_rtmp and output_hls_dir")]
    AmbiguousOutput(String),
    #[error("detect_every must be a positive integer, got {0}")]
    InvalidDetectEvery(usize),
    #[error("similarity_threshold must be between 0.0 and 1.0, got {0}")]
    InvalidThreshold(f64),
}

/// I/O failures of a configuration store.
#[derive(Error, Debug)]
pub enum ConfigStoreError {
    #[error("stream key '{0}' is empty after sanitization")]
    InvalidKey(String),
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to delete config {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config service request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid config record JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("config service at {url} answered {status}")]
    Status { url: String, status: u16 },
}
