use serde::{Deserialize, Serialize};

use super::config_error::ConfigError;
use super::stream_config::{DEFAULT_DETECT_EVERY, DEFAULT_SIMILARITY_THRESHOLD};

/// Per-stream record kept by the configuration store.
///
/// The JSON shape is shared by the file layout, the HTTP API, and the
/// processor's resolver. Optional outputs serialize as `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredStreamConfig {
    pub stream_key: String,
    #[serde(default)]
    pub output_rtmp: Option<String>,
    #[serde(default)]
    pub output_hls_dir: Option<String>,
    #[serde(default = "default_detect_every")]
    pub detect_every: usize,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_detect_every() -> usize {
    DEFAULT_DETECT_EVERY
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

impl StoredStreamConfig {
    pub fn new(stream_key: impl Into<String>) -> Self {
        Self {
            stream_key: stream_key.into(),
            output_rtmp: None,
            output_hls_dir: None,
            detect_every: DEFAULT_DETECT_EVERY,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Checks the run parameters a processor would take from this record.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_detect_every(self.detect_every)?;
        validate_threshold(self.similarity_threshold)?;
        Ok(())
    }
}

pub fn validate_detect_every(n: usize) -> Result<usize, ConfigError> {
    if n == 0 {
        return Err(ConfigError::InvalidDetectEvery(n));
    }
    Ok(n)
}

pub fn validate_threshold(t: f64) -> Result<f64, ConfigError> {
    if !(0.0..=1.0).contains(&t) {
        return Err(ConfigError::InvalidThreshold(t));
    }
    Ok(t)
}

/// Keeps only ASCII alphanumerics, `_` and `-`, so a key can never name a
/// path outside the store directory.
pub fn sanitize_stream_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
