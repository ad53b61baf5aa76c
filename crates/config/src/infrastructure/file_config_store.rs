use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::config_error::ConfigStoreError;
use crate::domain::config_store::ConfigStore;
use crate::domain::stored_stream_config::{sanitize_stream_key, StoredStreamConfig};

/// Default location shared by the processor and the config service.
pub const DEFAULT_CONFIG_DIR: &str = "/var/lib/face_stream/configs";

/// One pretty-printed JSON file per sanitized stream key.
pub struct FileConfigStore {
    dir: PathBuf,
}

impl FileConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `stream_key`, always directly inside the
    /// store directory.
    pub fn record_path(&self, stream_key: &str) -> Result<PathBuf, ConfigStoreError> {
        let safe_key = sanitize_stream_key(stream_key);
        if safe_key.is_empty() {
            return Err(ConfigStoreError::InvalidKey(stream_key.to_string()));
        }
        Ok(self.dir.join(format!("{safe_key}.json")))
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_DIR)
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self, stream_key: &str) -> Result<Option<StoredStreamConfig>, ConfigStoreError> {
        let path = self.record_path(stream_key)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ConfigStoreError::Read { path, source }),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| ConfigStoreError::Parse { path, source })
    }

    fn save(&self, record: &StoredStreamConfig) -> Result<(), ConfigStoreError> {
        let path = self.record_path(&record.stream_key)?;
        fs::create_dir_all(&self.dir).map_err(|source| ConfigStoreError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(record).map_err(ConfigStoreError::Json)?;
        fs::write(&path, json).map_err(|source| ConfigStoreError::Write { path, source })
    }

    fn delete(&self, stream_key: &str) -> Result<bool, ConfigStoreError> {
        let path = self.record_path(stream_key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ConfigStoreError::Delete { path, source }),
        }
    }
}
