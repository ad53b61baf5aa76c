use super::config_error::ConfigStoreError;
use super::stored_stream_config::StoredStreamConfig;

/// Key-addressed store of per-stream configuration records.
pub trait ConfigStore: Send + Sync {
    /// Returns `Ok(None)` when no record exists for the key.
    fn load(&self, stream_key: &str) -> Result<Option<StoredStreamConfig>, ConfigStoreError>;

    /// Stores or overwrites the record under its `stream_key`.
    fn save(&self, record: &StoredStreamConfig) -> Result<(), ConfigStoreError>;

    /// Returns `Ok(false)` when there was nothing to delete.
    fn delete(&self, stream_key: &str) -> Result<bool, ConfigStoreError>;
}
