use super::config_error::ConfigError;
use super::config_store::ConfigStore;
use super::stored_stream_config::{validate_detect_every, validate_threshold, StoredStreamConfig};
use super::stream_config::{
    ExplicitParams, OutputSink, StreamConfig, DEFAULT_DETECT_EVERY, DEFAULT_SIMILARITY_THRESHOLD,
};

/// Merges explicit parameters with the stored record for `stream_key`.
///
/// Precedence per field: explicit > stored > built-in default. The output
/// sink is a single field: an explicit sink of either kind replaces the
/// stored one. A store failure never aborts resolution; it is logged and
/// the record is treated as absent. Out-of-range stored values are logged
/// and replaced by the default; out-of-range explicit values are errors.
pub fn resolve(
    explicit: ExplicitParams,
    store: Option<&dyn ConfigStore>,
) -> Result<StreamConfig, ConfigError> {
    let stored = match (explicit.stream_key.as_deref(), store) {
        (Some(key), Some(store)) if !key.is_empty() => load_stored(store, key),
        _ => None,
    };

    let input = explicit.input.ok_or(ConfigError::MissingInput)?;

    let output = match explicit.output {
        Some(output) => output,
        None => match stored.as_ref() {
            Some(fields) => stored_output(&fields.record)?,
            None => None,
        }
        .ok_or(ConfigError::MissingOutput)?,
    };

    // Explicit values are checked strictly; bad stored values were already
    // dropped by `load_stored`.
    let detect_every = match explicit.detect_every {
        Some(n) => validate_detect_every(n)?,
        None => stored
            .as_ref()
            .and_then(|r| r.detect_every)
            .unwrap_or(DEFAULT_DETECT_EVERY),
    };

    let similarity_threshold = match explicit.similarity_threshold {
        Some(t) => validate_threshold(t)?,
        None => stored
            .as_ref()
            .and_then(|r| r.similarity_threshold)
            .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
    };

    Ok(StreamConfig {
        input,
        output,
        detect_every,
        similarity_threshold,
    })
}

/// Stored fields that survived validation. `None` means "use the default".
struct StoredFields {
    record: StoredStreamConfig,
    detect_every: Option<usize>,
    similarity_threshold: Option<f64>,
}

fn load_stored(store: &dyn ConfigStore, key: &str) -> Option<StoredFields> {
    match store.load(key) {
        Ok(Some(record)) => {
            log::info!("Loaded configuration for stream key: {key}");
            let detect_every = validate_detect_every(record.detect_every)
                .map_err(|e| log::warn!("Ignoring stored value for {key}: {e}"))
                .ok();
            let similarity_threshold = validate_threshold(record.similarity_threshold)
                .map_err(|e| log::warn!("Ignoring stored value for {key}: {e}"))
                .ok();
            Some(StoredFields {
                record,
                detect_every,
                similarity_threshold,
            })
        }
        Ok(None) => {
            log::debug!("No stored configuration for stream key: {key}");
            None
        }
        Err(e) => {
            log::warn!("Ignoring stored configuration for stream key {key}: {e}");
            None
        }
    }
}

fn stored_output(record: &StoredStreamConfig) -> Result<Option<OutputSink>, ConfigError> {
    let rtmp = record.output_rtmp.as_deref().filter(|s| !s.is_empty());
    let hls = record.output_hls_dir.as_deref().filter(|s| !s.is_empty());
    match (rtmp, hls) {
        (Some(_), Some(_)) => Err(ConfigError::AmbiguousOutput(record.stream_key.clone())),
        (Some(url), None) => Ok(Some(OutputSink::Rtmp(url.to_string()))),
        (None, Some(dir)) => Ok(Some(OutputSink::Hls(dir.into()))),
        (None, None) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use approx::assert_relative_eq;

    use super::*;
    use crate::domain::config_error::ConfigStoreError;
    use crate::domain::stream_config::InputSource;

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<HashMap<String, StoredStreamConfig>>,
    }

    impl MemoryStore {
        fn with(record: StoredStreamConfig) -> Self {
            let store = Self::default();
            store.save(&record).unwrap();
            store
        }
    }

    impl ConfigStore for MemoryStore {
        fn load(&self, key: &str) -> Result<Option<StoredStreamConfig>, ConfigStoreError> {
            Ok(self.records.lock().unwrap().get(key).cloned())
        }

        fn save(&self, record: &StoredStreamConfig) -> Result<(), ConfigStoreError> {
            self.records
                .lock()
                .unwrap()
                .insert(record.stream_key.clone(), record.clone());
            Ok(())
        }

        fn delete(&self, key: &str) -> Result<bool, ConfigStoreError> {
            Ok(self.records.lock().unwrap().remove(key).is_some())
        }
    }

    struct BrokenStore;

    impl ConfigStore for BrokenStore {
        fn load(&self, key: &str) -> Result<Option<StoredStreamConfig>, ConfigStoreError> {
            Err(ConfigStoreError::InvalidKey(key.to_string()))
        }

        fn save(&self, _record: &StoredStreamConfig) -> Result<(), ConfigStoreError> {
            unreachable!()
        }

        fn delete(&self, _key: &str) -> Result<bool, ConfigStoreError> {
            unreachable!()
        }
    }

    fn file_input() -> Option<InputSource> {
        Some(InputSource::File(PathBuf::from("/tmp/in.mp4")))
    }

    fn explicit(key: Option<&str>) -> ExplicitParams {
        ExplicitParams {
            stream_key: key.map(str::to_string),
            input: file_input(),
            ..Default::default()
        }
    }

    fn stored_hls(key: &str) -> StoredStreamConfig {
        StoredStreamConfig {
            output_hls_dir: Some("/srv/hls".to_string()),
            detect_every: 5,
            similarity_threshold: 0.45,
            ..StoredStreamConfig::new(key)
        }
    }

    #[test]
    fn test_defaults_apply_without_store() {
        let mut params = explicit(None);
        params.output = Some(OutputSink::Rtmp("rtmp://host/out".to_string()));

        let config = resolve(params, None).unwrap();

        assert_eq!(config.detect_every, 1);
        assert_relative_eq!(config.similarity_threshold, 0.3);
    }

    #[test]
    fn test_stored_values_fill_unset_fields() {
        let store = MemoryStore::with(stored_hls("cam1"));

        let config = resolve(explicit(Some("cam1")), Some(&store)).unwrap();

        assert_eq!(config.output, OutputSink::Hls(PathBuf::from("/srv/hls")));
        assert_eq!(config.detect_every, 5);
        assert_relative_eq!(config.similarity_threshold, 0.45);
    }

    #[test]
    fn test_explicit_values_beat_stored_even_when_equal_to_default() {
        let store = MemoryStore::with(stored_hls("cam1"));
        let mut params = explicit(Some("cam1"));
        params.detect_every = Some(1);
        params.similarity_threshold = Some(0.3);

        let config = resolve(params, Some(&store)).unwrap();

        assert_eq!(config.detect_every, 1);
        assert_relative_eq!(config.similarity_threshold, 0.3);
    }

    #[test]
    fn test_explicit_sink_replaces_stored_sink_of_other_kind() {
        let store = MemoryStore::with(stored_hls("cam1"));
        let mut params = explicit(Some("cam1"));
        params.output = Some(OutputSink::Rtmp("rtmp://host/out".to_string()));

        let config = resolve(params, Some(&store)).unwrap();

        assert_eq!(config.output, OutputSink::Rtmp("rtmp://host/out".to_string()));
    }

    #[test]
    fn test_missing_record_falls_back_to_defaults() {
        let store = MemoryStore::default();
        let mut params = explicit(Some("unknown"));
        params.output = Some(OutputSink::Hls(PathBuf::from("/tmp/hls")));

        let config = resolve(params, Some(&store)).unwrap();

        assert_eq!(config.detect_every, 1);
    }

    #[test]
    fn test_store_failure_is_not_fatal() {
        let mut params = explicit(Some("cam1"));
        params.output = Some(OutputSink::Hls(PathBuf::from("/tmp/hls")));

        let config = resolve(params, Some(&BrokenStore)).unwrap();

        assert_eq!(config.detect_every, 1);
    }

    #[test]
    fn test_missing_input_fails() {
        let params = ExplicitParams {
            output: Some(OutputSink::Hls(PathBuf::from("/tmp/hls"))),
            ..Default::default()
        };
        assert_eq!(resolve(params, None), Err(ConfigError::MissingInput));
    }

    #[test]
    fn test_missing_output_fails() {
        assert_eq!(resolve(explicit(None), None), Err(ConfigError::MissingOutput));
    }

    #[test]
    fn test_empty_stored_outputs_count_as_missing() {
        let record = StoredStreamConfig {
            output_rtmp: Some(String::new()),
            ..StoredStreamConfig::new("cam1")
        };
        let store = MemoryStore::with(record);

        let result = resolve(explicit(Some("cam1")), Some(&store));

        assert_eq!(result, Err(ConfigError::MissingOutput));
    }

    #[test]
    fn test_stored_record_with_both_outputs_is_ambiguous() {
        let record = StoredStreamConfig {
            output_rtmp: Some("rtmp://host/out".to_string()),
            ..stored_hls("cam1")
        };
        let store = MemoryStore::with(record);

        let result = resolve(explicit(Some("cam1")), Some(&store));

        assert_eq!(result, Err(ConfigError::AmbiguousOutput("cam1".to_string())));
    }

    #[test]
    fn test_zero_cadence_is_rejected() {
        let mut params = explicit(None);
        params.output = Some(OutputSink::Hls(PathBuf::from("/tmp/hls")));
        params.detect_every = Some(0);

        assert_eq!(resolve(params, None), Err(ConfigError::InvalidDetectEvery(0)));
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let mut params = explicit(None);
        params.output = Some(OutputSink::Hls(PathBuf::from("/tmp/hls")));
        params.similarity_threshold = Some(1.5);

        assert_eq!(resolve(params, None), Err(ConfigError::InvalidThreshold(1.5)));
    }

    #[test]
    fn test_out_of_range_stored_values_fall_back_to_defaults() {
        let store = MemoryStore::with(StoredStreamConfig {
            detect_every: 0,
            similarity_threshold: 4.0,
            ..stored_hls("cam1")
        });

        let config = resolve(explicit(Some("cam1")), Some(&store)).unwrap();

        assert_eq!(config.output, OutputSink::Hls(PathBuf::from("/srv/hls")));
        assert_eq!(config.detect_every, 1);
        assert_relative_eq!(config.similarity_threshold, 0.3);
    }

    #[test]
    fn test_one_bad_stored_value_keeps_the_other() {
        let store = MemoryStore::with(StoredStreamConfig {
            similarity_threshold: -0.5,
            ..stored_hls("cam1")
        });

        let config = resolve(explicit(Some("cam1")), Some(&store)).unwrap();

        assert_eq!(config.detect_every, 5);
        assert_relative_eq!(config.similarity_threshold, 0.3);
    }

    #[test]
    fn test_explicit_value_overrides_bad_stored_value() {
        let store = MemoryStore::with(StoredStreamConfig {
            detect_every: 0,
            ..stored_hls("cam1")
        });
        let mut params = explicit(Some("cam1"));
        params.detect_every = Some(4);

        let config = resolve(params, Some(&store)).unwrap();

        assert_eq!(config.detect_every, 4);
    }
}
