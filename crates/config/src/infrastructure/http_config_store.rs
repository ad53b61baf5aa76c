use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::domain::config_error::ConfigStoreError;
use crate::domain::config_store::ConfigStore;
use crate::domain::stored_stream_config::StoredStreamConfig;

pub const API_PATH: &str = "/api/stream-config";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Talks to the configuration service over its JSON API.
///
/// Uses the blocking client: the processor resolves its configuration
/// once, before the frame loop starts.
pub struct HttpConfigStore {
    client: Client,
    endpoint: String,
}

impl HttpConfigStore {
    pub fn new(base_url: &str) -> Result<Self, ConfigStoreError> {
        let endpoint = endpoint_url(base_url);
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ConfigStoreError::Http {
                url: endpoint.clone(),
                source,
            })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn http_error(&self, source: reqwest::Error) -> ConfigStoreError {
        ConfigStoreError::Http {
            url: self.endpoint.clone(),
            source,
        }
    }

    fn status_error(&self, status: StatusCode) -> ConfigStoreError {
        ConfigStoreError::Status {
            url: self.endpoint.clone(),
            status: status.as_u16(),
        }
    }
}

impl ConfigStore for HttpConfigStore {
    fn load(&self, stream_key: &str) -> Result<Option<StoredStreamConfig>, ConfigStoreError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("stream_key", stream_key)])
            .send()
            .map_err(|e| self.http_error(e))?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().map_err(|e| self.http_error(e))?;
                serde_json::from_str(&body)
                    .map(Some)
                    .map_err(ConfigStoreError::Json)
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(self.status_error(status)),
        }
    }

    fn save(&self, record: &StoredStreamConfig) -> Result<(), ConfigStoreError> {
        let body = serde_json::to_string(record).map_err(ConfigStoreError::Json)?;
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| self.http_error(e))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(self.status_error(status)),
        }
    }

    fn delete(&self, stream_key: &str) -> Result<bool, ConfigStoreError> {
        let response = self
            .client
            .delete(&self.endpoint)
            .query(&[("stream_key", stream_key)])
            .send()
            .map_err(|e| self.http_error(e))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(self.status_error(status)),
        }
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!("{}{API_PATH}", base_url.trim_end_matches('/'))
}
