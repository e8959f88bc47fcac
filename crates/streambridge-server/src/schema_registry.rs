//! HTTP client for the Avro schema registry.
//!
//! The gateway fetches the `resource-changed-data` schema once at boot;
//! an unreachable registry or unknown subject is fatal.

use apache_avro::Schema;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaFetchError {
    #[error("schema registry request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("schema registry returned an invalid schema: {0}")]
    Parse(String),
}

/// Response shape of `GET /subjects/{subject}/versions/latest`.
#[derive(Debug, Deserialize)]
struct SchemaVersion {
    schema: String,
}

pub struct SchemaRegistryClient {
    base_url: String,
    http: reqwest::Client,
}

impl SchemaRegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Fetch and parse the latest version of `subject`.
    pub async fn latest_schema(&self, subject: &str) -> Result<Schema, SchemaFetchError> {
        let url = format!(
            "{}/subjects/{}/versions/latest",
            self.base_url.trim_end_matches('/'),
            subject
        );
        let version: SchemaVersion = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Schema::parse_str(&version.schema).map_err(|e| SchemaFetchError::Parse(e.to_string()))
    }
}
