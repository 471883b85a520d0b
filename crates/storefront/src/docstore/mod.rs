//! Document store client.
//!
//! Orders and user profiles live in a hosted document store reached over
//! REST. The client holds a shared [`reqwest::Client`] and the store
//! endpoint; collection-specific operations live in [`orders`] and [`users`].

pub mod orders;
pub mod users;

pub use orders::OrderStore;

use secrecy::{ExposeSecret, SecretString};

use crate::config::DocStoreConfig;

/// Errors from the document store API.
#[derive(Debug, thiserror::Error)]
pub enum DocStoreError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store returned an error response.
    #[error("document store API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The store response could not be decoded.
    #[error("document store response parse error: {0}")]
    Parse(String),

    /// The requested document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),
}

/// Client for the document store REST API.
#[derive(Clone)]
pub struct DocStoreClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    profiles: moka::future::Cache<String, crate::models::UserProfile>,
}

impl DocStoreClient {
    /// Create a new document store client.
    #[must_use]
    pub fn new(config: &DocStoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            profiles: moka::future::Cache::builder()
                .max_capacity(10_000)
                .time_to_live(std::time::Duration::from_secs(300))
                .build(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.endpoint))
            .bearer_auth(self.api_key.expose_secret())
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.endpoint))
            .bearer_auth(self.api_key.expose_secret())
    }

    fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .put(format!("{}{path}", self.endpoint))
            .bearer_auth(self.api_key.expose_secret())
    }
}

/// Decode a document store response body, mapping error statuses first.
fn decode<T: serde::de::DeserializeOwned>(status: u16, body: &str) -> Result<T, DocStoreError> {
    if status == 404 {
        return Err(DocStoreError::NotFound(body.chars().take(200).collect()));
    }
    if !(200..300).contains(&status) {
        return Err(DocStoreError::Api {
            status,
            message: body.chars().take(200).collect(),
        });
    }
    serde_json::from_str(body).map_err(|e| DocStoreError::Parse(e.to_string()))
}
