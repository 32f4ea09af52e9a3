//! JSON fetcher for the namespace and items services.
//!
//! Each lookup is a single GET whose body is parsed either as one JSON object
//! or as an array of objects. Transport failures, non-success statuses, and
//! malformed bodies all surface as an [`ItemEnrichError`]; callers decide
//! whether that is fatal.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use itemenrich_shared::{ItemEnrichError, JsonObject, Result};

/// User-Agent string for lookup requests.
const USER_AGENT: &str = concat!("itemenrich/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper that decodes JSON payloads.
#[derive(Debug, Clone)]
pub struct JsonFetcher {
    client: Client,
}

impl JsonFetcher {
    /// Create a fetcher with transport defaults.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ItemEnrichError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// GET `url` and decode the body as a single JSON object.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_object(&self, url: &str) -> Result<JsonObject> {
        self.fetch_json(url).await
    }

    /// GET `url` and decode the body as a JSON array of objects.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_list(&self, url: &str) -> Result<Vec<JsonObject>> {
        self.fetch_json(url).await
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ItemEnrichError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ItemEnrichError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ItemEnrichError::Network(format!("{url}: failed to read body: {e}")))?;

        debug!(bytes = body.len(), "response received");

        serde_json::from_slice(&body)
            .map_err(|e| ItemEnrichError::parse(format!("{url}: unexpected JSON payload: {e}")))
    }
}
