//! Vector-store publishing of cost records.
//!
//! Records are turned into [`VectorItem`]s, embedded by an
//! [`EmbeddingGenerator`] and upserted in fixed-size batches by
//! [`UpsertPipeline`].

pub mod embeddings;
pub mod pipeline;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{ExplorerError, Result};

pub use embeddings::{attach_embeddings, EmbeddingGenerator, OpenAiEmbeddings};
pub use pipeline::{UpsertPipeline, BATCH_SIZE};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One vector to upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorItem {
    pub id: String,
    /// Text the embedding was generated from. Not sent to the store.
    #[serde(skip)]
    pub text: String,
    /// Sent as `values`. `None` until embeddings are attached.
    #[serde(rename = "values", skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub metadata: BTreeMap<String, String>,
}

impl VectorItem {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding: None,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Stable id for a piece of text: its hex SHA-1.
#[must_use]
pub fn content_id(text: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// A store that accepts one batch per call.
///
/// A failed call must not have applied any item of the batch the caller can
/// rely on; earlier successful calls stay applied.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert_batch(&self, items: &[VectorItem]) -> Result<()>;
}

#[derive(Serialize)]
struct UpsertBody<'a> {
    vectors: &'a [VectorItem],
}

/// Pinecone index data-plane client.
#[derive(Debug, Clone)]
pub struct Pinecone {
    client: Client,
    base_url: String,
    api_key: String,
}

impl Pinecone {
    /// Create a client for an index host such as `https://idx-abc.svc.pinecone.io`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let api_key = api_key.into();
        if base_url.is_empty() {
            return Err(ExplorerError::Config("Pinecone index URL is required".into()));
        }
        if api_key.is_empty() {
            return Err(ExplorerError::Config("Pinecone API key is required".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ExplorerError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl VectorStore for Pinecone {
    #[instrument(skip(self, items), fields(store = "pinecone", batch = items.len()))]
    async fn upsert_batch(&self, items: &[VectorItem]) -> Result<()> {
        let url = format!("{}/vectors/upsert", self.base_url);
        debug!(url = %url, "Upserting vectors");

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(&UpsertBody { vectors: items })
            .send()
            .await
            .map_err(|e| ExplorerError::Upsert {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
                confirmed: 0,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        warn!(status = %status, "Vector upsert rejected");
        Err(ExplorerError::Upsert {
            status: Some(status.as_u16()),
            message,
            confirmed: 0,
        })
    }
}
