//! Embedding generation with an enforced positional alignment check.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{content_id, VectorItem};
use crate::error::{ExplorerError, Result};

/// Texts sent per embedding call.
pub const EMBEDDING_CHUNK: usize = 25;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Turns texts into vectors. `result[i]` must belong to `texts[i]`.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// OpenAI-compatible `/embeddings` client.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddings {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ExplorerError::Config(
                "OpenAI API key is required for embeddings".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ExplorerError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }
}

#[async_trait]
impl EmbeddingGenerator for OpenAiEmbeddings {
    #[instrument(skip(self, texts), fields(model = %self.model, texts = texts.len()))]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        debug!(url = %url, "Requesting embeddings");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| ExplorerError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExplorerError::Embedding(format!("{status}: {body}")));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ExplorerError::Embedding(format!("invalid response: {e}")))?;

        // The API reports each vector's input index; honour it when present.
        if parsed.data.iter().all(|d| d.index.is_some()) {
            parsed.data.sort_by_key(|d| d.index);
            for (position, d) in parsed.data.iter().enumerate() {
                if let Some(index) = d.index.filter(|&index| index != position) {
                    return Err(ExplorerError::EmbeddingOrder { position, index });
                }
            }
        }
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Embed every item's text and store the vectors on the items.
///
/// Texts go out in chunks of [`EMBEDDING_CHUNK`]. Each chunk must come back
/// with exactly one vector per text, otherwise the call fails with
/// [`ExplorerError::EmbeddingAlignment`] and no item is modified. Items with
/// an empty id get [`content_id`] of their text alongside the vector.
pub async fn attach_embeddings(
    generator: &dyn EmbeddingGenerator,
    items: &mut [VectorItem],
) -> Result<()> {
    let mut vectors = Vec::with_capacity(items.len());

    for chunk in items.chunks(EMBEDDING_CHUNK) {
        let texts: Vec<String> = chunk.iter().map(|i| i.text.clone()).collect();
        let embedded = generator.embed(&texts).await?;
        if embedded.len() != texts.len() {
            return Err(ExplorerError::EmbeddingAlignment {
                expected: texts.len(),
                actual: embedded.len(),
            });
        }
        vectors.extend(embedded);
    }

    for (item, vector) in items.iter_mut().zip(vectors) {
        if item.id.is_empty() {
            item.id = content_id(&item.text);
        }
        item.embedding = Some(vector);
    }
    debug!(items = items.len(), "Attached embeddings");
    Ok(())
}
