//! Explorer settings resolved once at startup.

use crate::error::{ExplorerError, Result};

/// Default Cost Explorer region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default OpenAI-compatible API base.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Immutable settings for one explorer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerConfig {
    /// AWS region used to derive the Cost Explorer endpoint.
    pub region: String,
    /// Explicit Cost Explorer endpoint; overrides the region-derived one.
    pub endpoint: Option<String>,
    /// Pinecone index host.
    pub pinecone_index_url: Option<String>,
    pub pinecone_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub embedding_model: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            pinecone_index_url: None,
            pinecone_api_key: None,
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl ExplorerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Optional Environment Variables
    /// - `AWS_REGION`: Cost Explorer region (default: us-east-1)
    /// - `COST_EXPLORER_ENDPOINT`: endpoint override
    /// - `PINECONE_INDEX_URL`, `PINECONE_API_KEY`: vector-store output
    /// - `OPENAI_API_KEY`: embeddings for vector-store output
    /// - `OPENAI_BASE_URL`: embeddings API base (default: https://api.openai.com/v1)
    /// - `EMBEDDING_MODEL`: embedding model (default: text-embedding-3-small)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source. Blank
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            region: get("AWS_REGION").unwrap_or(defaults.region),
            endpoint: get("COST_EXPLORER_ENDPOINT"),
            pinecone_index_url: get("PINECONE_INDEX_URL"),
            pinecone_api_key: get("PINECONE_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            embedding_model: get("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Pinecone URL and key, or a config error naming what is missing.
    pub fn pinecone(&self) -> Result<(&str, &str)> {
        let url = self.pinecone_index_url.as_deref().ok_or_else(|| {
            ExplorerError::Config("PINECONE_INDEX_URL is required for vector output".to_string())
        })?;
        let key = self.pinecone_api_key.as_deref().ok_or_else(|| {
            ExplorerError::Config("PINECONE_API_KEY is required for vector output".to_string())
        })?;
        Ok((url, key))
    }

    /// OpenAI key, or a config error.
    pub fn openai_key(&self) -> Result<&str> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            ExplorerError::Config("OPENAI_API_KEY is required for vector output".to_string())
        })
    }
}
