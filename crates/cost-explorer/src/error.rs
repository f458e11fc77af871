//! Error types shared across the explorer.

use thiserror::Error;

use crate::output::OutputFormat;
use crate::providers::ProviderError;

/// Errors raised while querying, flattening and publishing cost data.
#[derive(Error, Debug)]
pub enum ExplorerError {
    /// Caller-supplied input is invalid.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The billing provider call failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A provider amount was not a plain decimal number.
    #[error("Parse error: {value:?} is not a decimal amount")]
    Parse { value: String },

    /// The embedding generator returned a different number of vectors than texts sent.
    #[error("Embedding alignment error: expected {expected} vectors, got {actual}")]
    EmbeddingAlignment { expected: usize, actual: usize },

    /// The embedding response's `index` fields are not a permutation of the inputs.
    #[error("Embedding alignment error: vector at position {position} reports input index {index}")]
    EmbeddingOrder { position: usize, index: usize },

    /// The embedding generator itself failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A vector-store batch failed. `confirmed` counts items upserted by earlier batches.
    #[error("Upsert error{}: {message} ({confirmed} items confirmed before failure)", status_suffix(.status))]
    Upsert {
        status: Option<u16>,
        message: String,
        confirmed: usize,
    },

    /// Unknown or malformed time-range preset.
    #[error("Preset error: {0}")]
    Preset(String),

    /// Missing or invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An output sink could not write its rendering.
    #[error("{sink} output failed: {source}")]
    Render {
        sink: OutputFormat,
        #[source]
        source: std::io::Error,
    },
}

impl ExplorerError {
    /// Number of items the vector store accepted before an upsert failure.
    #[must_use]
    pub fn confirmed_upserts(&self) -> Option<usize> {
        match self {
            Self::Upsert { confirmed, .. } => Some(*confirmed),
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
