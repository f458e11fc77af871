//! Batched, fail-fast upserts into a [`VectorStore`].

use tracing::{debug, info, instrument, warn};

use super::{VectorItem, VectorStore};
use crate::error::{ExplorerError, Result};

/// Maximum items per upsert call.
pub const BATCH_SIZE: usize = 25;

/// Sends items to a store in order, one batch at a time.
pub struct UpsertPipeline<'a> {
    store: &'a dyn VectorStore,
}

impl<'a> UpsertPipeline<'a> {
    #[must_use]
    pub fn new(store: &'a dyn VectorStore) -> Self {
        Self { store }
    }

    /// Upsert `items` in contiguous batches of at most [`BATCH_SIZE`].
    ///
    /// Batches are sent sequentially and the first failure stops the run.
    /// Batches sent before the failure are not rolled back: the returned
    /// [`ExplorerError::Upsert`] carries how many items were confirmed, and
    /// those stay in the store. On success the total item count is returned.
    ///
    /// Every item must already carry an embedding; otherwise nothing is sent.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn upsert(&self, items: &[VectorItem]) -> Result<usize> {
        if let Some(missing) = items.iter().find(|i| i.embedding.is_none()) {
            return Err(ExplorerError::Validation(format!(
                "vector item {} has no embedding",
                missing.id
            )));
        }

        let mut confirmed = 0;
        for (index, batch) in items.chunks(BATCH_SIZE).enumerate() {
            debug!(batch = index, size = batch.len(), "Sending upsert batch");

            if let Err(err) = self.store.upsert_batch(batch).await {
                warn!(batch = index, confirmed, error = %err, "Upsert batch failed");
                return Err(match err {
                    ExplorerError::Upsert {
                        status, message, ..
                    } => ExplorerError::Upsert {
                        status,
                        message,
                        confirmed,
                    },
                    other => ExplorerError::Upsert {
                        status: None,
                        message: other.to_string(),
                        confirmed,
                    },
                });
            }
            confirmed += batch.len();
        }

        info!(upserted = confirmed, "Vector upsert complete");
        Ok(confirmed)
    }
}
