//! Vector-store sink: describe each metric in words, embed it, upsert it.

use tracing::info;

use crate::error::Result;
use crate::query::Granularity;
use crate::report::ServiceRecord;
use crate::vector::{
    attach_embeddings, EmbeddingGenerator, UpsertPipeline, VectorItem, VectorStore,
};

/// Collaborators the vector sink talks to.
#[derive(Clone, Copy)]
pub struct VectorTarget<'a> {
    pub embeddings: &'a dyn EmbeddingGenerator,
    pub store: &'a dyn VectorStore,
}

/// One item per metric per record, in record order.
///
/// The text is a one-line description. Ids are left empty; they are set to
/// the text's SHA-1 when the embedding is attached, so the same figure
/// re-published overwrites itself.
#[must_use]
pub fn build_items(records: &[ServiceRecord], granularity: Granularity) -> Vec<VectorItem> {
    let mut items = Vec::new();

    for record in records {
        let subject = if record.keys.is_empty() {
            "Total".to_string()
        } else {
            record.keys.join(", ")
        };

        for metric in &record.metrics {
            let text = format!(
                "{subject} {} from {} to {} ({}): {} {}",
                metric.name,
                record.start,
                record.end,
                granularity,
                metric.amount_text,
                metric.unit
            );

            let mut item = VectorItem::new(String::new(), text)
                .with_metadata("start", &record.start)
                .with_metadata("end", &record.end)
                .with_metadata("granularity", granularity.to_string())
                .with_metadata("metric", &metric.name)
                .with_metadata("amount", &metric.amount_text)
                .with_metadata("unit", &metric.unit);
            for (i, key) in record.keys.iter().take(2).enumerate() {
                item = item.with_metadata(format!("key_{i}"), key);
            }
            items.push(item);
        }
    }

    items
}

/// Build, embed and upsert. Returns the number of vectors upserted.
pub async fn publish(
    records: &[ServiceRecord],
    granularity: Granularity,
    target: &VectorTarget<'_>,
) -> Result<usize> {
    let mut items = build_items(records, granularity);
    attach_embeddings(target.embeddings, &mut items).await?;
    let count = UpsertPipeline::new(target.store).upsert(&items).await?;
    info!(count, "Published report to vector store");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Metric;

    fn record(keys: &[&str], metrics: &[(&str, &str)]) -> ServiceRecord {
        ServiceRecord {
            keys: keys.iter().map(ToString::to_string).collect(),
            start: "2024-01-01".into(),
            end: "2024-02-01".into(),
            metrics: metrics
                .iter()
                .map(|(n, a)| Metric {
                    name: (*n).to_string(),
                    amount_text: (*a).to_string(),
                    amount: a.parse().unwrap(),
                    unit: "USD".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_build_items_one_per_metric() {
        let records = vec![
            record(&["Amazon EC2", "prod"], &[("UnblendedCost", "10.5"), ("UsageQuantity", "3")]),
            record(&[], &[("UnblendedCost", "1")]),
        ];
        let items = build_items(&records, Granularity::Monthly);
        assert_eq!(items.len(), 3);

        let first = &items[0];
        assert!(first.id.is_empty());
        assert!(first.text.starts_with("Amazon EC2, prod "));
        assert_eq!(first.metadata["key_0"], "Amazon EC2");
        assert_eq!(first.metadata["key_1"], "prod");
        assert_eq!(first.metadata["granularity"], "MONTHLY");
        assert!(first.embedding.is_none());

        let total = &items[2];
        assert!(total.text.starts_with("Total UnblendedCost from 2024-01-01 to 2024-02-01"));
        assert!(!total.metadata.contains_key("key_0"));
        assert_eq!(total.metadata["amount"], "1");
    }

    #[test]
    fn test_build_items_empty() {
        assert!(build_items(&[], Granularity::Daily).is_empty());
    }
}
