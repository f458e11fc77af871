//! Uniform report model produced from provider responses.

pub mod mapper;
pub mod sort;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use mapper::{flatten, map_forecast, parse_amount};
pub use sort::{sort_by_cost, sort_by_date, SortStrategy};

/// One metric on a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    /// Amount exactly as the provider sent it.
    pub amount_text: String,
    pub amount: f64,
    pub unit: String,
}

/// One group within one time period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Group-by values, ordered like the group keys of the query.
    pub keys: Vec<String>,
    pub start: String,
    pub end: String,
    /// Order follows the provider's metric map and carries no meaning.
    pub metrics: Vec<Metric>,
}

impl ServiceRecord {
    /// The metric in position 0, if any. Only meaningful for single-metric queries.
    #[must_use]
    pub fn primary_metric(&self) -> Option<&Metric> {
        self.metrics.first()
    }

    /// Key at `index`, or an empty string.
    #[must_use]
    pub fn key(&self, index: usize) -> &str {
        self.keys.get(index).map_or("", String::as_str)
    }
}

/// Flattened query response keyed by discovery-order id.
///
/// Ids start at 0 and follow the provider's period/group order. They carry no
/// other meaning; display order is decided by a [`SortStrategy`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    records: BTreeMap<u32, ServiceRecord>,
}

impl Report {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under the next free id and return it.
    pub(crate) fn push(&mut self, record: ServiceRecord) -> u32 {
        let id = self
            .records
            .last_key_value()
            .map_or(0, |(last, _)| last + 1);
        self.records.insert(id, record);
        id
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&ServiceRecord> {
        self.records.get(&id)
    }

    /// Records in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &ServiceRecord)> {
        self.records.iter().map(|(id, r)| (*id, r))
    }

    #[must_use]
    pub fn ids(&self) -> Vec<u32> {
        self.records.keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<ServiceRecord> for Report {
    fn from_iter<I: IntoIterator<Item = ServiceRecord>>(iter: I) -> Self {
        let mut report = Self::new();
        for record in iter {
            report.push(record);
        }
        report
    }
}

/// One forecast bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub start: String,
    pub end: String,
    pub mean: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Parsed forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub points: Vec<ForecastPoint>,
    pub total: Option<Metric>,
}
