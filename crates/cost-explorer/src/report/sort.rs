//! Deterministic display orderings over a [`Report`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{Report, ServiceRecord};
use crate::error::ExplorerError;

/// How records are ordered before they reach a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortStrategy {
    /// Newest period first.
    #[default]
    Date,
    /// Most expensive first.
    Cost,
}

impl SortStrategy {
    #[must_use]
    pub fn apply(self, report: &Report) -> Vec<ServiceRecord> {
        match self {
            Self::Date => sort_by_date(report),
            Self::Cost => sort_by_cost(report),
        }
    }
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Cost => write!(f, "cost"),
        }
    }
}

impl FromStr for SortStrategy {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "cost" => Ok(Self::Cost),
            other => Err(ExplorerError::Validation(format!(
                "unknown sort {other:?}, expected date or cost"
            ))),
        }
    }
}

/// Parse a period start, either `YYYY-MM-DD` or an RFC 3339 timestamp (hourly).
fn parse_start(start: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(start, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(start)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Records in id order, then stably sorted by descending `key`.
fn sorted_by<K, F>(report: &Report, key: F) -> Vec<ServiceRecord>
where
    F: Fn(&ServiceRecord) -> K,
    K: Ord,
{
    let mut records: Vec<ServiceRecord> = report.iter().map(|(_, r)| r.clone()).collect();
    // Reverse key order gives descending; `sort_by` is stable so ties keep id order.
    records.sort_by(|a, b| key(b).cmp(&key(a)));
    records
}

/// Newest `start` first. Ties keep id order. Unparseable dates sort last.
#[must_use]
pub fn sort_by_date(report: &Report) -> Vec<ServiceRecord> {
    sorted_by(report, |r| parse_start(&r.start))
}

/// Wrapper giving `f64` a total order.
#[derive(PartialEq)]
struct TotalF64(f64);

impl Eq for TotalF64 {}

impl PartialOrd for TotalF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TotalF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Highest first-metric amount first. Ties keep id order; records without
/// metrics sort last.
///
/// Only deterministic when each record has a single metric, since metric
/// order within a record is not fixed.
#[must_use]
pub fn sort_by_cost(report: &Report) -> Vec<ServiceRecord> {
    sorted_by(report, |r| r.primary_metric().map(|m| TotalF64(m.amount)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Metric;

    fn record(key: &str, start: &str, amount: Option<f64>) -> ServiceRecord {
        ServiceRecord {
            keys: vec![key.to_string()],
            start: start.to_string(),
            end: start.to_string(),
            metrics: amount
                .map(|a| Metric {
                    name: "UnblendedCost".into(),
                    amount_text: a.to_string(),
                    amount: a,
                    unit: "USD".into(),
                })
                .into_iter()
                .collect(),
        }
    }

    fn keys(records: &[ServiceRecord]) -> Vec<&str> {
        records.iter().map(|r| r.key(0)).collect()
    }

    #[test]
    fn test_sort_by_date_descending() {
        let report: Report = vec![
            record("jan", "2024-01-01", Some(1.0)),
            record("mar", "2024-03-01", Some(1.0)),
            record("feb", "2024-02-01", Some(1.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(keys(&sort_by_date(&report)), vec!["mar", "feb", "jan"]);
    }

    #[test]
    fn test_sort_by_date_is_stable_for_equal_dates() {
        let report: Report = vec![
            record("first", "2024-01-01", Some(5.0)),
            record("newer", "2024-02-01", Some(1.0)),
            record("second", "2024-01-01", Some(50.0)),
            record("third", "2024-01-01", Some(0.5)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            keys(&sort_by_date(&report)),
            vec!["newer", "first", "second", "third"]
        );
    }

    #[test]
    fn test_sort_by_date_handles_hourly_and_bad_dates() {
        let report: Report = vec![
            record("bad", "yesterday", Some(1.0)),
            record("h1", "2024-01-01T01:00:00Z", Some(1.0)),
            record("h0", "2024-01-01T00:00:00Z", Some(1.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(keys(&sort_by_date(&report)), vec!["h1", "h0", "bad"]);
    }

    #[test]
    fn test_sort_by_cost_descending_and_stable() {
        // Single-metric records, so the first metric is well defined.
        let report: Report = vec![
            record("low", "2024-01-01", Some(1.0)),
            record("tie-a", "2024-01-01", Some(7.5)),
            record("none", "2024-01-01", None),
            record("high", "2024-01-01", Some(100.0)),
            record("tie-b", "2024-01-01", Some(7.5)),
            record("negative", "2024-01-01", Some(-3.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            keys(&sort_by_cost(&report)),
            vec!["high", "tie-a", "tie-b", "low", "negative", "none"]
        );
    }

    #[test]
    fn test_sorting_leaves_report_untouched() {
        let report: Report = vec![
            record("a", "2024-01-01", Some(1.0)),
            record("b", "2024-02-01", Some(2.0)),
        ]
        .into_iter()
        .collect();
        let before = report.clone();
        let _ = SortStrategy::Cost.apply(&report);
        let _ = SortStrategy::Date.apply(&report);
        assert_eq!(report, before);
    }

    #[test]
    fn test_sort_strategy_parse() {
        assert_eq!("COST".parse::<SortStrategy>().unwrap(), SortStrategy::Cost);
        assert_eq!("date".parse::<SortStrategy>().unwrap(), SortStrategy::Date);
        assert!("size".parse::<SortStrategy>().is_err());
    }
}
