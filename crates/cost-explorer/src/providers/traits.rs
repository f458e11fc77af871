//! Billing provider trait and common types.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::{Expression, GroupKey, Granularity, TimeRange};

/// Errors that can occur during billing provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Authentication error (missing or rejected credentials).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// Cost and usage
// ============================================================================

/// Request for a single page of cost-and-usage data.
#[derive(Debug, Clone)]
pub struct CostUsageRequest {
    pub time_range: TimeRange,
    pub granularity: Granularity,
    /// Metric names such as `UnblendedCost` or `UsageQuantity`.
    pub metrics: Vec<String>,
    pub filter: Option<Expression>,
    /// Provider-side limit is two keys.
    pub group_by: Vec<GroupKey>,
    pub page_token: Option<String>,
}

/// Amount as reported by the provider, still in its decimal text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricAmount {
    pub amount: String,
    pub unit: String,
}

/// One group's metrics within a time period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupResult {
    /// Group key values, ordered like the request's group keys.
    pub keys: Vec<String>,
    /// Metric name to amount. Iteration order is unspecified.
    pub metrics: HashMap<String, MetricAmount>,
}

/// Results for one time bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimePeriodResult {
    pub start: String,
    pub end: String,
    pub groups: Vec<GroupResult>,
    /// Provider marked the figures as estimated (period not closed yet).
    #[serde(default)]
    pub estimated: bool,
}

/// One page of cost-and-usage results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostUsagePage {
    pub periods: Vec<TimePeriodResult>,
    /// Token for the next page. Surfaced, never followed.
    pub next_page_token: Option<String>,
}

// ============================================================================
// Forecast
// ============================================================================

/// Request for a cost forecast.
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub time_range: TimeRange,
    pub granularity: Granularity,
    /// Forecast metric such as `UNBLENDED_COST`.
    pub metric: String,
    /// Prediction interval level, 0-100.
    pub prediction_interval_level: u8,
    pub filter: Option<Expression>,
}

/// A single forecast data point, amounts still in text form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastPointResult {
    pub start: String,
    pub end: String,
    pub mean_value: String,
    pub lower_bound: String,
    pub upper_bound: String,
}

/// Forecast response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastResult {
    pub points: Vec<ForecastPointResult>,
    pub total: Option<MetricAmount>,
}

// ============================================================================
// Provider trait
// ============================================================================

/// A cloud billing backend.
///
/// Calls are issued one at a time; implementations do not retry.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Provider name (e.g. "aws").
    fn name(&self) -> &'static str;

    /// Fetch one page of cost-and-usage data.
    async fn cost_and_usage(
        &self,
        request: &CostUsageRequest,
    ) -> Result<CostUsagePage, ProviderError>;

    /// Fetch a cost forecast.
    async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResult, ProviderError>;
}
