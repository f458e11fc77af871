//! Cost Explorer wire models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::query::{Expression, GroupKey, Leaf, LeafKind};

// ============================================================================
// Shared
// ============================================================================

/// `TimePeriod` object (dates as `YYYY-MM-DD`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CeDateInterval {
    pub start: String,
    pub end: String,
}

/// Metric value (`Amount` is a decimal string).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CeMetricValue {
    pub amount: String,
    pub unit: String,
}

/// Key/values pair used by dimension and tag leaves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CeKeyValues {
    pub key: String,
    pub values: Vec<String>,
}

/// Filter expression. Exactly one field is set per node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CeExpression {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<CeKeyValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<CeKeyValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<CeExpression>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<CeExpression>>,
}

impl From<&Leaf> for CeExpression {
    fn from(leaf: &Leaf) -> Self {
        let kv = CeKeyValues {
            key: leaf.key.clone(),
            values: leaf.values.clone(),
        };
        match leaf.kind {
            LeafKind::Dimension => Self {
                dimensions: Some(kv),
                ..Self::default()
            },
            LeafKind::Tag => Self {
                tags: Some(kv),
                ..Self::default()
            },
        }
    }
}

impl From<&Expression> for CeExpression {
    fn from(expr: &Expression) -> Self {
        match expr {
            Expression::Leaf(leaf) => leaf.into(),
            Expression::Not(inner) => Self {
                not: Some(Box::new(inner.as_ref().into())),
                ..Self::default()
            },
            Expression::And(children) => Self {
                and: Some(children.iter().map(Into::into).collect()),
                ..Self::default()
            },
        }
    }
}

/// `GroupBy` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CeGroupDefinition {
    #[serde(rename = "Type")]
    pub kind: String,
    pub key: String,
}

impl From<&GroupKey> for CeGroupDefinition {
    fn from(key: &GroupKey) -> Self {
        Self {
            kind: key.kind.to_string(),
            key: key.key.clone(),
        }
    }
}

// ============================================================================
// GetCostAndUsage
// ============================================================================

/// `GetCostAndUsage` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCostAndUsageRequest {
    pub time_period: CeDateInterval,
    pub granularity: String,
    pub metrics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<CeExpression>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<CeGroupDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// `GetCostAndUsage` response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCostAndUsageResponse {
    #[serde(default)]
    pub results_by_time: Vec<CeResultByTime>,
    pub next_page_token: Option<String>,
}

/// One time bucket of results.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CeResultByTime {
    pub time_period: CeDateInterval,
    /// Present when the query has no grouping.
    #[serde(default)]
    pub total: HashMap<String, CeMetricValue>,
    #[serde(default)]
    pub groups: Vec<CeGroup>,
    #[serde(default)]
    pub estimated: bool,
}

/// Grouped result within a bucket.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CeGroup {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub metrics: HashMap<String, CeMetricValue>,
}

// ============================================================================
// GetCostForecast
// ============================================================================

/// `GetCostForecast` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCostForecastRequest {
    pub time_period: CeDateInterval,
    pub metric: String,
    pub granularity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<CeExpression>,
    pub prediction_interval_level: u8,
}

/// `GetCostForecast` response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCostForecastResponse {
    pub total: Option<CeMetricValue>,
    #[serde(default)]
    pub forecast_results_by_time: Vec<CeForecastResult>,
}

/// One forecast bucket.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CeForecastResult {
    pub time_period: CeDateInterval,
    #[serde(default)]
    pub mean_value: String,
    #[serde(default)]
    pub prediction_interval_lower_bound: String,
    #[serde(default)]
    pub prediction_interval_upper_bound: String,
}

// ============================================================================
// Error response
// ============================================================================

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct CeError {
    #[serde(rename = "__type", default)]
    pub error_type: String,
    #[serde(alias = "Message", default)]
    pub message: String,
}
