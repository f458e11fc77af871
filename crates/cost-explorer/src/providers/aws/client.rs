//! AWS Cost Explorer API client.
//!
//! Requests use the JSON 1.1 protocol (`X-Amz-Target` dispatch). Request
//! signing is left to the transport in front of this client; the client
//! itself sends unsigned requests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use super::models::{
    CeDateInterval, CeError, CeExpression, CeMetricValue, CeResultByTime, GetCostAndUsageRequest,
    GetCostAndUsageResponse, GetCostForecastRequest, GetCostForecastResponse,
};
use crate::providers::traits::{
    BillingProvider, CostUsagePage, CostUsageRequest, ForecastPointResult, ForecastRequest,
    ForecastResult, GroupResult, MetricAmount, ProviderError, TimePeriodResult,
};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const TARGET_PREFIX: &str = "AWSInsightsIndexService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// AWS Cost Explorer billing provider.
#[derive(Debug, Clone)]
pub struct CostExplorer {
    client: Client,
    endpoint: String,
}

impl CostExplorer {
    /// Create a client for the regional Cost Explorer endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is empty or the HTTP client cannot be built.
    pub fn new(region: impl Into<String>) -> Result<Self, ProviderError> {
        let region = region.into();
        if region.is_empty() {
            return Err(ProviderError::Config("AWS region is required".to_string()));
        }
        Self::with_endpoint(format!("https://ce.{region}.amazonaws.com"))
    }

    /// Create a client against an explicit endpoint (proxies, tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!("cost-explorer/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ProviderError::Http)?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST one JSON 1.1 operation.
    async fn call<B, T>(&self, operation: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let target = format!("{TARGET_PREFIX}.{operation}");
        debug!(endpoint = %self.endpoint, target = %target, "Cost Explorer request");

        let response = self
            .client
            .post(format!("{}/", self.endpoint))
            .header("X-Amz-Target", &target)
            .header("Content-Type", CONTENT_TYPE)
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Map the HTTP status and decode the body.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, "Failed to parse Cost Explorer response");
                ProviderError::Serialization(e)
            });
        }

        let message = match serde_json::from_str::<CeError>(&text) {
            Ok(err) if !err.message.is_empty() => {
                if err.error_type.is_empty() {
                    err.message
                } else {
                    format!("{}: {}", err.error_type, err.message)
                }
            }
            _ => text,
        };

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ProviderError::Auth(message))
        } else {
            Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    fn build_cost_request(request: &CostUsageRequest) -> GetCostAndUsageRequest {
        GetCostAndUsageRequest {
            time_period: CeDateInterval {
                start: request.time_range.start_string(),
                end: request.time_range.end_string(),
            },
            granularity: request.granularity.to_string(),
            metrics: request.metrics.clone(),
            filter: request.filter.as_ref().map(CeExpression::from),
            group_by: request.group_by.iter().map(Into::into).collect(),
            next_page_token: request.page_token.clone(),
        }
    }

    fn build_forecast_request(request: &ForecastRequest) -> GetCostForecastRequest {
        GetCostForecastRequest {
            time_period: CeDateInterval {
                start: request.time_range.start_string(),
                end: request.time_range.end_string(),
            },
            metric: request.metric.clone(),
            granularity: request.granularity.to_string(),
            filter: request.filter.as_ref().map(CeExpression::from),
            prediction_interval_level: request.prediction_interval_level,
        }
    }

    fn to_amounts(metrics: HashMap<String, CeMetricValue>) -> HashMap<String, MetricAmount> {
        metrics
            .into_iter()
            .map(|(name, v)| {
                (
                    name,
                    MetricAmount {
                        amount: v.amount,
                        unit: v.unit,
                    },
                )
            })
            .collect()
    }

    /// Convert a wire bucket. Ungrouped queries only carry `Total`, which
    /// becomes a single group with no keys.
    fn convert_period(result: CeResultByTime, grouped: bool) -> TimePeriodResult {
        let groups = if !grouped && result.groups.is_empty() && !result.total.is_empty() {
            vec![GroupResult {
                keys: Vec::new(),
                metrics: Self::to_amounts(result.total),
            }]
        } else {
            result
                .groups
                .into_iter()
                .map(|g| GroupResult {
                    keys: g.keys,
                    metrics: Self::to_amounts(g.metrics),
                })
                .collect()
        };

        TimePeriodResult {
            start: result.time_period.start,
            end: result.time_period.end,
            groups,
            estimated: result.estimated,
        }
    }
}

#[async_trait]
impl BillingProvider for CostExplorer {
    fn name(&self) -> &'static str {
        "aws"
    }

    #[instrument(skip(self, request), fields(provider = "aws", granularity = %request.granularity))]
    async fn cost_and_usage(
        &self,
        request: &CostUsageRequest,
    ) -> Result<CostUsagePage, ProviderError> {
        let body = Self::build_cost_request(request);
        let response: GetCostAndUsageResponse = self.call("GetCostAndUsage", &body).await?;

        let grouped = !request.group_by.is_empty();
        let periods: Vec<TimePeriodResult> = response
            .results_by_time
            .into_iter()
            .map(|r| Self::convert_period(r, grouped))
            .collect();
        debug!(periods = periods.len(), "Fetched cost and usage");

        Ok(CostUsagePage {
            periods,
            next_page_token: response.next_page_token,
        })
    }

    #[instrument(skip(self, request), fields(provider = "aws", metric = %request.metric))]
    async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResult, ProviderError> {
        let body = Self::build_forecast_request(request);
        let response: GetCostForecastResponse = self.call("GetCostForecast", &body).await?;

        let points = response
            .forecast_results_by_time
            .into_iter()
            .map(|r| ForecastPointResult {
                start: r.time_period.start,
                end: r.time_period.end,
                mean_value: r.mean_value,
                lower_bound: r.prediction_interval_lower_bound,
                upper_bound: r.prediction_interval_upper_bound,
            })
            .collect();

        Ok(ForecastResult {
            points,
            total: response.total.map(|t| MetricAmount {
                amount: t.amount,
                unit: t.unit,
            }),
        })
    }
}
