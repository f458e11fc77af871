//! Billing provider abstractions.
//!
//! This module defines the provider trait and the request/response types
//! shared by all backends.

pub mod aws;
mod traits;

pub use traits::{
    BillingProvider, CostUsagePage, CostUsageRequest, ForecastPointResult, ForecastRequest,
    ForecastResult, GroupResult, MetricAmount, ProviderError, TimePeriodResult,
};

pub use aws::CostExplorer;
