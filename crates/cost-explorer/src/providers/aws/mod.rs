//! AWS Cost Explorer integration.
//!
//! Covers the two operations the explorer needs:
//!
//! - **GetCostAndUsage**: cost and usage grouped by dimension or tag
//! - **GetCostForecast**: forecast totals with a prediction interval
//!
//! ## Example
//!
//! ```rust,ignore
//! use cost_explorer::providers::{BillingProvider, CostExplorer, CostUsageRequest};
//!
//! let provider = CostExplorer::new("us-east-1")?;
//! let page = provider.cost_and_usage(&request).await?;
//! ```

mod client;
mod models;

pub use client::CostExplorer;
pub use models::*;
