//! Cloud cost explorer.
//!
//! Compiles filter and grouping specs into provider expressions, queries a
//! billing provider, flattens the nested response into a [`Report`] and sends
//! sorted records to one of several sinks:
//!
//! - ranked terminal table
//! - CSV
//! - terminal bar chart
//! - vector store (embedded and upserted in batches of 25)
//!
//! ## Example
//!
//! ```rust,ignore
//! use cost_explorer::providers::{BillingProvider, CostExplorer, CostUsageRequest};
//! use cost_explorer::query::{compile, FilterSpec, GroupSpec};
//! use cost_explorer::report::{flatten, SortStrategy};
//!
//! let filter = compile(&FilterSpec::new().with_exclude_discounts(true));
//! let page = CostExplorer::new("us-east-1")?.cost_and_usage(&request).await?;
//! let report = flatten(&page.periods)?;
//! let ordered = SortStrategy::Cost.apply(&report);
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod providers;
pub mod query;
pub mod report;
pub mod vector;

pub use config::ExplorerConfig;
pub use error::{ExplorerError, Result};
pub use output::{dispatch, OutputContext, OutputFormat};
pub use report::{Report, ServiceRecord, SortStrategy};
