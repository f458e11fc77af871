//! Output sinks for sorted report records.
//!
//! Every sink is a variant of [`OutputFormat`]; [`dispatch`] routes an
//! already-sorted sequence to exactly one of them. Adding a sink means adding
//! a variant and its arm, nothing else.

pub mod chart;
pub mod csv;
pub mod table;
pub mod vector;

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExplorerError, Result};
use crate::query::Granularity;
use crate::report::ServiceRecord;

pub use vector::VectorTarget;

/// Where a report goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Ranked table on the terminal.
    #[default]
    Stdout,
    /// Comma-separated rows, one per metric.
    Csv,
    /// Horizontal bar chart on the terminal.
    Chart,
    /// Embedded and upserted into a vector index.
    VectorStore,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Csv => write!(f, "csv"),
            Self::Chart => write!(f, "chart"),
            Self::VectorStore => write!(f, "vector-store"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stdout" | "table" => Ok(Self::Stdout),
            "csv" => Ok(Self::Csv),
            "chart" => Ok(Self::Chart),
            "vector" | "vector-store" => Ok(Self::VectorStore),
            other => Err(ExplorerError::Validation(format!(
                "unknown output {other:?}, expected stdout, csv, chart or vector"
            ))),
        }
    }
}

/// What a sink needs besides the records.
pub struct OutputContext<'a> {
    pub granularity: Granularity,
    /// Destination for text sinks and for the vector sink's summary line.
    pub out: &'a mut (dyn Write + Send),
    /// Required by [`OutputFormat::VectorStore`] only.
    pub vector: Option<VectorTarget<'a>>,
}

/// Send `records` to the sink for `format`.
///
/// Write failures come back as [`ExplorerError::Render`] tagged with the
/// sink that failed. Vector-store errors keep their own variants.
pub async fn dispatch(
    format: OutputFormat,
    records: &[ServiceRecord],
    ctx: OutputContext<'_>,
) -> Result<()> {
    debug!(sink = %format, records = records.len(), "Dispatching report");
    let render_err = |source| ExplorerError::Render {
        sink: format,
        source,
    };

    match format {
        OutputFormat::Stdout => table::render(records, ctx.granularity, ctx.out).map_err(render_err),
        OutputFormat::Csv => csv::render(records, ctx.granularity, ctx.out).map_err(render_err),
        OutputFormat::Chart => chart::render(records, ctx.out).map_err(render_err),
        OutputFormat::VectorStore => {
            let target = ctx.vector.ok_or_else(|| {
                ExplorerError::Config(
                    "vector output needs an embedding generator and a vector store".to_string(),
                )
            })?;
            let count = vector::publish(records, ctx.granularity, &target).await?;
            writeln!(ctx.out, "Upserted {count} vectors").map_err(render_err)
        }
    }
}
