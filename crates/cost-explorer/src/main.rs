//! costx - query cloud cost and forecasts and publish them to a sink.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cost_explorer::output::{self, table, OutputContext, OutputFormat, VectorTarget};
use cost_explorer::providers::{BillingProvider, CostExplorer, CostUsageRequest, ForecastRequest};
use cost_explorer::query::{
    compile, compile_forecast, resolve, DimensionFilter, FilterSpec, ForecastFilterSpec,
    Granularity, TimeRange,
};
use cost_explorer::report::{flatten, map_forecast, SortStrategy};
use cost_explorer::vector::{OpenAiEmbeddings, Pinecone};
use cost_explorer::ExplorerConfig;

/// costx - explore cloud cost and usage from the terminal.
#[derive(Parser)]
#[command(name = "costx")]
#[command(about = "Query cloud cost and forecasts, then render or publish them")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// AWS region (overrides AWS_REGION)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Cost Explorer endpoint (overrides COST_EXPLORER_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cost and usage for a time range
    Cost {
        #[command(flatten)]
        range: RangeArgs,

        /// Time bucket size
        #[arg(long, default_value = "MONTHLY")]
        granularity: Granularity,

        /// Metrics to fetch (repeatable)
        #[arg(long = "metric", default_value = "UnblendedCost")]
        metrics: Vec<String>,

        /// Drop refunds, credits and discount records
        #[arg(long)]
        exclude_discounts: bool,

        /// Tag filter KEY=VALUE (only the first is applied)
        #[arg(long, value_parser = parse_key_value)]
        tag: Vec<(String, String)>,

        /// Dimension filter KEY=VALUE (repeatable)
        #[arg(long, value_parser = parse_key_value)]
        dimension: Vec<(String, String)>,

        /// Group by dimension (repeatable)
        #[arg(long)]
        group_by: Vec<String>,

        /// Group by tag (repeatable)
        #[arg(long)]
        group_by_tag: Vec<String>,

        /// Output sink: stdout, csv, chart or vector
        #[arg(long, default_value = "stdout")]
        output: OutputFormat,

        /// Record order: date or cost
        #[arg(long, default_value = "date")]
        sort: SortStrategy,

        /// Write CSV here instead of stdout (only with --output csv)
        #[arg(long)]
        csv_path: Option<PathBuf>,
    },

    /// Forecast spend for a future time range
    Forecast {
        #[command(flatten)]
        range: RangeArgs,

        /// Time bucket size
        #[arg(long, default_value = "MONTHLY")]
        granularity: Granularity,

        /// Forecast metric
        #[arg(long, default_value = "UNBLENDED_COST")]
        metric: String,

        /// Dimension filter KEY=V1,V2 (repeatable)
        #[arg(long, value_parser = parse_key_values)]
        dimension: Vec<DimensionFilter>,

        /// Prediction interval level (51-99)
        #[arg(long, default_value = "80", value_parser = clap::value_parser!(u8).range(51..=99))]
        interval: u8,
    },
}

#[derive(Args)]
struct RangeArgs {
    /// Range start (YYYY-MM-DD)
    #[arg(long, requires = "end", conflicts_with = "preset")]
    start: Option<String>,

    /// Range end, exclusive (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Named range: last-7-days, last-30-days, month-to-date, last-month, year-to-date
    #[arg(long)]
    preset: Option<String>,
}

impl RangeArgs {
    /// Explicit dates, then the preset, then `fallback`.
    fn resolve(&self, fallback: impl FnOnce() -> Result<TimeRange>) -> Result<TimeRange> {
        let today = Utc::now().date_naive();
        match (&self.start, &self.end, &self.preset) {
            (Some(start), Some(end), _) => Ok(TimeRange::parse(start, end)?),
            (_, _, Some(preset)) => Ok(TimeRange::preset(preset, today)?),
            _ => fallback(),
        }
    }
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in {s:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_key_values(s: &str) -> std::result::Result<DimensionFilter, String> {
    let (key, values) = parse_key_value(s)?;
    Ok(DimensionFilter {
        key,
        values: values.split(',').map(str::trim).map(String::from).collect(),
    })
}

/// `--csv-path` only applies to the CSV sink.
fn check_csv_path(format: OutputFormat, csv_path: Option<&Path>) -> Result<()> {
    if let Some(path) = csv_path {
        if format != OutputFormat::Csv {
            bail!(
                "--csv-path {} requires --output csv (got --output {format})",
                path.display()
            );
        }
    }
    Ok(())
}

fn build_provider(config: &ExplorerConfig) -> Result<CostExplorer> {
    let provider = match &config.endpoint {
        Some(endpoint) => CostExplorer::with_endpoint(endpoint.as_str()),
        None => CostExplorer::new(config.region.as_str()),
    }
    .context("failed to create Cost Explorer client")?;
    debug!(endpoint = %provider.endpoint(), "Using Cost Explorer endpoint");
    Ok(provider)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("cost_explorer=debug,costx=debug,info")
    } else {
        EnvFilter::new("cost_explorer=info,costx=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let mut config = ExplorerConfig::from_env();
    if let Some(region) = cli.region {
        config = config.with_region(region);
    }
    if let Some(endpoint) = cli.endpoint {
        config = config.with_endpoint(endpoint);
    }

    match cli.command {
        Commands::Cost {
            range,
            granularity,
            metrics,
            exclude_discounts,
            tag,
            dimension,
            group_by,
            group_by_tag,
            output,
            sort,
            csv_path,
        } => {
            check_csv_path(output, csv_path.as_deref())?;

            let time_range = range.resolve(|| {
                Ok(TimeRange::preset("last-30-days", Utc::now().date_naive())?)
            })?;

            let mut spec = FilterSpec::new().with_exclude_discounts(exclude_discounts);
            if let Some((key, value)) = tag.first() {
                spec = spec.with_tag(key, value);
            }
            for (key, value) in dimension {
                spec = spec.with_dimension(key, value);
            }

            let request = CostUsageRequest {
                time_range,
                granularity,
                metrics,
                filter: compile(&spec),
                group_by: resolve(&group_by, &group_by_tag),
                page_token: None,
            };

            let provider = build_provider(&config)?;
            let page = provider.cost_and_usage(&request).await?;
            if let Some(token) = &page.next_page_token {
                info!(token = %token, "More results available; only the first page was fetched");
            }

            let report = flatten(&page.periods)?;
            let ordered = sort.apply(&report);
            info!(records = ordered.len(), sort = %sort, output = %output, "Rendering report");

            run_sink(output, &ordered, granularity, csv_path, &config).await?;
        }

        Commands::Forecast {
            range,
            granularity,
            metric,
            dimension,
            interval,
        } => {
            let time_range = range.resolve(|| {
                let today = Utc::now().date_naive();
                Ok(TimeRange::new(today, today + Duration::days(30))?)
            })?;

            let request = ForecastRequest {
                time_range,
                granularity,
                metric,
                prediction_interval_level: interval,
                filter: compile_forecast(&ForecastFilterSpec {
                    dimensions: dimension,
                }),
            };

            let provider = build_provider(&config)?;
            let forecast = map_forecast(&provider.forecast(&request).await?)?;
            table::render_forecast(&forecast, &mut io::stdout())?;
        }
    }

    Ok(())
}

async fn run_sink(
    format: OutputFormat,
    records: &[cost_explorer::ServiceRecord],
    granularity: Granularity,
    csv_path: Option<PathBuf>,
    config: &ExplorerConfig,
) -> Result<()> {
    let mut out: Box<dyn Write + Send> = match csv_path {
        Some(path) => Box::new(BufWriter::new(
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };

    if format == OutputFormat::VectorStore {
        let (url, key) = config.pinecone()?;
        let store = Pinecone::new(url, key)?;
        let embeddings = OpenAiEmbeddings::new(
            config.openai_base_url.as_str(),
            config.openai_key()?,
            config.embedding_model.as_str(),
        )?;
        let ctx = OutputContext {
            granularity,
            out: out.as_mut(),
            vector: Some(VectorTarget {
                embeddings: &embeddings,
                store: &store,
            }),
        };
        output::dispatch(format, records, ctx).await?;
    } else {
        let ctx = OutputContext {
            granularity,
            out: out.as_mut(),
            vector: None,
        };
        output::dispatch(format, records, ctx).await?;
    }

    out.flush()?;
    Ok(())
}
