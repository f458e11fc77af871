//! Query model: filter specs, the boolean expression tree, grouping and time ranges.
//!
//! A request starts as a [`FilterSpec`] / [`GroupSpec`] built by the caller.
//! [`filter::compile`], [`forecast::compile_forecast`] and [`group::resolve`]
//! turn those into the provider-neutral [`Expression`] tree and [`GroupKey`]
//! sequence that billing providers encode onto the wire.

pub mod filter;
pub mod forecast;
pub mod group;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ExplorerError, Result};

pub use filter::compile;
pub use forecast::compile_forecast;
pub use group::resolve;

// ============================================================================
// Expression tree
// ============================================================================

/// Whether a leaf or group key targets a provider dimension or a user tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeafKind {
    /// Provider-defined attribute such as `SERVICE` or `REGION`.
    Dimension,
    /// User-defined resource label.
    Tag,
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dimension => write!(f, "DIMENSION"),
            Self::Tag => write!(f, "TAG"),
        }
    }
}

/// Match on a single key against a set of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub kind: LeafKind,
    pub key: String,
    pub values: Vec<String>,
}

impl Leaf {
    #[must_use]
    pub fn dimension(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            kind: LeafKind::Dimension,
            key: key.into(),
            values,
        }
    }

    #[must_use]
    pub fn tag(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            kind: LeafKind::Tag,
            key: key.into(),
            values,
        }
    }
}

/// Boolean filter tree sent to the billing provider.
///
/// Absence of a filter is `Option::<Expression>::None`. Compilers only emit
/// `And` with two or more children; the one exception is the preserved
/// forecast quirk documented on [`forecast::compile_forecast`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expression {
    Leaf(Leaf),
    Not(Box<Expression>),
    And(Vec<Expression>),
}

impl Expression {
    #[must_use]
    pub fn not(inner: Expression) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Combine active filters: none is absence, one stays bare, more become an `And`.
    #[must_use]
    pub fn all(mut children: Vec<Expression>) -> Option<Self> {
        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => Some(Self::And(children)),
        }
    }

    /// Leaves of the tree in depth-first order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Leaf> {
        match self {
            Self::Leaf(leaf) => vec![leaf],
            Self::Not(inner) => inner.leaves(),
            Self::And(children) => children.iter().flat_map(Expression::leaves).collect(),
        }
    }
}

impl From<Leaf> for Expression {
    fn from(leaf: Leaf) -> Self {
        Self::Leaf(leaf)
    }
}

// ============================================================================
// Filter specs
// ============================================================================

/// A single tag equality filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

/// Normalized filter specification for cost-and-usage queries.
///
/// Only one tag filter is honoured; callers holding several candidates keep the first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    pub exclude_discounts: bool,
    pub tag_filter: Option<TagFilter>,
    /// Dimension key to value. Iteration order is unspecified and so is the
    /// order of the compiled leaves.
    pub dimension_filter: HashMap<String, String>,
}

impl FilterSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_exclude_discounts(mut self, exclude: bool) -> Self {
        self.exclude_discounts = exclude;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tag_filter = Some(TagFilter {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimension_filter.insert(key.into(), value.into());
        self
    }
}

/// A dimension with its accepted values, as used by forecast filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionFilter {
    pub key: String,
    pub values: Vec<String>,
}

/// Filter specification for forecast queries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForecastFilterSpec {
    pub dimensions: Vec<DimensionFilter>,
}

// ============================================================================
// Grouping
// ============================================================================

/// Requested grouping, before precedence is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupSpec {
    pub dimensions: Vec<String>,
    pub tags: Vec<String>,
}

/// One resolved group-by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKey {
    pub kind: LeafKind,
    pub key: String,
}

impl GroupKey {
    #[must_use]
    pub fn dimension(key: impl Into<String>) -> Self {
        Self {
            kind: LeafKind::Dimension,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn tag(key: impl Into<String>) -> Self {
        Self {
            kind: LeafKind::Tag,
            key: key.into(),
        }
    }
}

// ============================================================================
// Granularity and time range
// ============================================================================

/// Time bucket size for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    Daily,
    #[default]
    Monthly,
    Hourly,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "DAILY"),
            Self::Monthly => write!(f, "MONTHLY"),
            Self::Hourly => write!(f, "HOURLY"),
        }
    }
}

impl FromStr for Granularity {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Self::Daily),
            "MONTHLY" => Ok(Self::Monthly),
            "HOURLY" => Ok(Self::Hourly),
            other => Err(ExplorerError::Validation(format!(
                "unknown granularity {other:?}, expected DAILY, MONTHLY or HOURLY"
            ))),
        }
    }
}

/// Inclusive start, exclusive end, as the provider interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ExplorerError::Validation(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
                ExplorerError::Validation(format!("invalid date {s:?}: {e}"))
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// Resolve a named preset relative to `today`.
    ///
    /// Supported: `last-7-days`, `last-30-days`, `month-to-date`,
    /// `last-month`, `year-to-date`.
    pub fn preset(name: &str, today: NaiveDate) -> Result<Self> {
        let first_of_month = today.with_day(1).ok_or_else(|| {
            ExplorerError::Preset(format!("cannot compute month start for {today}"))
        })?;
        match name {
            "last-7-days" => Ok(Self {
                start: today - Duration::days(7),
                end: today,
            }),
            "last-30-days" => Ok(Self {
                start: today - Duration::days(30),
                end: today,
            }),
            "month-to-date" => {
                // Provider rejects empty ranges; on the 1st, fall back to one day.
                let end = if first_of_month == today {
                    today + Duration::days(1)
                } else {
                    today
                };
                Ok(Self {
                    start: first_of_month,
                    end,
                })
            }
            "last-month" => {
                let last_day_prev = first_of_month - Duration::days(1);
                let start = last_day_prev.with_day(1).ok_or_else(|| {
                    ExplorerError::Preset(format!("cannot compute previous month for {today}"))
                })?;
                Ok(Self {
                    start,
                    end: first_of_month,
                })
            }
            "year-to-date" => {
                let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).ok_or_else(|| {
                    ExplorerError::Preset(format!("cannot compute year start for {today}"))
                })?;
                let end = if start == today {
                    today + Duration::days(1)
                } else {
                    today
                };
                Ok(Self { start, end })
            }
            other => Err(ExplorerError::Preset(format!(
                "unknown preset {other:?}, expected one of last-7-days, last-30-days, month-to-date, last-month, year-to-date"
            ))),
        }
    }

    #[must_use]
    pub fn start_string(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    #[must_use]
    pub fn end_string(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}
