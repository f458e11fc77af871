//! Flattens nested provider results into a [`Report`].

use tracing::debug;

use super::{Forecast, ForecastPoint, Metric, Report, ServiceRecord};
use crate::error::{ExplorerError, Result};
use crate::providers::{ForecastResult, MetricAmount, TimePeriodResult};

/// Parse a provider amount.
///
/// Accepts `[-+]?digits[.digits]?([eE][-+]?digits)?` and nothing else, so
/// `inf`, `NaN`, blanks and padded strings are rejected rather than silently
/// turned into odd floats. Exponents that overflow `f64` are rejected too.
pub fn parse_amount(text: &str) -> Result<f64> {
    let parse_error = || ExplorerError::Parse {
        value: text.to_string(),
    };
    if !is_decimal(text) {
        return Err(parse_error());
    }
    let value = text.parse::<f64>().map_err(|_| parse_error())?;
    if !value.is_finite() {
        return Err(parse_error());
    }
    Ok(value)
}

fn is_decimal(text: &str) -> bool {
    fn digits(s: &str) -> usize {
        s.bytes().take_while(u8::is_ascii_digit).count()
    }

    let s = text.strip_prefix(['-', '+']).unwrap_or(text);

    let int_len = digits(s);
    if int_len == 0 {
        return false;
    }
    let mut rest = &s[int_len..];

    if let Some(frac) = rest.strip_prefix('.') {
        let frac_len = digits(frac);
        if frac_len == 0 {
            return false;
        }
        rest = &frac[frac_len..];
    }

    if let Some(exp) = rest.strip_prefix(['e', 'E']) {
        let exp = exp.strip_prefix(['-', '+']).unwrap_or(exp);
        let exp_len = digits(exp);
        if exp_len == 0 {
            return false;
        }
        rest = &exp[exp_len..];
    }

    rest.is_empty()
}

fn to_metric(name: &str, value: &MetricAmount) -> Result<Metric> {
    Ok(Metric {
        name: name.to_string(),
        amount_text: value.amount.clone(),
        amount: parse_amount(&value.amount)?,
        unit: value.unit.clone(),
    })
}

/// Flatten periods and their groups, in input order, into a report.
///
/// Each group gets the next id starting from 0. A malformed amount anywhere
/// fails the whole call with [`ExplorerError::Parse`].
pub fn flatten(periods: &[TimePeriodResult]) -> Result<Report> {
    let mut report = Report::new();

    for period in periods {
        for group in &period.groups {
            let metrics = group
                .metrics
                .iter()
                .map(|(name, value)| to_metric(name, value))
                .collect::<Result<Vec<_>>>()?;

            report.push(ServiceRecord {
                keys: group.keys.clone(),
                start: period.start.clone(),
                end: period.end.clone(),
                metrics,
            });
        }
    }

    debug!(
        periods = periods.len(),
        records = report.len(),
        "Flattened cost response"
    );
    Ok(report)
}

/// Parse a forecast response's amounts.
pub fn map_forecast(result: &ForecastResult) -> Result<Forecast> {
    let points = result
        .points
        .iter()
        .map(|p| {
            Ok(ForecastPoint {
                start: p.start.clone(),
                end: p.end.clone(),
                mean: parse_amount(&p.mean_value)?,
                lower_bound: parse_amount(&p.lower_bound)?,
                upper_bound: parse_amount(&p.upper_bound)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let total = result
        .total
        .as_ref()
        .map(|t| to_metric("Total", t))
        .transpose()?;

    Ok(Forecast { points, total })
}
