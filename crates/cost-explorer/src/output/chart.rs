//! Horizontal bar chart for the terminal.

use std::io::{self, Write};

use colored::Colorize;

use crate::report::ServiceRecord;

/// Width of the longest bar, in cells.
pub const MAX_BAR_WIDTH: usize = 50;

const BAR: &str = "█";

fn label(record: &ServiceRecord) -> String {
    let keys = if record.keys.is_empty() {
        "Total".to_string()
    } else {
        record.keys.join(" / ")
    };
    format!("{keys} ({})", record.start)
}

/// Bar length for `amount` when the largest amount is `max`.
fn bar_width(amount: f64, max: f64) -> usize {
    if max <= 0.0 || amount <= 0.0 || !amount.is_finite() {
        return 0;
    }
    ((amount / max) * MAX_BAR_WIDTH as f64).round() as usize
}

/// One bar per record, sized by its first metric. Records without metrics
/// get an empty bar.
pub fn render(records: &[ServiceRecord], out: &mut dyn Write) -> io::Result<()> {
    let metric = records
        .iter()
        .find_map(ServiceRecord::primary_metric)
        .map_or("cost", |m| m.name.as_str());
    writeln!(out, "{}", format!("{metric} by group").cyan().bold())?;

    let max = records
        .iter()
        .filter_map(|r| r.primary_metric().map(|m| m.amount))
        .filter(|a| a.is_finite())
        .fold(0.0_f64, f64::max);

    let labels: Vec<String> = records.iter().map(label).collect();
    let pad = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    for (record, label) in records.iter().zip(&labels) {
        let (width, value) = record
            .primary_metric()
            .map_or((0, String::new()), |m| {
                (bar_width(m.amount, max), format!("{:.2} {}", m.amount, m.unit))
            });
        writeln!(
            out,
            "{label:<pad$} │ {} {}",
            BAR.repeat(width).green(),
            value.dimmed()
        )?;
    }

    Ok(())
}
