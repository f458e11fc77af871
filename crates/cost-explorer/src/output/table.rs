//! Ranked terminal tables.

use std::io::{self, Write};

use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::query::Granularity;
use crate::report::{Forecast, ServiceRecord};

const HEADERS: [&str; 10] = [
    "Rank",
    "Dimension/Tag",
    "Dimension/Tag",
    "Metric",
    "Granularity",
    "Start",
    "End",
    "USD Amount",
    "Unit",
    "Rounded",
];

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect()
}

/// One ranked row per metric per record, plus a running-total footer.
#[must_use]
pub fn cost_table(records: &[ServiceRecord], granularity: Granularity) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&HEADERS));

    let mut rank = 0usize;
    let mut total = 0.0f64;

    for record in records {
        for metric in &record.metrics {
            rank += 1;
            total += metric.amount;
            table.add_row(vec![
                Cell::new(rank),
                Cell::new(record.key(0)),
                Cell::new(record.key(1)),
                Cell::new(&metric.name),
                Cell::new(granularity),
                Cell::new(&record.start),
                Cell::new(&record.end),
                Cell::new(&metric.amount_text).set_alignment(CellAlignment::Right),
                Cell::new(&metric.unit),
                Cell::new(format!("{:.2}", metric.amount)).set_alignment(CellAlignment::Right),
            ]);
        }
    }

    let mut footer = vec![Cell::new(""); HEADERS.len()];
    footer[1] = Cell::new("Total").fg(Color::Green);
    footer[9] = Cell::new(format!("{total:.2}"))
        .fg(Color::Green)
        .set_alignment(CellAlignment::Right);
    table.add_row(footer);

    table
}

pub fn render(
    records: &[ServiceRecord],
    granularity: Granularity,
    out: &mut dyn Write,
) -> io::Result<()> {
    writeln!(out, "{}", cost_table(records, granularity))
}

/// Forecast buckets with their prediction interval, and the total when present.
#[must_use]
pub fn forecast_table(forecast: &Forecast) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["Start", "End", "Mean", "Lower Bound", "Upper Bound"]));

    for point in &forecast.points {
        table.add_row(vec![
            Cell::new(&point.start),
            Cell::new(&point.end),
            Cell::new(format!("{:.2}", point.mean)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", point.lower_bound)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", point.upper_bound)).set_alignment(CellAlignment::Right),
        ]);
    }

    if let Some(total) = &forecast.total {
        table.add_row(vec![
            Cell::new("Total").fg(Color::Green),
            Cell::new(&total.unit),
            Cell::new(format!("{:.2}", total.amount))
                .fg(Color::Green)
                .set_alignment(CellAlignment::Right),
            Cell::new(""),
            Cell::new(""),
        ]);
    }

    table
}

pub fn render_forecast(forecast: &Forecast, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", forecast_table(forecast))
}
