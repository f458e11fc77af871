//! CSV sink.

use std::io::{self, Write};

use crate::query::Granularity;
use crate::report::ServiceRecord;

/// Column order of every CSV report.
pub const HEADER: [&str; 8] = [
    "Dimension/Tag",
    "Dimension/Tag",
    "Metric",
    "Granularity",
    "Start",
    "End",
    "USD Amount",
    "Unit",
];

/// Write the header, then one row per metric per record.
pub fn render(
    records: &[ServiceRecord],
    granularity: Granularity,
    out: &mut dyn Write,
) -> io::Result<()> {
    let mut writer = ::csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;

    let granularity = granularity.to_string();
    for record in records {
        for metric in &record.metrics {
            writer.write_record([
                record.key(0),
                record.key(1),
                metric.name.as_str(),
                granularity.as_str(),
                record.start.as_str(),
                record.end.as_str(),
                metric.amount_text.as_str(),
                metric.unit.as_str(),
            ])?;
        }
    }

    writer.flush()
}
