//! Fixed-layout text report for newly seen records.

use chrono::{DateTime, Utc};

use crate::record::StoredRecord;

const FRAME_WIDTH: usize = 60;
const SEPARATOR_WIDTH: usize = 40;

/// Render the report block.
///
/// `records` are printed in the order given; `total` is the size of the full
/// set fetched on this tick, not just the new records.
pub fn render_report(records: &[StoredRecord], total: usize, rendered_at: DateTime<Utc>) -> String {
    let frame = "=".repeat(FRAME_WIDTH);
    let separator = "-".repeat(SEPARATOR_WIDTH);

    let mut lines = Vec::with_capacity(records.len() * 5 + 5);
    lines.push(frame.clone());
    lines.push(format!(
        "Repository Data Update - {}",
        rendered_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(frame.clone());

    for stored in records {
        let record = &stored.record;
        lines.push(format!("Author: {}", record.author));
        lines.push(format!("Pushed to: {}", record.pushed_to));
        lines.push(format!("On: {}", format_event_time(&record.on)));
        lines.push(format!("Sample: {}", record.sample));
        lines.push(separator.clone());
    }

    lines.push(format!("Total records: {}", total));
    lines.push(frame);

    lines.join("\n")
}

/// `15 Apr 2024 - 10:30 UTC` for RFC 3339 input, anything else verbatim.
pub fn format_event_time(on: &str) -> String {
    match DateTime::parse_from_rfc3339(on) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .format("%d %b %Y - %H:%M UTC")
            .to_string(),
        Err(_) => on.to_string(),
    }
}
