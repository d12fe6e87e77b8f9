//! Serialize a finished report: full JSON, or one CSV row per discrepancy.

use std::io::Write;

use crate::analysis::{probable_reason, suggested_action};
use crate::error::ReconError;
use crate::model::{Discrepancy, Report};

pub const CSV_HEADER: [&str; 8] = [
    "tx_id",
    "amount",
    "status_internal",
    "status_gateway",
    "match_status",
    "details",
    "probable_reason",
    "suggested_action",
];

pub fn to_json(report: &Report) -> Result<String, ReconError> {
    serde_json::to_string_pretty(report).map_err(|e| ReconError::Io(format!("JSON serialization error: {e}")))
}

/// Header is always written, even for an empty report.
pub fn write_csv(report: &Report, writer: impl Write) -> Result<(), ReconError> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(CSV_HEADER)
        .map_err(|e| ReconError::Io(format!("CSV write error: {e}")))?;

    for d in &report.details {
        let amount = d.amount().map(|a| a.to_string()).unwrap_or_default();
        let details = render_details(d);
        let reason = probable_reason(d);
        let row: [&str; 8] = [
            &d.tx_id,
            &amount,
            d.status_internal().unwrap_or(""),
            d.status_gateway().unwrap_or(""),
            d.disposition.as_str(),
            &details,
            &reason,
            suggested_action(d),
        ];
        csv.write_record(row)
            .map_err(|e| ReconError::Io(format!("CSV write error: {e}")))?;
    }

    csv.flush().map_err(|e| ReconError::Io(format!("CSV flush error: {e}")))?;
    Ok(())
}

/// `field: internal -> gateway` joined by `; `. Absent sides print `-`.
pub fn render_details(d: &Discrepancy) -> String {
    d.details
        .iter()
        .map(|(field, diff)| {
            format!(
                "{field}: {} -> {}",
                diff.internal.as_deref().unwrap_or("-"),
                diff.gateway.as_deref().unwrap_or("-"),
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}
