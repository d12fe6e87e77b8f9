//! Plain-text digest of a report, suitable for a chat channel or terminal.

use std::fmt::Write;

use crate::analysis::{probable_reason, suggested_action};
use crate::model::{Disposition, Report};

pub fn render_summary(report: &Report) -> String {
    let mut out = String::new();
    let date = report.generated_at.format("%Y-%m-%d");

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Reconciliation report: {} ({date})", report.meta.config_name);
    let _ = writeln!(
        out,
        "{} rows, {} issues, {} unprocessable",
        report.summary.total, report.summary.issues, report.summary.unprocessable
    );
    out.push('\n');

    for disposition in Disposition::ALL {
        let _ = writeln!(out, "  {:<20} {}", disposition.as_str(), report.summary.count(disposition));
    }

    let mut issues = report.issues().peekable();
    if issues.peek().is_some() {
        out.push('\n');
        out.push_str("Issues:\n");
    }
    for d in issues {
        let _ = writeln!(out, "- {} [{}]", d.tx_id, d.disposition);
        let _ = writeln!(
            out,
            "    status: internal={} gateway={}",
            d.status_internal().unwrap_or("N/A"),
            d.status_gateway().unwrap_or("N/A"),
        );
        let _ = writeln!(out, "    reason: {}", probable_reason(d));
        let _ = writeln!(out, "    action: {}", suggested_action(d));
    }

    if !report.unprocessable.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "Unprocessable records: {}", report.unprocessable.len());
        for u in &report.unprocessable {
            let _ = writeln!(
                out,
                "- {} #{}{}: {}",
                u.side,
                u.position,
                u.tx_id.as_deref().map(|id| format!(" ({id})")).unwrap_or_default(),
                u.message
            );
        }
    }

    out
}
