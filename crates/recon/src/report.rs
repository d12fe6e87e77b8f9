use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{Discrepancy, Disposition, Report, ReportMeta, ReportSummary, UnprocessableRecord};

/// Finalize a report stamped with the current time.
pub fn build_report(
    meta: ReportMeta,
    details: Vec<Discrepancy>,
    unprocessable: Vec<UnprocessableRecord>,
) -> Report {
    build_report_at(meta, details, unprocessable, Utc::now())
}

/// Finalize a report with an explicit timestamp. Same input, same report.
pub fn build_report_at(
    meta: ReportMeta,
    details: Vec<Discrepancy>,
    unprocessable: Vec<UnprocessableRecord>,
    generated_at: DateTime<Utc>,
) -> Report {
    let summary = compute_summary(&details, unprocessable.len());
    Report {
        meta,
        summary,
        details,
        unprocessable,
        generated_at,
    }
}

/// Count rows per disposition. Every disposition gets a key.
pub fn compute_summary(details: &[Discrepancy], unprocessable: usize) -> ReportSummary {
    let mut counts: BTreeMap<Disposition, usize> = Disposition::ALL.iter().map(|d| (*d, 0)).collect();
    for d in details {
        *counts.entry(d.disposition).or_insert(0) += 1;
    }

    ReportSummary {
        total: details.len(),
        issues: details.len() - counts[&Disposition::Matched],
        unprocessable,
        counts,
    }
}
