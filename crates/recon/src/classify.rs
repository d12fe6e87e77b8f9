use std::collections::BTreeMap;

use chrono::{Duration, SecondsFormat};

use crate::config::ReconConfig;
use crate::model::{CanonicalTransaction, Discrepancy, Disposition, FieldDiff, Flag, MatchPair, Side};

/// Assigns exactly one disposition to every match pair.
#[derive(Debug, Clone)]
pub struct Classifier {
    drift_tolerance: Duration,
    naive_timezone_slack: Duration,
}

impl Classifier {
    pub fn new(drift_tolerance: Duration, naive_timezone_slack: Duration) -> Self {
        Self {
            drift_tolerance,
            naive_timezone_slack,
        }
    }

    pub fn from_config(config: &ReconConfig) -> Self {
        Self::new(config.drift_tolerance(), config.naive_timezone_slack())
    }

    pub fn classify_all(&self, pairs: Vec<MatchPair>) -> Vec<Discrepancy> {
        pairs.into_iter().map(|p| self.classify(p)).collect()
    }

    /// Priority: missing sides, then amount/currency, then status, then
    /// timestamp drift. Every differing field is recorded in `details`,
    /// whichever disposition wins.
    pub fn classify(&self, pair: MatchPair) -> Discrepancy {
        match pair {
            MatchPair::InternalOnly(tx) => one_sided(Disposition::MissingInGateway, tx),
            MatchPair::GatewayOnly(tx) => one_sided(Disposition::MissingInInternal, tx),
            MatchPair::Duplicate(tx) => one_sided(Disposition::DuplicateRecord, tx),
            MatchPair::Both { internal, gateway } => self.classify_both(internal, gateway),
        }
    }

    fn classify_both(&self, internal: CanonicalTransaction, gateway: CanonicalTransaction) -> Discrepancy {
        let mut details = BTreeMap::new();

        let amount_differs = internal.amount != gateway.amount;
        let currency_differs = internal.currency != gateway.currency;
        let status_differs = internal.status != gateway.status;

        if amount_differs {
            details.insert("amount".to_string(), diff(internal.amount.to_string(), gateway.amount.to_string()));
        }
        if currency_differs {
            details.insert("currency".to_string(), diff(internal.currency.clone(), gateway.currency.clone()));
        }
        if status_differs {
            details.insert("status".to_string(), diff(internal.status.clone(), gateway.status.clone()));
        }

        let drift = internal.timestamp - gateway.timestamp;
        let mut tolerance = self.drift_tolerance;
        if internal.timezone_assumed || gateway.timezone_assumed {
            tolerance = tolerance.checked_add(&self.naive_timezone_slack).unwrap_or(tolerance);
        }
        let drifted = drift.abs() > tolerance;
        if drifted {
            details.insert(
                "timestamp".to_string(),
                diff(render_instant(&internal), render_instant(&gateway)),
            );
        }

        let disposition = if amount_differs || currency_differs {
            Disposition::AmountMismatch
        } else if status_differs {
            Disposition::StatusMismatch
        } else if drifted {
            Disposition::TimestampDrift
        } else {
            Disposition::Matched
        };

        let mut flags = Vec::new();
        push_flags(&mut flags, &internal);
        push_flags(&mut flags, &gateway);

        Discrepancy {
            tx_id: internal.tx_id.clone(),
            disposition,
            details,
            flags,
            drift_secs: Some(drift.num_seconds()),
            internal: Some(internal),
            gateway: Some(gateway),
        }
    }
}

/// Missing or duplicate: every field of the present side, nothing opposite.
fn one_sided(disposition: Disposition, tx: CanonicalTransaction) -> Discrepancy {
    let side = tx.source;
    let present = |value: String| match side {
        Side::Internal => FieldDiff {
            internal: Some(value),
            gateway: None,
        },
        Side::Gateway => FieldDiff {
            internal: None,
            gateway: Some(value),
        },
    };

    let mut details = BTreeMap::new();
    details.insert("amount".to_string(), present(tx.amount.to_string()));
    details.insert("currency".to_string(), present(tx.currency.clone()));
    details.insert("status".to_string(), present(tx.status.clone()));
    details.insert("timestamp".to_string(), present(render_instant(&tx)));

    let mut flags = Vec::new();
    push_flags(&mut flags, &tx);

    let tx_id = tx.tx_id.clone();
    let (internal, gateway) = match side {
        Side::Internal => (Some(tx), None),
        Side::Gateway => (None, Some(tx)),
    };

    Discrepancy {
        tx_id,
        disposition,
        details,
        flags,
        drift_secs: None,
        internal,
        gateway,
    }
}

fn push_flags(flags: &mut Vec<Flag>, tx: &CanonicalTransaction) {
    if !tx.status_recognized {
        flags.push(Flag::UnrecognizedStatus {
            side: tx.source,
            status: tx.status.clone(),
        });
    }
    if tx.timezone_assumed {
        flags.push(Flag::TimezoneAssumed { side: tx.source });
    }
}

fn diff(internal: String, gateway: String) -> FieldDiff {
    FieldDiff {
        internal: Some(internal),
        gateway: Some(gateway),
    }
}

fn render_instant(tx: &CanonicalTransaction) -> String {
    tx.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
