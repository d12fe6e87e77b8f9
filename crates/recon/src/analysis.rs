//! Deterministic explanations attached to exported rows.

use crate::model::{Discrepancy, Disposition};

/// Likely cause of a discrepancy, phrased for an operator.
pub fn probable_reason(d: &Discrepancy) -> String {
    let field = |name: &str| d.details.get(name);

    match d.disposition {
        Disposition::Matched => "No issue detected.".into(),
        Disposition::MissingInGateway => "Internal record exists but was not found in the gateway feed. \
             Possible cause: failed API callback, unprocessed webhook, or gateway delay."
            .into(),
        Disposition::MissingInInternal => "Transaction found in the gateway feed but missing internally. \
             Possible cause: failed DB write, timeout after payment success, or system crash."
            .into(),
        Disposition::AmountMismatch => {
            if let Some(currency) = field("currency") {
                format!(
                    "Currency differs (Internal: {}, Gateway: {}). \
                     Likely a config error or wrong payment channel mapping.",
                    currency.internal.as_deref().unwrap_or("N/A"),
                    currency.gateway.as_deref().unwrap_or("N/A"),
                )
            } else {
                let amount = field("amount");
                format!(
                    "Amounts differ (Internal: {}, Gateway: {}). \
                     Possible minor-unit scaling error, fee deduction, or partial capture.",
                    amount.and_then(|a| a.internal.as_deref()).unwrap_or("N/A"),
                    amount.and_then(|a| a.gateway.as_deref()).unwrap_or("N/A"),
                )
            }
        }
        Disposition::StatusMismatch => format!(
            "Status differs (Internal: {}, Gateway: {}). \
             Likely a delayed webhook update or a manual override.",
            d.status_internal().unwrap_or("N/A"),
            d.status_gateway().unwrap_or("N/A"),
        ),
        Disposition::TimestampDrift => format!(
            "Timestamps differ by {}s beyond tolerance. \
             Possible timezone misconfiguration or delayed settlement posting.",
            d.drift_secs.map(|s| s.abs()).unwrap_or(0),
        ),
        Disposition::DuplicateRecord => "Transaction id appears more than once in the same source. \
             Possible double write, retried webhook, or export overlap."
            .into(),
    }
}

/// What to do about it.
pub fn suggested_action(d: &Discrepancy) -> &'static str {
    match d.disposition {
        Disposition::Matched => "No action required.",
        Disposition::MissingInGateway => {
            "Verify whether the gateway webhook/API callback was received; retry if necessary."
        }
        Disposition::MissingInInternal => "Re-fetch the transaction from the gateway and reinsert it into the DB.",
        Disposition::AmountMismatch if d.details.contains_key("currency") => {
            "Check currency mapping and payment channel configuration."
        }
        Disposition::AmountMismatch => "Escalate to finance for manual review.",
        Disposition::StatusMismatch => "Sync statuses by calling the gateway verify endpoint.",
        Disposition::TimestampDrift => "Check source timezone settings and the configured drift tolerance.",
        Disposition::DuplicateRecord => "Deduplicate the source records before the next run.",
    }
}
