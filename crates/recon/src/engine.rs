use crate::classify::Classifier;
use crate::config::ReconConfig;
use crate::error::{ReconError, RecordError};
use crate::mapper::{map_record, map_tx_id};
use crate::matcher::{match_with_rejected, RejectedIds};
use crate::model::{CanonicalTransaction, ReconInput, Report, ReportMeta, Side, SourceBatch, UnprocessableRecord};
use crate::normalize::Normalizer;
use crate::report::build_report;
use crate::schema::SchemaRegistry;

/// Run one reconciliation: map and normalize both sides, pair by tx_id,
/// classify every pair, and assemble the report.
///
/// Fatal errors (unknown schema, bad vocabulary or timezone) abort before
/// matching. Records that fail mapping or normalization are listed in
/// `Report::unprocessable` and the run continues without them. A rejected
/// record whose id could be read still counts as that id's first
/// occurrence, so later copies on its side are reported as duplicates.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<Report, ReconError> {
    let registry = config.schema_registry();
    registry.validate()?;
    let vocabulary = config.vocabulary()?;
    let normalizer = Normalizer::new(&vocabulary, config.default_offset()?);

    log::info!(
        "recon '{}': {} internal ({}), {} gateway ({})",
        config.name,
        input.internal.records.len(),
        input.internal.schema,
        input.gateway.records.len(),
        input.gateway.schema,
    );

    let mut unprocessable = Vec::new();
    let (internal, rejected_internal) =
        canonicalize(Side::Internal, &input.internal, &registry, &normalizer, &mut unprocessable)?;
    let (gateway, rejected_gateway) =
        canonicalize(Side::Gateway, &input.gateway, &registry, &normalizer, &mut unprocessable)?;
    log::debug!(
        "normalized {} internal, {} gateway, {} unprocessable",
        internal.len(),
        gateway.len(),
        unprocessable.len()
    );

    let pairs = match_with_rejected(internal, gateway, &rejected_internal, &rejected_gateway);
    log::debug!("matched into {} pairs", pairs.len());

    let details = Classifier::from_config(config).classify_all(pairs);

    let meta = ReportMeta {
        config_name: config.name.clone(),
        internal_schema: input.internal.schema.clone(),
        gateway_schema: input.gateway.schema.clone(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        drift_tolerance_secs: config.tolerance.drift_secs,
    };
    let report = build_report(meta, details, unprocessable);

    log::info!(
        "recon '{}' done: {} rows, {} issues, {} unprocessable",
        config.name,
        report.summary.total,
        report.summary.issues,
        report.summary.unprocessable,
    );
    Ok(report)
}

/// Map + normalize one side. Failures go to `unprocessable`; the
/// survivors keep their input order. Also returns where each readable
/// id was first rejected.
fn canonicalize(
    side: Side,
    batch: &SourceBatch,
    registry: &SchemaRegistry,
    normalizer: &Normalizer<'_>,
    unprocessable: &mut Vec<UnprocessableRecord>,
) -> Result<(Vec<CanonicalTransaction>, RejectedIds), ReconError> {
    let schema = registry.get(&batch.schema).ok_or_else(|| ReconError::UnknownSchema {
        side,
        schema: batch.schema.clone(),
    })?;

    let mut out = Vec::with_capacity(batch.records.len());
    let mut rejected = RejectedIds::new();
    for (position, raw) in batch.records.iter().enumerate() {
        let mapped = match map_record(raw, schema, side, position) {
            Ok(m) => m,
            Err(e) => {
                let tx_id = map_tx_id(raw, schema).ok();
                if let Some(id) = &tx_id {
                    rejected.entry(id.clone()).or_insert(position);
                }
                reject(unprocessable, side, position, tx_id, e.into());
                continue;
            }
        };

        let tx_id = mapped.tx_id.clone();
        match normalizer.normalize(mapped, schema.amount_minor_units) {
            Ok(tx) => out.push(tx),
            Err(e) => {
                rejected.entry(tx_id.clone()).or_insert(position);
                reject(unprocessable, side, position, Some(tx_id), e.into());
            }
        }
    }
    Ok((out, rejected))
}

fn reject(
    unprocessable: &mut Vec<UnprocessableRecord>,
    side: Side,
    position: usize,
    tx_id: Option<String>,
    error: RecordError,
) {
    log::warn!(
        "{side} record {position}{}: {error}",
        tx_id.as_deref().map(|id| format!(" ({id})")).unwrap_or_default()
    );
    unprocessable.push(UnprocessableRecord {
        side,
        position,
        tx_id,
        kind: error.kind(),
        message: error.to_string(),
    });
}
