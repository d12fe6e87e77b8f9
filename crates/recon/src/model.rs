use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which ledger a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Internal,
    Gateway,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::Gateway => write!(f, "gateway"),
        }
    }
}

/// A single untyped value as handed over by a data source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
}

impl RawValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::Timestamp(_) => "timestamp",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<Decimal> for RawValue {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

/// Source-specific field name → value. Read-only to the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: HashMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Ordered records from one side, tagged with the schema that describes them.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub schema: String,
    pub records: Vec<RawRecord>,
}

impl SourceBatch {
    pub fn new(schema: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            schema: schema.into(),
            records,
        }
    }
}

/// Both sides of one reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconInput {
    pub internal: SourceBatch,
    pub gateway: SourceBatch,
}

// ---------------------------------------------------------------------------
// Mapping + normalization
// ---------------------------------------------------------------------------

/// A raw record after schema renaming, before type coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub side: Side,
    pub position: usize,
    pub tx_id: String,
    pub amount: RawValue,
    pub currency: RawValue,
    pub status: RawValue,
    pub timestamp: RawValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalTransaction {
    pub tx_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub source: Side,
    /// Index in the source's input order.
    pub position: usize,
    /// False when the status token wasn't in the vocabulary.
    pub status_recognized: bool,
    /// True when the default timezone was applied to a naive timestamp.
    pub timezone_assumed: bool,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Association of at most one transaction per side. The shape rules out
/// a pair with both sides absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPair {
    Both {
        internal: CanonicalTransaction,
        gateway: CanonicalTransaction,
    },
    InternalOnly(CanonicalTransaction),
    GatewayOnly(CanonicalTransaction),
    /// A repeat occurrence of a tx_id within one side; never paired.
    Duplicate(CanonicalTransaction),
}

impl MatchPair {
    pub fn tx_id(&self) -> &str {
        match self {
            Self::Both { internal, .. } => &internal.tx_id,
            Self::InternalOnly(tx) | Self::GatewayOnly(tx) | Self::Duplicate(tx) => &tx.tx_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Matched,
    MissingInGateway,
    MissingInInternal,
    AmountMismatch,
    StatusMismatch,
    TimestampDrift,
    DuplicateRecord,
}

impl Disposition {
    pub const ALL: [Disposition; 7] = [
        Self::Matched,
        Self::MissingInGateway,
        Self::MissingInInternal,
        Self::AmountMismatch,
        Self::StatusMismatch,
        Self::TimestampDrift,
        Self::DuplicateRecord,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::MissingInGateway => "missing_in_gateway",
            Self::MissingInInternal => "missing_in_internal",
            Self::AmountMismatch => "amount_mismatch",
            Self::StatusMismatch => "status_mismatch",
            Self::TimestampDrift => "timestamp_drift",
            Self::DuplicateRecord => "duplicate_record",
        }
    }

    pub fn is_issue(&self) -> bool {
        *self != Self::Matched
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both sides' rendering of one differing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub internal: Option<String>,
    pub gateway: Option<String>,
}

/// Data-quality notes that don't change the disposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Flag {
    UnrecognizedStatus { side: Side, status: String },
    TimezoneAssumed { side: Side },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub tx_id: String,
    pub disposition: Disposition,
    /// Canonical field name → both values. Empty for `matched`.
    pub details: BTreeMap<String, FieldDiff>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<Flag>,
    /// Signed internal − gateway timestamp difference, when both exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_secs: Option<i64>,
    pub internal: Option<CanonicalTransaction>,
    pub gateway: Option<CanonicalTransaction>,
}

impl Discrepancy {
    /// Amount for row-oriented output: internal side first, gateway as fallback.
    pub fn amount(&self) -> Option<Decimal> {
        self.internal
            .as_ref()
            .or(self.gateway.as_ref())
            .map(|tx| tx.amount)
    }

    pub fn status_internal(&self) -> Option<&str> {
        self.internal.as_ref().map(|tx| tx.status.as_str())
    }

    pub fn status_gateway(&self) -> Option<&str> {
        self.gateway.as_ref().map(|tx| tx.status.as_str())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A record that could not be mapped or normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnprocessableRecord {
    pub side: Side,
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub issues: usize,
    pub unprocessable: usize,
    /// Every disposition is present, zero-filled.
    pub counts: BTreeMap<Disposition, usize>,
}

impl ReportSummary {
    pub fn count(&self, disposition: Disposition) -> usize {
        self.counts.get(&disposition).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportMeta {
    pub config_name: String,
    pub internal_schema: String,
    pub gateway_schema: String,
    pub engine_version: String,
    pub drift_tolerance_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub summary: ReportSummary,
    /// One row per match pair, in matcher order.
    pub details: Vec<Discrepancy>,
    pub unprocessable: Vec<UnprocessableRecord>,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    /// Rows whose disposition is anything but `matched`.
    pub fn issues(&self) -> impl Iterator<Item = &Discrepancy> {
        self.details.iter().filter(|d| d.disposition.is_issue())
    }

    pub fn is_clean(&self) -> bool {
        self.summary.issues == 0 && self.unprocessable.is_empty()
    }
}
