//! Normalizer: coerce mapped fields into comparable canonical values.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::error::{NormalizationError, ReconError};
use crate::model::{CanonicalTransaction, MappedRecord, RawValue};

// ---------------------------------------------------------------------------
// Status vocabulary
// ---------------------------------------------------------------------------

/// Source status token → canonical status token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusVocabulary {
    aliases: HashMap<String, String>,
    canonical: BTreeSet<String>,
}

const BUILTIN_VOCABULARY: &[(&str, &[&str])] = &[
    ("success", &["succeeded", "successful", "paid", "completed", "complete", "settled"]),
    ("failed", &["failure", "declined", "abandoned", "reversed", "error", "canceled", "cancelled"]),
    ("pending", &["processing", "ongoing", "queued", "requires_action", "in_progress"]),
];

impl StatusVocabulary {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut vocab = Self::empty();
        for (canonical, aliases) in BUILTIN_VOCABULARY {
            vocab.canonical.insert((*canonical).to_string());
            vocab.aliases.insert((*canonical).to_string(), (*canonical).to_string());
            for alias in *aliases {
                vocab.aliases.insert((*alias).to_string(), (*canonical).to_string());
            }
        }
        vocab
    }

    /// Register `canonical` and its aliases. A token may belong to one
    /// canonical status only.
    pub fn extend<S: AsRef<str>>(&mut self, canonical: &str, aliases: &[S]) -> Result<(), ReconError> {
        let canonical = fold(canonical);
        if canonical.is_empty() {
            return Err(ReconError::ConfigValidation(
                "status_vocabulary: canonical status must not be empty".into(),
            ));
        }

        let tokens = std::iter::once(canonical.clone()).chain(aliases.iter().map(|a| fold(a.as_ref())));
        for token in tokens {
            if token.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "status_vocabulary.{canonical}: alias must not be empty"
                )));
            }
            match self.aliases.get(&token) {
                Some(existing) if *existing != canonical => {
                    return Err(ReconError::ConfigValidation(format!(
                        "status_vocabulary: token '{token}' maps to both '{existing}' and '{canonical}'"
                    )));
                }
                _ => {
                    self.aliases.insert(token, canonical.clone());
                }
            }
        }
        self.canonical.insert(canonical);
        Ok(())
    }

    /// Canonical form of an already-folded token, if known.
    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.aliases.get(token).map(|s| s.as_str())
    }

    pub fn canonical_statuses(&self) -> impl Iterator<Item = &str> {
        self.canonical.iter().map(|s| s.as_str())
    }
}

fn fold(token: &str) -> String {
    token.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Epoch integers at or above this magnitude are taken as milliseconds.
const EPOCH_MILLIS_THRESHOLD: u64 = 100_000_000_000;

/// Digit runs shorter than this are never read as epoch seconds.
const EPOCH_MIN_DIGITS: usize = 10;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

pub struct Normalizer<'a> {
    vocabulary: &'a StatusVocabulary,
    default_offset: FixedOffset,
}

impl<'a> Normalizer<'a> {
    pub fn new(vocabulary: &'a StatusVocabulary, default_offset: FixedOffset) -> Self {
        Self {
            vocabulary,
            default_offset,
        }
    }

    /// Coerce one mapped record. `minor_units` is the schema's amount exponent.
    pub fn normalize(
        &self,
        mapped: MappedRecord,
        minor_units: u32,
    ) -> Result<CanonicalTransaction, NormalizationError> {
        let amount = normalize_amount(&mapped.amount, minor_units)?;
        let currency = normalize_currency(&mapped.currency)?;
        let (status, status_recognized) = self.normalize_status(&mapped.status)?;
        let (timestamp, timezone_assumed) = self.normalize_timestamp(&mapped.timestamp)?;

        Ok(CanonicalTransaction {
            tx_id: mapped.tx_id,
            amount,
            currency,
            status,
            timestamp,
            source: mapped.side,
            position: mapped.position,
            status_recognized,
            timezone_assumed,
        })
    }

    fn normalize_status(&self, value: &RawValue) -> Result<(String, bool), NormalizationError> {
        let token = match value {
            RawValue::Text(s) => fold(s),
            _ => String::new(),
        };
        if token.is_empty() {
            return Err(NormalizationError::EmptyStatus);
        }
        Ok(match self.vocabulary.lookup(&token) {
            Some(canonical) => (canonical.to_string(), true),
            None => (token, false),
        })
    }

    fn normalize_timestamp(&self, value: &RawValue) -> Result<(DateTime<Utc>, bool), NormalizationError> {
        match value {
            RawValue::Timestamp(t) => Ok((*t, false)),
            RawValue::Integer(n) if *n >= 0 => self.parse_digits(&n.to_string()),
            RawValue::Integer(n) => Err(NormalizationError::BadTimestamp(n.to_string())),
            RawValue::Text(s) => self.parse_timestamp_text(s.trim()),
            other => Err(NormalizationError::BadTimestamp(other.type_name().to_string())),
        }
    }

    /// A bare digit run: compact `YYYYMMDD` or `YYYYMMDDhhmmss`, otherwise
    /// epoch seconds or milliseconds when long enough to be one.
    fn parse_digits(&self, s: &str) -> Result<(DateTime<Utc>, bool), NormalizationError> {
        let bad = || NormalizationError::BadTimestamp(s.to_string());

        let compact = match s.len() {
            8 => NaiveDate::parse_from_str(s, "%Y%m%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            14 => NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S").ok(),
            _ => None,
        };
        if let Some(naive) = compact {
            return self.localize(naive).ok_or_else(bad);
        }

        if s.len() < EPOCH_MIN_DIGITS {
            return Err(bad());
        }
        let n: i64 = s.parse().map_err(|_| bad())?;
        from_epoch(n).map(|t| (t, false)).ok_or_else(bad)
    }

    /// Read a naive wall-clock time in the default offset.
    fn localize(&self, naive: NaiveDateTime) -> Option<(DateTime<Utc>, bool)> {
        let local = self.default_offset.from_local_datetime(&naive).single()?;
        Some((local.with_timezone(&Utc), true))
    }

    fn parse_timestamp_text(&self, s: &str) -> Result<(DateTime<Utc>, bool), NormalizationError> {
        let bad = || NormalizationError::BadTimestamp(s.to_string());

        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return self.parse_digits(s);
        }

        if let Ok(t) = DateTime::parse_from_rfc3339(s) {
            return Ok((t.with_timezone(&Utc), false));
        }
        for fmt in OFFSET_FORMATS {
            if let Ok(t) = DateTime::parse_from_str(s, fmt) {
                return Ok((t.with_timezone(&Utc), false));
            }
        }

        let naive = NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(bad)?;

        self.localize(naive).ok_or_else(bad)
    }
}

fn from_epoch(n: i64) -> Option<DateTime<Utc>> {
    if n.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    }
}

/// Exact decimal, scaled down from minor units, never negative.
pub fn normalize_amount(value: &RawValue, minor_units: u32) -> Result<Decimal, NormalizationError> {
    let parsed = match value {
        RawValue::Integer(n) => Decimal::from(*n),
        RawValue::Decimal(d) => *d,
        RawValue::Text(s) => {
            let s = s.trim();
            Decimal::from_str_exact(s).map_err(|_| NormalizationError::MalformedAmount(s.to_string()))?
        }
        other => return Err(NormalizationError::MalformedAmount(other.type_name().to_string())),
    };

    let scaled = if minor_units == 0 {
        parsed
    } else {
        Decimal::try_new(1, minor_units)
            .ok()
            .and_then(|factor| parsed.checked_mul(factor))
            .ok_or_else(|| NormalizationError::MalformedAmount(parsed.to_string()))?
    };

    if scaled < Decimal::ZERO {
        return Err(NormalizationError::NegativeAmount(scaled.to_string()));
    }
    Ok(scaled.normalize())
}

/// Trimmed, uppercased, three ASCII letters.
pub fn normalize_currency(value: &RawValue) -> Result<String, NormalizationError> {
    let raw = match value {
        RawValue::Text(s) => s.as_str(),
        other => return Err(NormalizationError::BadCurrency(other.type_name().to_string())),
    };
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(NormalizationError::BadCurrency(raw.to_string()));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Side;
    use std::str::FromStr;

    fn mapped(amount: RawValue, status: &str, timestamp: RawValue) -> MappedRecord {
        MappedRecord {
            side: Side::Internal,
            position: 0,
            tx_id: "TXN001".into(),
            amount,
            currency: " ngn ".into(),
            status: status.into(),
            timestamp,
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn normalizes_all_fields() {
        let vocab = StatusVocabulary::builtin();
        let n = Normalizer::new(&vocab, utc());
        let tx = n
            .normalize(
                mapped("150.50".into(), " Succeeded ", "2026-01-15T10:00:00Z".into()),
                0,
            )
            .unwrap();
        assert_eq!(tx.amount, dec("150.5"));
        assert_eq!(tx.currency, "NGN");
        assert_eq!(tx.status, "success");
        assert!(tx.status_recognized);
        assert!(!tx.timezone_assumed);
        assert_eq!(tx.timestamp.to_rfc3339(), "2026-01-15T10:00:00+00:00");
    }

    #[test]
    fn amount_minor_units_exact() {
        assert_eq!(normalize_amount(&RawValue::Integer(1_500_000), 2).unwrap(), dec("15000"));
        assert_eq!(normalize_amount(&RawValue::Integer(1999), 2).unwrap(), dec("19.99"));
        assert_eq!(normalize_amount(&"0.10".into(), 0).unwrap(), dec("0.1"));
        // Sum of 0.1 ten times stays exact.
        let total: Decimal = (0..10).map(|_| normalize_amount(&"0.1".into(), 0).unwrap()).sum();
        assert_eq!(total, Decimal::ONE);
    }

    #[test]
    fn amount_errors() {
        assert_eq!(
            normalize_amount(&"-5".into(), 0),
            Err(NormalizationError::NegativeAmount("-5".into()))
        );
        assert!(matches!(
            normalize_amount(&"12,000".into(), 0),
            Err(NormalizationError::MalformedAmount(_))
        ));
        assert!(matches!(
            normalize_amount(&"".into(), 0),
            Err(NormalizationError::MalformedAmount(_))
        ));
        assert_eq!(normalize_amount(&"0".into(), 2).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn currency_rules() {
        assert_eq!(normalize_currency(&" usd".into()).unwrap(), "USD");
        assert!(normalize_currency(&"".into()).is_err());
        assert!(normalize_currency(&"US".into()).is_err());
        assert!(normalize_currency(&"U$D".into()).is_err());
        assert!(normalize_currency(&RawValue::Integer(840)).is_err());
    }

    #[test]
    fn unknown_status_passes_through_flagged() {
        let vocab = StatusVocabulary::builtin();
        let n = Normalizer::new(&vocab, utc());
        let tx = n
            .normalize(mapped("1".into(), "Chargeback", RawValue::Integer(1_700_000_000)), 0)
            .unwrap();
        assert_eq!(tx.status, "chargeback");
        assert!(!tx.status_recognized);
    }

    #[test]
    fn empty_status_rejected() {
        let vocab = StatusVocabulary::builtin();
        let n = Normalizer::new(&vocab, utc());
        let err = n
            .normalize(mapped("1".into(), "  ", RawValue::Integer(1_700_000_000)), 0)
            .unwrap_err();
        assert_eq!(err, NormalizationError::EmptyStatus);
    }

    #[test]
    fn naive_timestamp_gets_default_offset() {
        let vocab = StatusVocabulary::builtin();
        let lagos = FixedOffset::east_opt(3600).unwrap();
        let n = Normalizer::new(&vocab, lagos);
        let tx = n
            .normalize(mapped("1".into(), "paid", "2026-01-15 10:00:00".into()), 0)
            .unwrap();
        assert!(tx.timezone_assumed);
        assert_eq!(tx.timestamp.to_rfc3339(), "2026-01-15T09:00:00+00:00");

        let tx = n
            .normalize(mapped("1".into(), "paid", "2026-01-15".into()), 0)
            .unwrap();
        assert!(tx.timezone_assumed);
        assert_eq!(tx.timestamp.to_rfc3339(), "2026-01-14T23:00:00+00:00");
    }

    #[test]
    fn offset_timestamps_are_not_assumed() {
        let vocab = StatusVocabulary::builtin();
        let n = Normalizer::new(&vocab, utc());
        let (t, assumed) = n.normalize_timestamp(&"2026-01-15 10:00:00+01:00".into()).unwrap();
        assert!(!assumed);
        assert_eq!(t.to_rfc3339(), "2026-01-15T09:00:00+00:00");

        let (t, assumed) = n.normalize_timestamp(&"1700000000".into()).unwrap();
        assert!(!assumed);
        assert_eq!(t.timestamp(), 1_700_000_000);

        let (t, _) = n.normalize_timestamp(&RawValue::Integer(1_700_000_000_123)).unwrap();
        assert_eq!(t.timestamp_millis(), 1_700_000_000_123);

        let (t, assumed) = n.normalize_timestamp(&"2026-01-15T10:00:00+0100".into()).unwrap();
        assert!(!assumed);
        assert_eq!(t.to_rfc3339(), "2026-01-15T09:00:00+00:00");
    }

    #[test]
    fn compact_dates_are_not_epochs() {
        let vocab = StatusVocabulary::builtin();
        let lagos = FixedOffset::east_opt(3600).unwrap();
        let n = Normalizer::new(&vocab, lagos);

        let (t, assumed) = n.normalize_timestamp(&"20260115".into()).unwrap();
        assert!(assumed);
        assert_eq!(t.to_rfc3339(), "2026-01-14T23:00:00+00:00");

        let (t, assumed) = n.normalize_timestamp(&RawValue::Integer(20260115)).unwrap();
        assert!(assumed);
        assert_eq!(t.to_rfc3339(), "2026-01-14T23:00:00+00:00");

        let (t, assumed) = n.normalize_timestamp(&"20260115103000".into()).unwrap();
        assert!(assumed);
        assert_eq!(t.to_rfc3339(), "2026-01-15T09:30:00+00:00");

        for short in ["12345", "20261345", "123456789"] {
            assert_eq!(
                n.normalize_timestamp(&short.into()),
                Err(NormalizationError::BadTimestamp(short.into())),
                "{short}"
            );
        }
        assert!(n.normalize_timestamp(&RawValue::Integer(-5)).is_err());
    }

    #[test]
    fn bad_timestamp() {
        let vocab = StatusVocabulary::builtin();
        let n = Normalizer::new(&vocab, utc());
        let err = n
            .normalize(mapped("1".into(), "paid", "yesterday".into()), 0)
            .unwrap_err();
        assert_eq!(err, NormalizationError::BadTimestamp("yesterday".into()));
    }

    #[test]
    fn vocabulary_extend() {
        let mut vocab = StatusVocabulary::builtin();
        vocab.extend("success", &["Approved"]).unwrap();
        vocab.extend("refunded", &["refund"]).unwrap();
        assert_eq!(vocab.lookup("approved"), Some("success"));
        assert_eq!(vocab.lookup("refund"), Some("refunded"));
        assert_eq!(vocab.lookup("refunded"), Some("refunded"));
        assert!(vocab.canonical_statuses().any(|s| s == "refunded"));

        let err = vocab.extend("pending", &["declined"]).unwrap_err();
        assert!(err.to_string().contains("'declined'"));
        assert!(vocab.extend("", &["x"]).is_err());
        assert!(vocab.extend("held", &[" "]).is_err());
    }
}
