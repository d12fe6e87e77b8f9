use std::collections::BTreeMap;

use chrono::FixedOffset;
use serde::Deserialize;

use crate::error::ReconError;
use crate::model::Side;
use crate::normalize::StatusVocabulary;
use crate::schema::{Schema, SchemaRegistry};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    /// Canonical status → extra source tokens.
    #[serde(default)]
    pub status_vocabulary: BTreeMap<String, Vec<String>>,
    /// User schemas; a name shared with a built-in replaces it.
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub internal: SourceConfig,
    pub gateway: SourceConfig,
}

impl SourcesConfig {
    pub fn get(&self, side: Side) -> &SourceConfig {
        match side {
            Side::Internal => &self.internal,
            Side::Gateway => &self.gateway,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub schema: String,
    /// Record file, resolved by the caller. The engine never reads it.
    #[serde(default)]
    pub file: Option<String>,
}

// ---------------------------------------------------------------------------
// Tolerance + normalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceConfig {
    #[serde(default = "default_drift_secs")]
    pub drift_secs: u64,
    /// Added to `drift_secs` when either side's timezone was assumed.
    #[serde(default)]
    pub naive_timezone_slack_secs: u64,
}

fn default_drift_secs() -> u64 {
    300
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            drift_secs: default_drift_secs(),
            naive_timezone_slack_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeConfig {
    /// Fixed UTC offset applied to naive timestamps: "UTC", "+01:00", "-0500".
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    /// Start from the built-in status vocabulary before applying
    /// `[status_vocabulary]`.
    #[serde(default = "default_true")]
    pub builtin_vocabulary: bool,
}

fn default_timezone() -> String {
    "UTC".into()
}

fn default_true() -> bool {
    true
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            builtin_vocabulary: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    /// Config with default tolerance, UTC and the built-in vocabulary.
    pub fn new(name: &str, internal_schema: &str, gateway_schema: &str) -> Self {
        Self {
            name: name.into(),
            sources: SourcesConfig {
                internal: SourceConfig {
                    schema: internal_schema.into(),
                    file: None,
                },
                gateway: SourceConfig {
                    schema: gateway_schema.into(),
                    file: None,
                },
            },
            tolerance: ToleranceConfig::default(),
            normalize: NormalizeConfig::default(),
            status_vocabulary: BTreeMap::new(),
            schemas: BTreeMap::new(),
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        let registry = self.schema_registry();
        registry.validate()?;

        for side in [Side::Internal, Side::Gateway] {
            let schema = &self.sources.get(side).schema;
            if !registry.contains(schema) {
                return Err(ReconError::UnknownSchema {
                    side,
                    schema: schema.clone(),
                });
            }
        }

        self.default_offset()?;
        self.vocabulary()?;
        Ok(())
    }

    /// Built-in schemas overlaid with the user's.
    pub fn schema_registry(&self) -> SchemaRegistry {
        let mut registry = SchemaRegistry::builtin();
        for (name, schema) in &self.schemas {
            registry.insert(name.clone(), schema.clone());
        }
        registry
    }

    pub fn vocabulary(&self) -> Result<StatusVocabulary, ReconError> {
        let mut vocab = if self.normalize.builtin_vocabulary {
            StatusVocabulary::builtin()
        } else {
            StatusVocabulary::empty()
        };
        for (canonical, aliases) in &self.status_vocabulary {
            vocab.extend(canonical, aliases.as_slice())?;
        }
        Ok(vocab)
    }

    pub fn default_offset(&self) -> Result<FixedOffset, ReconError> {
        parse_utc_offset(&self.normalize.default_timezone).ok_or_else(|| {
            ReconError::ConfigValidation(format!(
                "default_timezone: expected \"UTC\" or an offset like \"+01:00\", got \"{}\"",
                self.normalize.default_timezone
            ))
        })
    }

    pub fn drift_tolerance(&self) -> chrono::Duration {
        chrono::Duration::seconds(clamp_secs(self.tolerance.drift_secs))
    }

    pub fn naive_timezone_slack(&self) -> chrono::Duration {
        chrono::Duration::seconds(clamp_secs(self.tolerance.naive_timezone_slack_secs))
    }
}

fn clamp_secs(secs: u64) -> i64 {
    // chrono::Duration panics past ~i64::MAX milliseconds.
    secs.min(i64::MAX as u64 / 1000) as i64
}

/// Parse "UTC", "Z", "+01:00", "-0530" or "+01" into a fixed offset.
pub fn parse_utc_offset(input: &str) -> Option<FixedOffset> {
    let s = input.trim();
    if s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    if !rest.is_ascii() {
        return None;
    }

    let (hh, mm) = match rest.split_once(':') {
        Some((hh, mm)) if mm.len() == 2 => (hh, mm),
        Some(_) => return None,
        None if rest.len() == 4 => (&rest[..2], &rest[2..]),
        None => (rest, "00"),
    };
    if hh.len() != 2 || !hh.chars().chain(mm.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hh.parse().ok()?;
    let minutes: i32 = mm.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
