use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

/// Largest minor-unit exponent accepted. Keeps scaled amounts well inside
/// `Decimal`'s 28-digit scale limit.
pub const MAX_MINOR_UNITS: u32 = 18;

/// Canonical field → source field name, for one source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    pub tx_id: String,
    pub amount: String,
    pub currency: String,
    pub status: String,
    pub timestamp: String,
    /// Source reports amounts in minor units (kobo, cents) with this many
    /// decimal places. 0 means amounts are already in major units.
    #[serde(default)]
    pub amount_minor_units: u32,
}

impl Schema {
    pub fn new(tx_id: &str, amount: &str, currency: &str, status: &str, timestamp: &str) -> Self {
        Self {
            tx_id: tx_id.into(),
            amount: amount.into(),
            currency: currency.into(),
            status: status.into(),
            timestamp: timestamp.into(),
            amount_minor_units: 0,
        }
    }

    pub fn minor_units(mut self, exponent: u32) -> Self {
        self.amount_minor_units = exponent;
        self
    }

    /// (canonical, source) pairs in canonical order.
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("tx_id", &self.tx_id),
            ("amount", &self.amount),
            ("currency", &self.currency),
            ("status", &self.status),
            ("timestamp", &self.timestamp),
        ]
    }

    pub fn validate(&self, name: &str) -> Result<(), ReconError> {
        let mut seen = HashSet::new();
        for (canonical, source) in self.fields() {
            if source.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "schema '{name}': field '{canonical}' maps to an empty source name"
                )));
            }
            if !seen.insert(source) {
                return Err(ReconError::ConfigValidation(format!(
                    "schema '{name}': source field '{source}' is mapped more than once"
                )));
            }
        }
        if self.amount_minor_units > MAX_MINOR_UNITS {
            return Err(ReconError::ConfigValidation(format!(
                "schema '{name}': amount_minor_units must be at most {MAX_MINOR_UNITS}, got {}",
                self.amount_minor_units
            )));
        }
        Ok(())
    }
}

/// Known schemas keyed by source identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemaRegistry {
    /// Registry with no entries.
    pub fn empty() -> Self {
        Self {
            schemas: BTreeMap::new(),
        }
    }

    /// The schemas shipped with the engine.
    pub fn builtin() -> Self {
        let mut schemas = BTreeMap::new();
        schemas.insert(
            "internal".to_string(),
            Schema::new("transaction_id", "amount_value", "currency_code", "status", "created_on"),
        );
        // Paystack reports kobo/pesewas, Stripe reports cents.
        schemas.insert(
            "paystack".to_string(),
            Schema::new("id", "amount", "currency", "status", "created_at").minor_units(2),
        );
        schemas.insert(
            "stripe".to_string(),
            Schema::new("id", "amount", "currency", "status", "created").minor_units(2),
        );
        schemas.insert(
            "mock".to_string(),
            Schema::new("tx_id", "amount", "currency", "status", "timestamp"),
        );
        Self { schemas }
    }

    /// Add or replace a schema.
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) {
        self.schemas.insert(name.into(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.schemas.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for (name, schema) in &self.schemas {
            if name.trim().is_empty() {
                return Err(ReconError::ConfigValidation("schema name must not be empty".into()));
            }
            schema.validate(name)?;
        }
        Ok(())
    }
}
