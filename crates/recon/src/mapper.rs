//! Field mapper: source field names → canonical field names.
//!
//! Only renaming and type acceptance happen here. Parsing amounts,
//! timestamps and status tokens is the normalizer's job.

use crate::error::MappingError;
use crate::model::{MappedRecord, RawValue, RawRecord, Side};
use crate::schema::Schema;

/// Value types a canonical field will accept from a source.
#[derive(Clone, Copy)]
enum Accept {
    Id,
    Amount,
    Text,
    Instant,
}

impl Accept {
    fn allows(self, value: &RawValue) -> bool {
        match (self, value) {
            (_, RawValue::Null) => false,
            (Self::Id, RawValue::Text(_) | RawValue::Integer(_)) => true,
            (Self::Amount, RawValue::Text(_) | RawValue::Integer(_) | RawValue::Decimal(_)) => true,
            (Self::Text, RawValue::Text(_)) => true,
            (Self::Instant, RawValue::Text(_) | RawValue::Integer(_) | RawValue::Timestamp(_)) => true,
            _ => false,
        }
    }
}

/// Map one raw record through `schema`.
pub fn map_record(
    raw: &RawRecord,
    schema: &Schema,
    side: Side,
    position: usize,
) -> Result<MappedRecord, MappingError> {
    Ok(MappedRecord {
        side,
        position,
        tx_id: map_tx_id(raw, schema)?,
        amount: take(raw, "amount", &schema.amount, Accept::Amount)?,
        currency: take(raw, "currency", &schema.currency, Accept::Text)?,
        status: take(raw, "status", &schema.status, Accept::Text)?,
        timestamp: take(raw, "timestamp", &schema.timestamp, Accept::Instant)?,
    })
}

/// The record's `tx_id` alone, trimmed; integers are stringified.
pub fn map_tx_id(raw: &RawRecord, schema: &Schema) -> Result<String, MappingError> {
    let tx_id = match take(raw, "tx_id", &schema.tx_id, Accept::Id)? {
        RawValue::Text(s) => s.trim().to_string(),
        RawValue::Integer(n) => n.to_string(),
        other => {
            return Err(MappingError::WrongType {
                field: "tx_id",
                source_field: schema.tx_id.clone(),
                found: other.type_name(),
            })
        }
    };
    if tx_id.is_empty() {
        return Err(MappingError::EmptyId {
            source_field: schema.tx_id.clone(),
        });
    }
    Ok(tx_id)
}

fn take(
    raw: &RawRecord,
    field: &'static str,
    source_field: &str,
    accept: Accept,
) -> Result<RawValue, MappingError> {
    match raw.get(source_field) {
        None | Some(RawValue::Null) => Err(MappingError::MissingField {
            field,
            source_field: source_field.to_string(),
        }),
        Some(value) if accept.allows(value) => Ok(value.clone()),
        Some(value) => Err(MappingError::WrongType {
            field,
            source_field: source_field.to_string(),
            found: value.type_name(),
        }),
    }
}
