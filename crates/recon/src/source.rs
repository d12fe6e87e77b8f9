//! File-based record loaders: CSV exports and JSON list documents.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::ReconError;
use crate::model::{RawRecord, RawValue};

/// Parse CSV with a header row. Headers become field names; cells stay
/// text so ids like `007` keep their zeros. Empty cells are null.
///
/// Rows may be ragged: a short row simply lacks the trailing fields and
/// fails mapping on its own, and cells past the last header are dropped.
pub fn load_csv_records(csv_data: &str) -> Result<Vec<RawRecord>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Parse(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ReconError::Parse(e.to_string()))?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(h, cell)| {
                let value = if cell.trim().is_empty() {
                    RawValue::Null
                } else {
                    RawValue::Text(cell.to_string())
                };
                (h.clone(), value)
            })
            .collect();
        records.push(record);
    }

    Ok(records)
}

/// Parse a JSON array of objects, or an object whose `data` member is
/// one (the list-response shape Paystack and Stripe use).
///
/// An item that isn't an object keeps its position as an empty record,
/// so it is reported unprocessable instead of failing the document.
pub fn load_json_records(json: &str) -> Result<Vec<RawRecord>, ReconError> {
    let doc: Value = serde_json::from_str(json).map_err(|e| ReconError::Parse(e.to_string()))?;

    let items = match doc {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ReconError::Parse(
                    "expected an array of records or an object with a \"data\" array".into(),
                ))
            }
        },
        _ => {
            return Err(ReconError::Parse(
                "expected an array of records or an object with a \"data\" array".into(),
            ))
        }
    };

    let records: Vec<RawRecord> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(obj) => obj
                .into_iter()
                .map(|(k, v)| (k, json_value(v)))
                .collect::<RawRecord>(),
            other => {
                log::warn!("record {i}: expected an object, found {}", json_type(&other));
                RawRecord::new()
            }
        })
        .collect();
    Ok(records)
}

fn json_value(v: Value) -> RawValue {
    match v {
        Value::Null => RawValue::Null,
        Value::String(s) => RawValue::Text(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) => RawValue::Integer(i),
            // Floats go through their shortest decimal rendering, never f64 math.
            None => Decimal::from_str_exact(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .map(RawValue::Decimal)
                .unwrap_or_else(|_| RawValue::Text(n.to_string())),
        },
        Value::Bool(b) => RawValue::Text(b.to_string()),
        nested @ (Value::Array(_) | Value::Object(_)) => RawValue::Text(nested.to_string()),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
