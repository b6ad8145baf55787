//! Coercion helpers shared by the per-entity transformers. The backend is
//! loose about types (amounts arrive as strings or numbers, timestamps in a
//! couple of formats), so mapping normalizes here rather than in each
//! transformer.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::errors::{Result, ValidationError};

/// Accepts a JSON number or a numeric string.
pub fn coerce_decimal(value: &Value) -> Result<Decimal> {
    let parsed = match value {
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ValidationError::InvalidInput(format!("expected a numeric amount, got {}", value)).into()
    })
}

/// Parses `YYYY-MM-DD`, tolerating a full RFC 3339 timestamp.
pub fn coerce_date(value: &Value) -> Result<NaiveDate> {
    if let Some(s) = value.as_str() {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(date);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Ok(ts.date_naive());
        }
    }
    Err(ValidationError::InvalidInput(format!("expected a date, got {}", value)).into())
}

/// Parses an RFC 3339 timestamp, falling back to "now" when the backend
/// omits the field.
pub fn coerce_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    value
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

pub fn string_field(value: &Value, field: &str) -> Result<String> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            ValidationError::InvalidInput(format!("missing string field '{}'", field)).into()
        })
}

pub fn optional_string_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

pub fn bool_field(value: &Value, field: &str, default: bool) -> bool {
    match value.get(field) {
        Some(Value::Bool(b)) => *b,
        // Some backends encode flags as 0/1.
        Some(Value::Number(n)) => n.as_i64().map(|i| i != 0).unwrap_or(default),
        _ => default,
    }
}

/// Builder for sparse snake_case update payloads: only present fields are
/// sent to the backend.
#[derive(Default)]
pub struct PatchBody {
    fields: Map<String, Value>,
}

impl PatchBody {
    pub fn new() -> Self {
        PatchBody::default()
    }

    pub fn set<V: Into<Value>>(mut self, field: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.fields.insert(field.to_string(), v.into());
        }
        self
    }

    pub fn set_value(mut self, field: &str, value: Option<Value>) -> Self {
        if let Some(v) = value {
            self.fields.insert(field.to_string(), v);
        }
        self
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}
