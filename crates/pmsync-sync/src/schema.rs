//! The final type gate before a record reaches storage.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use pmsync_core::{FieldKind, FieldSchema, FieldSpec, SchemaViolation, SyncError, Value};

/// Checks every declared column and returns the normalized record.
///
/// The output holds exactly the declared columns: an absent column becomes an
/// explicit `Null` so an upsert overwrites every attribute. All violations are
/// collected before failing.
pub fn validate_record(
    resource_id: &str,
    mut columns: BTreeMap<String, Value>,
    schema: &FieldSchema,
) -> Result<BTreeMap<String, Value>, SyncError> {
    let mut validated = BTreeMap::new();
    let mut violations = Vec::new();

    for (column, spec) in schema.iter() {
        let value = columns.remove(column).unwrap_or_default();
        match check_value(spec, value) {
            Ok(normalized) => {
                validated.insert(column.to_string(), normalized);
            }
            Err(actual_value) => violations.push(SchemaViolation {
                column: column.to_string(),
                expected_kind: spec.kind,
                nullable: spec.nullable,
                actual_value,
            }),
        }
    }

    if violations.is_empty() {
        Ok(validated)
    } else {
        Err(SyncError::SchemaValidation {
            resource_id: resource_id.to_string(),
            violations,
        })
    }
}

/// `Ok` carries the value to store, `Err` hands back the offending value.
pub fn check_value(spec: &FieldSpec, value: Value) -> Result<Value, Value> {
    let value = match value {
        Value::String(s) if s.is_empty() && spec.nullable && spec.kind != FieldKind::String => {
            Value::Null
        }
        other => other,
    };
    if value.is_null() {
        return if spec.nullable { Ok(value) } else { Err(value) };
    }

    match spec.kind {
        FieldKind::String => match value {
            Value::String(_) | Value::Date(_) => Ok(value),
            other => Err(other),
        },
        FieldKind::Integer => match value {
            Value::Int(_) => Ok(value),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 && fits_i64(f) => {
                Ok(Value::Int(f as i64))
            }
            Value::String(ref s) => match s.trim().parse::<i64>() {
                Ok(i) => Ok(Value::Int(i)),
                Err(_) => Err(value),
            },
            other => Err(other),
        },
        FieldKind::Numeric => match value {
            Value::Int(_) | Value::UInt(_) => Ok(value),
            Value::Float(f) if f.is_finite() => Ok(value),
            Value::String(ref s) if is_decimal_text(s) => Ok(value),
            other => Err(other),
        },
        FieldKind::Date | FieldKind::Timestamp => match value {
            Value::Date(_) => Ok(value),
            Value::String(ref s) if is_date_like(s) => Ok(value),
            other => Err(other),
        },
        FieldKind::Boolean => match value {
            Value::Bool(_) => Ok(value),
            other => Err(other),
        },
        FieldKind::Json => match value {
            Value::String(ref s) if serde_json::from_str::<serde_json::Value>(s).is_ok() => {
                Ok(value)
            }
            other => Err(other),
        },
    }
}

fn fits_i64(f: f64) -> bool {
    f >= i64::MIN as f64 && f < i64::MAX as f64
}

/// `-?digits[.digits]`
pub fn is_decimal_text(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.map_or(true, digits)
}

/// Accepts a calendar date, an RFC 3339 timestamp, or a naive timestamp with a
/// space or `T` separator and optional fractional seconds.
pub fn is_date_like(text: &str) -> bool {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}
