//! Normalization of BYOCAR container responses.
//!
//! A container response is an ordered list of single-key records:
//!
//! ```json
//! [
//!   { "tanklevelpercent": { "value": "90", "timestamp": 1541080800000 } },
//!   { "rangeliquid": { "value": "1292", "timestamp": 1541080800000 } }
//! ]
//! ```
//!
//! which folds into the flat record `{ "tanklevelpercent": 90, "rangeliquid": 1292 }`.

use indexmap::IndexMap;
use serde_json::{Number, Value};
use tracing::debug;

use crate::model::VehicleRecord;

pub type ContainerEntry = IndexMap<String, Value>;
pub type ContainerResponse = Vec<ContainerEntry>;

/// Folds a container response into a record, later entries overwrite earlier ones.
pub fn container_to_record(container: ContainerResponse) -> VehicleRecord {
    let mut record = VehicleRecord::new();
    for entry in container {
        let mut fields = entry.into_iter();
        let Some((key, inner)) = fields.next() else {
            continue;
        };
        if fields.next().is_some() {
            debug!("container entry '{}' carries more than one key, using the first", key);
        }
        record.insert_data(key, normalize_entry(inner));
    }
    record
}

/// The coerced `value` when present and not null, otherwise the inner object unchanged.
fn normalize_entry(inner: Value) -> Value {
    match inner.get("value") {
        Some(value) if !value.is_null() => coerce_value(value),
        _ => inner,
    }
}

/// Integer-parse-or-pass-through.
///
/// Strings holding an integer (or a decimal, truncated) become integers.
/// Everything else is returned unchanged.
pub fn coerce_value(value: &Value) -> Value {
    match value {
        Value::String(s) => parse_integer(s)
            .map(|n| Value::Number(n.into()))
            .unwrap_or_else(|| value.clone()),
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
            .map(|f| Value::Number(Number::from(f.trunc() as i64)))
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }

    let (integer, fraction) = s.split_once('.')?;
    let digits = integer.strip_prefix(['-', '+']).unwrap_or(integer);
    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    integer.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn container(value: Value) -> ContainerResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn converts_container_response_to_key_value_pairs() {
        let record = container_to_record(container(json!([
            { "tanklevelpercent": { "value": "90", "timestamp": 1541080800000u64 } },
            { "rangeliquid": { "value": "1292", "timestamp": 1541080800000u64 } }
        ])));

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "tanklevelpercent": 90, "rangeliquid": 1292 })
        );
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["tanklevelpercent", "rangeliquid"]);
    }

    #[test]
    fn coerces_numeric_strings_only() {
        assert_eq!(coerce_value(&json!("90")), json!(90));
        assert_eq!(coerce_value(&json!(" -12 ")), json!(-12));
        assert_eq!(coerce_value(&json!("90.7")), json!(90));
        assert_eq!(coerce_value(&json!("LOCKED")), json!("LOCKED"));
        assert_eq!(coerce_value(&json!("12abc")), json!("12abc"));
        assert_eq!(coerce_value(&json!("1e5")), json!("1e5"));
        assert_eq!(coerce_value(&json!(".5")), json!(".5"));
        assert_eq!(coerce_value(&json!(true)), json!(true));
        assert_eq!(coerce_value(&json!(1292)), json!(1292));
        assert_eq!(coerce_value(&json!(45.9)), json!(45));
    }

    #[test]
    fn falsy_values_pass_through() {
        let record = container_to_record(container(json!([
            { "soc": { "value": 0 } },
            { "doorstatus": { "value": "" } },
            { "charging": { "value": false } }
        ])));

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "soc": 0, "doorstatus": "", "charging": false })
        );
    }

    #[test]
    fn keeps_inner_object_without_value() {
        let record = container_to_record(container(json!([
            { "fuelstatusError": { "status": 500, "errorDetails": "down" } },
            { "position": { "value": null, "timestamp": 1 } },
            {}
        ])));

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "fuelstatusError": { "status": 500, "errorDetails": "down" },
                "position": { "value": null, "timestamp": 1 }
            })
        );
    }
}
