use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::utils::constants::FIELD_ERROR_SUFFIX;

/// One entry of a [`VehicleRecord`]: either a value taken from an upstream
/// API or the reason that API could not provide its fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Data(Value),
    Error(FieldError),
}

/// Serialized as `{status, errorDetails}` under the `<name>Error` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(rename = "errorDetails", skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Value>,
}

/// Flat, insertion-ordered field map produced by adapters and merged by the
/// vehicle service. Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VehicleRecord(IndexMap<String, FieldValue>);

impl VehicleRecord {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert_data(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), FieldValue::Data(value));
    }

    /// Stores the error under `<name>Error`.
    pub fn insert_error(&mut self, name: &str, error: FieldError) {
        self.0.insert(error_key(name), FieldValue::Error(error));
    }

    /// Last write wins; an overwritten key keeps its original position.
    pub fn merge(&mut self, other: VehicleRecord) {
        self.0.extend(other.0);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// At least one key that is not an error key.
    pub fn has_real_data(&self) -> bool {
        self.keys().any(|key| !is_error_key(key))
    }
}

impl FromIterator<(String, FieldValue)> for VehicleRecord {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub fn error_key(name: &str) -> String {
    format!("{}{}", name, FIELD_ERROR_SUFFIX)
}

pub fn is_error_key(key: &str) -> bool {
    key.ends_with(FIELD_ERROR_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_errors_flat_next_to_data() {
        let mut record = VehicleRecord::new();
        record.insert_data("rangeliquid", json!(1292));
        record.insert_error(
            "electricvehicle",
            FieldError { status: Some(500), error_details: Some(json!({"exveErrorId": "500"})) },
        );

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            json!({
                "rangeliquid": 1292,
                "electricvehicleError": {"status": 500, "errorDetails": {"exveErrorId": "500"}}
            })
        );
    }

    #[test]
    fn real_data_ignores_error_keys() {
        let mut record = VehicleRecord::new();
        assert!(!record.has_real_data());

        record.insert_error("fuelstatus", FieldError { status: Some(404), error_details: None });
        assert!(!record.has_real_data());

        record.insert_data("soc", json!(90));
        assert!(record.has_real_data());
    }

    #[test]
    fn merge_overwrites_in_place() {
        let mut left: VehicleRecord = [
            ("a".to_owned(), FieldValue::Data(json!(1))),
            ("b".to_owned(), FieldValue::Data(json!(2))),
        ]
        .into_iter()
        .collect();
        let right: VehicleRecord = [
            ("a".to_owned(), FieldValue::Data(json!(3))),
            ("c".to_owned(), FieldValue::Data(json!(4))),
        ]
        .into_iter()
        .collect();

        left.merge(right);

        assert_eq!(left.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(left.get("a"), Some(&FieldValue::Data(json!(3))));
    }
}
