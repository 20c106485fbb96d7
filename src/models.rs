//! Core data types for the ingestion and query pipeline.
//!
//! Incoming payloads are deserialized into these types at the HTTP
//! boundary; nothing downstream touches raw JSON shapes except the
//! `value` and `timestamp` fields, which are deliberately kept as
//! [`serde_json::Value`] (see field docs).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A structured home-automation event as submitted for ingestion.
///
/// Required fields are modeled as `Option` so that a missing field
/// surfaces as a validation failure listing the field name, not as a
/// deserialization error with an opaque message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRecord {
    /// Device identifier, e.g. `"livingroom.light"`.
    pub device_name: Option<String>,
    /// Event/value descriptor rendered into the text, e.g. `"on"` or `"21.5"`.
    pub event_type: Option<String>,
    /// The raw scalar value. The key must be present; `null`, `false`
    /// and `0` are all legitimate values, so presence is tracked
    /// separately from truthiness: an absent key is `None`, an explicit
    /// JSON `null` is `Some(Value::Null)`.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub value: Option<Value>,
    /// Declared type of `value`, steering the text grammar.
    pub data_type: Option<DataType>,
    /// Human-readable description template, e.g. `"Living room light"`.
    pub human_readable_description: Option<String>,
    /// Optional origin timestamp in milliseconds since epoch. Kept as raw
    /// JSON so a malformed value can be echoed verbatim in the text marker.
    pub timestamp: Option<Value>,
    /// Optional location label; treated as `"unknown"` when absent.
    pub location: Option<String>,
}

/// Declared data type of an event value.
///
/// Unrecognized strings fold into [`DataType::Mixed`], which shares the
/// default text grammar with strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Number,
    String,
    #[serde(other)]
    Mixed,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Number => "number",
            DataType::String => "string",
            DataType::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A free-text question with optional generation options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRequest {
    pub user_query: Option<String>,
    /// Passed through verbatim to the chat call (temperature, top_p, ...).
    pub options: Option<Value>,
}

/// Output of the text normalizer: the embedding text plus the resolved
/// timestamp fields that accompany it into storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub text: String,
    /// Resolved event time as local ISO-8601.
    pub timestamp_iso: String,
    /// Human-formatted local time (`HH:MM:SS DD.MM.YYYY`); absent when the
    /// origin timestamp was present but unparseable.
    pub timestamp_formatted: Option<String>,
    /// Timestamp used in the document id: the origin timestamp when it
    /// parsed, the server clock otherwise.
    pub effective_timestamp_ms: i64,
    /// The origin timestamp, only when it parsed as milliseconds.
    pub original_timestamp_ms: Option<i64>,
}

/// Metadata persisted alongside each stored document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentMetadata {
    pub device_name: String,
    pub event_type: String,
    pub value: Value,
    pub data_type: String,
    pub description: String,
    pub location: String,
    pub timestamp_iso: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_timestamp_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_formatted: Option<String>,
    /// The exact text the embedding was computed from.
    pub text: String,
}

/// Deserialize any JSON value, including `null`, as present.
///
/// The default `Option` behavior maps `null` to `None`, which would make
/// `{"value": null}` indistinguishable from a missing key.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_value_key_is_none() {
        let event: EventRecord = serde_json::from_value(json!({
            "device_name": "hall.motion"
        }))
        .unwrap();
        assert!(event.value.is_none());
    }

    #[test]
    fn explicit_null_value_is_present() {
        let event: EventRecord = serde_json::from_value(json!({
            "value": null
        }))
        .unwrap();
        assert_eq!(event.value, Some(Value::Null));
    }

    #[test]
    fn false_and_zero_values_are_present() {
        let event: EventRecord = serde_json::from_value(json!({"value": false})).unwrap();
        assert_eq!(event.value, Some(json!(false)));

        let event: EventRecord = serde_json::from_value(json!({"value": 0})).unwrap();
        assert_eq!(event.value, Some(json!(0)));
    }

    #[test]
    fn unknown_data_type_folds_into_mixed() {
        let event: EventRecord =
            serde_json::from_value(json!({"data_type": "json"})).unwrap();
        assert_eq!(event.data_type, Some(DataType::Mixed));
    }

    #[test]
    fn known_data_types_parse() {
        for (raw, expected) in [
            ("boolean", DataType::Boolean),
            ("number", DataType::Number),
            ("string", DataType::String),
            ("mixed", DataType::Mixed),
        ] {
            let event: EventRecord =
                serde_json::from_value(json!({ "data_type": raw })).unwrap();
            assert_eq!(event.data_type, Some(expected), "data_type {}", raw);
        }
    }

    #[test]
    fn metadata_omits_absent_timestamp_fields() {
        let metadata = DocumentMetadata {
            device_name: "hall.motion".to_string(),
            event_type: "motion".to_string(),
            value: json!(true),
            data_type: "boolean".to_string(),
            description: "Hallway motion".to_string(),
            location: "unknown".to_string(),
            timestamp_iso: "2024-01-01T00:00:00+00:00".to_string(),
            original_timestamp_ms: None,
            timestamp_formatted: None,
            text: "Hallway motion is motion".to_string(),
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert!(json.get("original_timestamp_ms").is_none());
        assert!(json.get("timestamp_formatted").is_none());
    }
}
