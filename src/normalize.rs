//! Event-to-text normalization.
//!
//! Turns a structured [`EventRecord`] into the single sentence that gets
//! embedded and stored. The clock is an explicit argument, so the output
//! is fully deterministic for a given input and clock reading.
//!
//! Grammar:
//! - boolean values read `"<description> is <descriptor>"`,
//! - everything else reads `"<description>: <descriptor>"`,
//! - a location is appended as `" at location '<loc>'"` unless it is the
//!   `unknown`/`not specified` placeholder,
//! - a parseable origin timestamp is appended as `" at <time>"`,
//! - with no origin timestamp the server clock is used and marked as
//!   `" (captured at <time>)"`,
//! - an unparseable origin timestamp degrades to an inline
//!   `" (invalid timestamp: <raw>)"` marker and the server clock backs
//!   the resolved fields. Ingestion never fails on a bad timestamp.

use chrono::{DateTime, Local, TimeZone};
use serde_json::Value;

use crate::models::{DataType, EventRecord, NormalizedEvent};

/// Human-readable local time, `HH:MM:SS DD.MM.YYYY`.
const TIME_FORMAT: &str = "%H:%M:%S %d.%m.%Y";

/// Location placeholders that are never rendered into the text.
const LOCATION_PLACEHOLDERS: [&str; 2] = ["unknown", "not specified"];

pub fn normalize(event: &EventRecord, now: DateTime<Local>) -> NormalizedEvent {
    let description = event.human_readable_description.as_deref().unwrap_or_default();
    let descriptor = event.event_type.as_deref().unwrap_or_default();

    let mut text = description.to_string();
    match event.data_type.unwrap_or(DataType::Mixed) {
        DataType::Boolean => {
            text.push_str(" is ");
            text.push_str(descriptor);
        }
        DataType::Number | DataType::String | DataType::Mixed => {
            text.push_str(": ");
            text.push_str(descriptor);
        }
    }

    let location = event.location.as_deref().unwrap_or("unknown");
    if !location.is_empty()
        && !LOCATION_PLACEHOLDERS
            .iter()
            .any(|p| location.eq_ignore_ascii_case(p))
    {
        text.push_str(&format!(" at location '{}'", location));
    }

    match &event.timestamp {
        Some(raw) => match resolve_epoch_ms(raw) {
            Some((ms, local)) => {
                let formatted = local.format(TIME_FORMAT).to_string();
                text.push_str(&format!(" at {}", formatted));
                NormalizedEvent {
                    text,
                    timestamp_iso: local.to_rfc3339(),
                    timestamp_formatted: Some(formatted),
                    effective_timestamp_ms: ms,
                    original_timestamp_ms: Some(ms),
                }
            }
            None => {
                text.push_str(&format!(" (invalid timestamp: {})", raw_display(raw)));
                NormalizedEvent {
                    text,
                    timestamp_iso: now.to_rfc3339(),
                    timestamp_formatted: None,
                    effective_timestamp_ms: now.timestamp_millis(),
                    original_timestamp_ms: None,
                }
            }
        },
        None => {
            let formatted = now.format(TIME_FORMAT).to_string();
            text.push_str(&format!(" (captured at {})", formatted));
            NormalizedEvent {
                text,
                timestamp_iso: now.to_rfc3339(),
                timestamp_formatted: Some(formatted),
                effective_timestamp_ms: now.timestamp_millis(),
                original_timestamp_ms: None,
            }
        }
    }
}

/// Interpret a raw JSON timestamp as milliseconds since epoch and convert
/// to local time. Returns `None` for non-numeric values and for values
/// outside chrono's representable range.
fn resolve_epoch_ms(raw: &Value) -> Option<(i64, DateTime<Local>)> {
    let ms = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        _ => return None,
    };
    let local = Local.timestamp_millis_opt(ms).earliest()?;
    Some((ms, local))
}

/// Render a raw JSON value for the invalid-timestamp marker: strings
/// appear bare, everything else in compact JSON notation.
fn raw_display(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(data_type: DataType, descriptor: &str, description: &str) -> EventRecord {
        EventRecord {
            device_name: Some("livingroom.light".to_string()),
            event_type: Some(descriptor.to_string()),
            value: Some(json!(true)),
            data_type: Some(data_type),
            human_readable_description: Some(description.to_string()),
            timestamp: None,
            location: None,
        }
    }

    #[test]
    fn boolean_uses_is_clause() {
        let record = event(DataType::Boolean, "on", "Living room light");
        let normalized = normalize(&record, Local::now());
        assert!(normalized.text.starts_with("Living room light is on"));
    }

    #[test]
    fn number_and_string_use_colon_clause() {
        for data_type in [DataType::Number, DataType::String, DataType::Mixed] {
            let record = event(data_type, "21.5", "Kitchen temperature");
            let normalized = normalize(&record, Local::now());
            assert!(
                normalized.text.starts_with("Kitchen temperature: 21.5"),
                "unexpected text for {}: {}",
                data_type,
                normalized.text
            );
        }
    }

    #[test]
    fn location_placeholders_are_never_rendered() {
        for placeholder in ["unknown", "Unknown", "UNKNOWN", "not specified", "Not Specified", ""] {
            let mut record = event(DataType::Boolean, "on", "Light");
            record.location = Some(placeholder.to_string());
            let normalized = normalize(&record, Local::now());
            assert!(
                !normalized.text.contains("at location"),
                "placeholder '{}' leaked into: {}",
                placeholder,
                normalized.text
            );
        }
    }

    #[test]
    fn real_location_is_rendered_verbatim() {
        let mut record = event(DataType::Boolean, "on", "Light");
        record.location = Some("living room".to_string());
        let normalized = normalize(&record, Local::now());
        assert!(normalized.text.contains(" at location 'living room'"));
    }

    #[test]
    fn valid_timestamp_resolves_to_event_time() {
        let mut record = event(DataType::Boolean, "on", "Living room light");
        record.timestamp = Some(json!(1_700_000_000_000i64));
        let now = Local::now();
        let normalized = normalize(&record, now);

        let expected = Local.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let expected_formatted = expected.format(TIME_FORMAT).to_string();
        assert!(normalized.text.ends_with(&format!(" at {}", expected_formatted)));
        assert_eq!(normalized.timestamp_iso, expected.to_rfc3339());
        assert_eq!(normalized.timestamp_formatted, Some(expected_formatted));
        assert_eq!(normalized.effective_timestamp_ms, 1_700_000_000_000);
        assert_eq!(normalized.original_timestamp_ms, Some(1_700_000_000_000));
    }

    #[test]
    fn missing_timestamp_marks_capture_time() {
        let record = event(DataType::Boolean, "on", "Light");
        let now = Local::now();
        let normalized = normalize(&record, now);

        let expected_formatted = now.format(TIME_FORMAT).to_string();
        assert!(normalized
            .text
            .ends_with(&format!(" (captured at {})", expected_formatted)));
        assert_eq!(normalized.timestamp_iso, now.to_rfc3339());
        assert_eq!(normalized.effective_timestamp_ms, now.timestamp_millis());
        assert_eq!(normalized.original_timestamp_ms, None);
    }

    #[test]
    fn unparseable_timestamp_degrades_to_marker() {
        let mut record = event(DataType::Boolean, "on", "Light");
        record.timestamp = Some(json!("not-a-number"));
        let now = Local::now();
        let normalized = normalize(&record, now);

        assert!(normalized.text.contains("(invalid timestamp: not-a-number)"));
        // No formatted time is appended in this branch.
        assert_eq!(normalized.timestamp_formatted, None);
        // Resolved fields fall back to the server clock.
        assert_eq!(normalized.timestamp_iso, now.to_rfc3339());
        assert_eq!(normalized.effective_timestamp_ms, now.timestamp_millis());
        assert_eq!(normalized.original_timestamp_ms, None);
    }

    #[test]
    fn out_of_range_timestamp_is_invalid() {
        let mut record = event(DataType::Boolean, "on", "Light");
        record.timestamp = Some(json!(i64::MAX));
        let normalized = normalize(&record, Local::now());
        assert!(normalized.text.contains("(invalid timestamp:"));
    }

    #[test]
    fn output_is_deterministic_for_fixed_clock() {
        let mut record = event(DataType::Number, "42", "Counter");
        record.location = Some("attic".to_string());
        let now = Local::now();
        assert_eq!(normalize(&record, now), normalize(&record, now));
    }
}
