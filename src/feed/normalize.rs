use super::types::{RawRecord, VehiclePosition};
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

/// Report time fields, most trusted first.
const TIMESTAMP_FIELDS: [&str; 3] = ["datahoraservidor", "datahoraenvio", "datahora"];

/// Epoch values below this are seconds rather than milliseconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

impl From<&RawRecord> for VehiclePosition {
    fn from(record: &RawRecord) -> Self {
        Self {
            id: text_field(record.get("ordem")),
            line: text_field(record.get("linha")),
            latitude: parse_coordinate(record.get("latitude")),
            longitude: parse_coordinate(record.get("longitude")),
            timestamp: report_time(record),
        }
    }
}

pub fn normalize_records(records: &[RawRecord]) -> Vec<VehiclePosition> {
    records.iter().map(VehiclePosition::from).collect()
}

/// Strings are taken verbatim, other scalars by their JSON text.
fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Numeric coercion that never fails: upstream sends coordinates either as
/// numbers or as strings with a comma decimal separator ("-22,90"). Anything
/// unusable collapses to 0.0.
pub fn parse_coordinate(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.replace(',', ".").parse::<f64>().ok()
            }
        }
        _ => None,
    };

    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn report_time(record: &RawRecord) -> i64 {
    TIMESTAMP_FIELDS
        .iter()
        .filter_map(|field| record.get(*field))
        .find(|value| is_set(value))
        .map(parse_timestamp)
        .unwrap_or(0)
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

/// Epoch milliseconds from a digit run (seconds or millis) or a date-time
/// string. Anything else is 0.
pub fn parse_timestamp(value: &Value) -> i64 {
    let parsed = match value {
        Value::Number(n) => n.as_i64().map(epoch_millis),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                s.parse::<i64>().ok().map(epoch_millis)
            } else {
                parse_datetime(s)
            }
        }
        _ => None,
    };

    parsed.filter(|ts| *ts > 0).unwrap_or(0)
}

fn epoch_millis(raw: i64) -> i64 {
    if raw < MILLIS_THRESHOLD {
        raw.saturating_mul(1000)
    } else {
        raw
    }
}

fn parse_datetime(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    // Zone-less values are read as UTC.
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.and_utc().timestamp_millis())
}
