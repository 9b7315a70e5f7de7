use crate::timestamp::{Instant, parse_timestamp};
use serde_json::Value;
use std::borrow::Cow;
use thiserror::Error;
use tracing::trace;

/// Keys every access-log record must carry.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "timestamp",
    "endpoint",
    "method",
    "response_time_ms",
    "status_code",
    "user_id",
    "request_size_bytes",
    "response_size_bytes",
];

const NON_NEGATIVE_FIELDS: [&str; 3] = [
    "response_time_ms",
    "request_size_bytes",
    "response_size_bytes",
];

/// Why a raw record was dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("unparsable timestamp")]
    BadTimestamp,

    #[error("field `{0}` is not a number")]
    NotNumeric(&'static str),

    #[error("field `{0}` is negative")]
    Negative(&'static str),

    #[error("status_code is not an integer")]
    BadStatusCode,
}

/// A record that passed validation, with typed views of its fields.
///
/// Borrows the caller's record; the parsed timestamp lives here and never
/// touches the original document.
#[derive(Debug, Clone)]
pub struct ValidLog<'a> {
    pub raw: &'a Value,
    pub timestamp: Instant,
    pub endpoint: Cow<'a, str>,
    pub method: Cow<'a, str>,
    pub user_id: Cow<'a, str>,
    pub response_time_ms: f64,
    pub status_code: i64,
    pub request_size_bytes: f64,
    pub response_size_bytes: f64,
}

impl ValidLog<'_> {
    /// Client or server error (`status_code >= 400`).
    #[inline]
    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }

    #[inline]
    pub fn is_server_error(&self) -> bool {
        (500..=599).contains(&self.status_code)
    }

    #[inline]
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// Validate one record, reporting the first failed check.
pub fn check(record: &Value) -> Result<ValidLog<'_>, Rejection> {
    let obj = record.as_object().ok_or(Rejection::NotAnObject)?;

    for field in REQUIRED_FIELDS {
        if !obj.contains_key(field) {
            return Err(Rejection::MissingField(field));
        }
    }

    let timestamp = obj["timestamp"]
        .as_str()
        .and_then(parse_timestamp)
        .ok_or(Rejection::BadTimestamp)?;

    let mut numbers = [0.0_f64; NON_NEGATIVE_FIELDS.len()];
    for (slot, field) in numbers.iter_mut().zip(NON_NEGATIVE_FIELDS) {
        let value = obj[field].as_f64().ok_or(Rejection::NotNumeric(field))?;
        if value < 0.0 {
            return Err(Rejection::Negative(field));
        }
        *slot = value;
    }
    let [response_time_ms, request_size_bytes, response_size_bytes] = numbers;

    let status_code = integral(&obj["status_code"]).ok_or(Rejection::BadStatusCode)?;

    Ok(ValidLog {
        raw: record,
        timestamp,
        endpoint: opaque_text(&obj["endpoint"]),
        method: opaque_text(&obj["method"]),
        user_id: opaque_text(&obj["user_id"]),
        response_time_ms,
        status_code,
        request_size_bytes,
        response_size_bytes,
    })
}

/// Validate one record, dropping it with a trace event when it fails.
pub fn validate(record: &Value) -> Option<ValidLog<'_>> {
    match check(record) {
        Ok(log) => Some(log),
        Err(reason) => {
            trace!(%reason, "Dropping invalid access log record");
            None
        }
    }
}

pub fn is_valid(record: &Value) -> bool {
    check(record).is_ok()
}

/// Keep the well-formed records, in input order.
pub fn validate_all(records: &[Value]) -> Vec<ValidLog<'_>> {
    records.iter().filter_map(validate).collect()
}

fn integral(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

/// Strings pass through; any other JSON value is keyed by its JSON text.
fn opaque_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "timestamp": "2025-01-15T10:00:00Z",
            "endpoint": "/api/users",
            "method": "GET",
            "response_time_ms": 100,
            "status_code": 200,
            "user_id": "user_1",
            "request_size_bytes": 512,
            "response_size_bytes": 1024
        })
    }

    #[test]
    fn complete_record_is_valid() {
        let record = sample();
        let log = check(&record).unwrap();
        assert_eq!(log.endpoint, "/api/users");
        assert_eq!(log.status_code, 200);
        assert_eq!(log.response_time_ms, 100.0);
        assert!(log.is_get());
        assert!(!log.is_error());
    }

    #[test]
    fn each_missing_field_is_reported() {
        for field in REQUIRED_FIELDS {
            let mut record = sample();
            record.as_object_mut().unwrap().remove(field);
            assert_eq!(check(&record).unwrap_err(), Rejection::MissingField(field));
        }
    }

    #[test]
    fn non_object_is_rejected() {
        assert_eq!(check(&json!([1, 2])).unwrap_err(), Rejection::NotAnObject);
        assert!(!is_valid(&json!("GET /")));
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let mut record = sample();
        record["timestamp"] = json!("invalid-date");
        assert_eq!(check(&record).unwrap_err(), Rejection::BadTimestamp);
        record["timestamp"] = json!(1736935200);
        assert_eq!(check(&record).unwrap_err(), Rejection::BadTimestamp);
        record["timestamp"] = json!(" 2025-01-15T10:00:00Z ");
        assert_eq!(check(&record).unwrap_err(), Rejection::BadTimestamp);
    }

    #[test]
    fn get_detection_ignores_case() {
        for method in ["GET", "get", "Get"] {
            let mut record = sample();
            record["method"] = json!(method);
            assert!(check(&record).unwrap().is_get(), "{method}");
        }
        let mut record = sample();
        record["method"] = json!("POST");
        assert!(!check(&record).unwrap().is_get());
    }

    #[test]
    fn numeric_fields_must_be_non_negative_numbers() {
        let mut record = sample();
        record["response_time_ms"] = json!("100");
        assert_eq!(check(&record).unwrap_err(), Rejection::NotNumeric("response_time_ms"));

        let mut record = sample();
        record["request_size_bytes"] = json!(-1);
        assert_eq!(check(&record).unwrap_err(), Rejection::Negative("request_size_bytes"));

        let mut record = sample();
        record["response_size_bytes"] = json!(null);
        assert_eq!(check(&record).unwrap_err(), Rejection::NotNumeric("response_size_bytes"));
    }

    #[test]
    fn zero_and_fractional_sizes_are_accepted() {
        let mut record = sample();
        record["response_time_ms"] = json!(0);
        record["request_size_bytes"] = json!(12.5);
        assert!(is_valid(&record));
    }

    #[test]
    fn status_code_range_is_not_checked() {
        let mut record = sample();
        record["status_code"] = json!(999);
        assert!(is_valid(&record));
        record["status_code"] = json!(404.0);
        assert_eq!(check(&record).unwrap().status_code, 404);
        record["status_code"] = json!("404");
        assert_eq!(check(&record).unwrap_err(), Rejection::BadStatusCode);
    }

    #[test]
    fn opaque_identifiers_are_accepted() {
        let mut record = sample();
        record["user_id"] = json!(42);
        record["endpoint"] = json!("");
        let log = check(&record).unwrap();
        assert_eq!(log.user_id, "42");
        assert_eq!(log.endpoint, "");
    }

    #[test]
    fn validate_all_keeps_input_order() {
        let mut second = sample();
        second["endpoint"] = json!("/api/orders");
        let records = vec![sample(), json!({"timestamp": "x"}), second];
        let valid = validate_all(&records);
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].endpoint, "/api/users");
        assert_eq!(valid[1].endpoint, "/api/orders");
    }
}
