use apilens_core::ApilensError;
use serde_json::{Value, json};
use std::path::Path;
use tracing::warn;

/// Read access-log records from `path`.
///
/// Accepts a JSON array of records, a single record object (compact or
/// pretty-printed), or JSON Lines (one record per line). A document that is a
/// single JSON scalar is rejected. Unparsable JSON Lines entries are skipped;
/// a file where every line is unparsable is an error.
pub fn load_records(path: &Path) -> Result<Vec<Value>, ApilensError> {
    let text = std::fs::read_to_string(path)?;
    parse_records(&text)
}

pub fn parse_records(text: &str) -> Result<Vec<Value>, ApilensError> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str::<Vec<Value>>(trimmed)?);
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(record @ Value::Object(_)) => Ok(vec![record]),
        Ok(other) => Err(ApilensError::InvalidInput(format!(
            "expected a JSON array, a record object or JSON Lines, got `{other}`"
        ))),
        Err(_) => parse_json_lines(text),
    }
}

fn parse_json_lines(text: &str) -> Result<Vec<Value>, ApilensError> {
    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut first_error: Option<(usize, String)> = None;

    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => records.push(value),
            Err(err) => {
                skipped += 1;
                if first_error.is_none() {
                    first_error = Some((line_no + 1, err.to_string()));
                }
            }
        }
    }

    if records.is_empty() && skipped > 0 {
        let (line_no, message) = first_error.unwrap_or_default();
        return Err(ApilensError::InvalidInput(format!(
            "skipped {skipped} invalid lines (first at line {line_no}: {message})"
        )));
    }
    if skipped > 0 {
        warn!(skipped, "Skipped unparsable JSON Lines entries");
    }
    Ok(records)
}

/// Built-in sample batch used when no input file is given.
pub fn demo_records() -> Vec<Value> {
    vec![
        json!({
            "timestamp": "2025-01-15T10:00:00Z",
            "endpoint": "/api/users",
            "method": "GET",
            "response_time_ms": 100,
            "status_code": 200,
            "user_id": "user_1",
            "request_size_bytes": 512,
            "response_size_bytes": 1024
        }),
        json!({
            "timestamp": "2025-01-15T10:05:00Z",
            "endpoint": "/api/payments",
            "method": "POST",
            "response_time_ms": 1500,
            "status_code": 500,
            "user_id": "user_2",
            "request_size_bytes": 1024,
            "response_size_bytes": 512
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_array() {
        let records = parse_records(r#"[{"a":1},{"b":2}]"#).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn parses_json_lines_and_skips_garbage() {
        let text = "{\"a\":1}\n\nnot json\n{\"b\":2}\n";
        let records = parse_records(text).unwrap();
        assert_eq!(records, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn single_object_is_one_record_in_any_layout() {
        let compact = r#"{"timestamp": "2025-01-15T10:00:00Z", "endpoint": "/a"}"#;
        let pretty = "{\n  \"timestamp\": \"2025-01-15T10:00:00Z\",\n  \"endpoint\": \"/a\"\n}\n";
        let expected = vec![json!({"timestamp": "2025-01-15T10:00:00Z", "endpoint": "/a"})];
        assert_eq!(parse_records(compact).unwrap(), expected);
        assert_eq!(parse_records(pretty).unwrap(), expected);
    }

    #[test]
    fn scalar_document_is_rejected() {
        for text in ["42", "\"records\"", "null\n"] {
            let err = parse_records(text).unwrap_err();
            assert!(matches!(err, ApilensError::InvalidInput(_)), "{text}");
        }
    }

    #[test]
    fn all_garbage_lines_is_an_error() {
        let err = parse_records("nope\nstill nope\n").unwrap_err();
        assert!(matches!(err, ApilensError::InvalidInput(_)));
        assert!(err.to_string().contains("first at line 1"));
    }

    #[test]
    fn malformed_array_is_a_serde_error() {
        assert!(matches!(parse_records("[{\"a\":"), Err(ApilensError::Serde(_))));
    }

    #[test]
    fn blank_input_is_an_empty_batch() {
        assert!(parse_records("  \n").unwrap().is_empty());
    }

    #[test]
    fn demo_batch_is_fully_valid() {
        assert!(demo_records().iter().all(apilens_core::is_valid));
    }
}
