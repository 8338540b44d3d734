use crate::errors::ApiError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a request body that must be a JSON object. `null` counts as no body.
pub fn parse_body(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::MissingBody);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Err(ApiError::MissingBody),
        _ => Err(ApiError::MalformedBody),
    }
}

/// Extracts the named string fields in order, failing on the first one that is absent,
/// null or empty.
pub fn required_fields<'a, const N: usize>(
    body: &'a Map<String, Value>,
    names: [&'static str; N],
) -> Result<[&'a str; N], ApiError> {
    let mut values = [""; N];

    for (slot, name) in values.iter_mut().zip(names) {
        *slot = match body.get(name) {
            Some(Value::String(s)) if !s.is_empty() => s.as_str(),
            None | Some(Value::Null) | Some(Value::String(_)) => {
                return Err(ApiError::MissingField(name));
            }
            Some(_) => return Err(ApiError::InvalidField(name)),
        };
    }

    Ok(values)
}

/// Parses an ISO-8601 timestamp. A `Z` suffix or numeric offset is honoured; timestamps
/// without an offset are taken as UTC.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }

    Err(ApiError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}
