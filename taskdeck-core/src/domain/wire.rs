//! Lenient field decoders shared by the API response schemas
//!
//! The server is not consistent about ids (numeric or string) or timestamps
//! (RFC 3339 or zone-less local date-times), so the schemas normalise them here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value as JsonValue;

/// Wire format for due dates sent to the server
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Deserialize ID that can be number or string
pub fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::String(s) => Ok(s),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}

/// Deserialize a timestamp given as RFC 3339 or as a zone-less date-time (UTC)
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
}

/// Deserialize an optional due date (date-time, RFC 3339 or bare date)
pub fn deserialize_due_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_due(s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid due date: {}", s))),
    }
}

/// Serialize an optional due day as midnight, `YYYY-MM-DDT00:00:00`
pub fn serialize_due_date<S>(
    value: &Option<NaiveDate>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value.and_then(|day| day.and_hms_opt(0, 0, 0)) {
        Some(midnight) => serializer.serialize_str(&midnight.format(DUE_DATE_FORMAT).to_string()),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_due(raw: &str) -> Option<NaiveDateTime> {
    if let Some(ts) = parse_timestamp(raw) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
