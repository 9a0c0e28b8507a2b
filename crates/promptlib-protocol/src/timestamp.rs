//! Serde helpers for ISO-8601 timestamps with millisecond precision.
//!
//! Every timestamp in the library is a UTC instant rendered as
//! `YYYY-MM-DDTHH:MM:SS.sssZ`. Values are truncated to milliseconds on the way
//! in so that a record survives an export/import cycle unchanged.

use chrono::{DateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer, de};

/// Current time truncated to millisecond precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Render a timestamp as an ISO-8601 string with milliseconds and `Z`.
pub fn to_iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 (RFC 3339) string into a millisecond-precision UTC instant.
pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc).trunc_subsecs(3))
}

/// Convert epoch milliseconds into a UTC instant.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_iso(ts))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_iso(&raw).ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp: {raw}")))
}

/// Variant that also accepts epoch-millisecond numbers, as older note
/// entries were written that way. Serialization always emits ISO strings.
pub mod lenient {
    use super::{from_epoch_millis, parse_iso};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, de};

    pub use super::serialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Millis(i64),
        Float(f64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Text(raw) => parse_iso(&raw)
                .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp: {raw}"))),
            RawTimestamp::Millis(millis) => from_epoch_millis(millis)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {millis}"))),
            RawTimestamp::Float(millis) if millis.is_finite() => from_epoch_millis(millis as i64)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {millis}"))),
            RawTimestamp::Float(millis) => {
                Err(de::Error::custom(format!("invalid timestamp: {millis}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{from_epoch_millis, parse_iso, to_iso};
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_millisecond_precision_with_zulu_suffix() {
        let ts = from_epoch_millis(1_700_000_000_123).expect("ts");
        assert_eq!(to_iso(&ts), "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn parse_truncates_sub_millisecond_digits() {
        let ts = parse_iso("2024-01-02T03:04:05.123456Z").expect("ts");
        assert_eq!(to_iso(&ts), "2024-01-02T03:04:05.123Z");
    }

    #[test]
    fn parse_normalizes_offsets_to_utc() {
        let ts = parse_iso("2024-01-02T05:04:05.000+02:00").expect("ts");
        assert_eq!(to_iso(&ts), "2024-01-02T03:04:05.000Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_iso("yesterday").is_none());
        assert!(parse_iso("2024-13-40T00:00:00Z").is_none());
    }
}
