// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format a UTC timestamp as RFC3339 with milliseconds and a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp string.
///
/// Accepts RFC3339, and offset-less ISO date-times which are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Truncate a timestamp down to the whole minute.
pub fn round_to_minute(date: DateTime<Utc>) -> DateTime<Utc> {
    let millis = date.timestamp_millis().div_euclid(60_000) * 60_000;
    Utc.timestamp_millis_opt(millis).single().unwrap_or(date)
}

/// Serialized timestamps come either as strings or epoch milliseconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(f64),
    Text(String),
}

impl RawTimestamp {
    fn resolve(self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Millis(ms) if ms.is_finite() => {
                Utc.timestamp_millis_opt(ms as i64).single()
            }
            RawTimestamp::Millis(_) => None,
            RawTimestamp::Text(text) => parse_timestamp(&text),
        }
    }
}

/// Serde adapter for required timestamps.
pub mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_utc_rfc3339(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        RawTimestamp::deserialize(d)?
            .resolve()
            .ok_or_else(|| serde::de::Error::custom("invalid timestamp"))
    }
}

/// Serde adapter for optional timestamps; `null` and absent both mean `None`.
pub mod optional_timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(date: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => s.serialize_str(&format_utc_rfc3339(*date)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<RawTimestamp>::deserialize(d)? {
            Some(raw) => raw
                .resolve()
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom("invalid timestamp")),
            None => Ok(None),
        }
    }
}
