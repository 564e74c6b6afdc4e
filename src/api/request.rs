//! Request types for the attendance API.
//!
//! This module defines the JSON bodies and query strings accepted by the
//! HTTP endpoints.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::calculation::PeriodKind;

/// Request body for `POST /attendance/tap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapRequest {
    /// The presented tag identifier.
    pub tag_id: String,
}

/// Request body for `PUT /employees/:id/tag`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignTagRequest {
    /// The tag to assign.
    pub tag_id: String,
}

/// Query for endpoints addressed by period kind and anchor date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodQuery {
    /// Period kind, month when omitted.
    #[serde(default)]
    pub kind: PeriodKind,
    /// Anchor date, today (UTC) when omitted.
    #[serde(default)]
    pub anchor: Option<NaiveDate>,
}

impl PeriodQuery {
    /// The anchor date, defaulting to today's UTC date.
    pub fn anchor_or_today(&self) -> NaiveDate {
        self.anchor.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// Query for endpoints addressed by an explicit interval.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeQuery {
    /// Inclusive start, as a date or an RFC 3339 instant.
    #[serde(deserialize_with = "deserialize_instant")]
    pub start: DateTime<Utc>,
    /// Exclusive end, as a date or an RFC 3339 instant.
    #[serde(deserialize_with = "deserialize_instant")]
    pub end: DateTime<Utc>,
    /// Optional period label.
    #[serde(default)]
    pub label: Option<String>,
}

/// Query for `POST /payroll/calculate-range`, where the label is required.
#[derive(Debug, Clone, Deserialize)]
pub struct CalculateRangeQuery {
    /// Inclusive start, as a date or an RFC 3339 instant.
    #[serde(deserialize_with = "deserialize_instant")]
    pub start: DateTime<Utc>,
    /// Exclusive end, as a date or an RFC 3339 instant.
    #[serde(deserialize_with = "deserialize_instant")]
    pub end: DateTime<Utc>,
    /// Label the payroll records are stored under.
    pub label: String,
}

/// Query addressing a calendar month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MonthQuery {
    /// Year.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
}

/// Query addressing a stored period label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelQuery {
    /// Period label.
    pub label: String,
}

/// Query for `PUT /employees/:id/ban`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BanQuery {
    /// New banned flag, true when omitted.
    #[serde(default = "default_banned")]
    pub banned: bool,
}

fn default_banned() -> bool {
    true
}

/// Parses `YYYY-MM-DD` (UTC midnight), `YYYY-MM-DDTHH:MM:SS` (UTC) or an
/// RFC 3339 instant.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid date '{}', expected YYYY-MM-DD or an RFC 3339 timestamp",
            raw
        ))
    })
}
