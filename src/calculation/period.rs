//! Period range calculation.
//!
//! This module turns a period kind and an anchor date into a half-open UTC
//! interval `[start, end)` plus the canonical label payroll records are keyed
//! under. Custom ranges skip the calendar and carry a caller-supplied label.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The calendar granularity of a period.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::PeriodKind;
///
/// let kind: PeriodKind = serde_json::from_str("\"quarter\"").unwrap();
/// assert_eq!(kind, PeriodKind::Quarter);
/// assert_eq!(PeriodKind::default(), PeriodKind::Month);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    /// A single calendar day.
    Day,
    /// A Monday-based week.
    Week,
    /// A calendar month.
    #[default]
    Month,
    /// A calendar quarter.
    Quarter,
    /// A calendar year.
    Year,
}

impl std::fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodKind::Day => write!(f, "day"),
            PeriodKind::Week => write!(f, "week"),
            PeriodKind::Month => write!(f, "month"),
            PeriodKind::Quarter => write!(f, "quarter"),
            PeriodKind::Year => write!(f, "year"),
        }
    }
}

/// A half-open UTC interval with its period label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    /// Inclusive start of the interval.
    pub start: DateTime<Utc>,
    /// Exclusive end of the interval.
    pub end: DateTime<Utc>,
    /// The label payroll records for this interval are stored under.
    pub label: String,
}

impl PeriodRange {
    /// Builds a custom range with an explicit label.
    ///
    /// Fails with [`EngineError::InvalidRange`] unless `end > start`.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::calculation::PeriodRange;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let start = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
    /// let end = Utc.with_ymd_and_hms(2025, 10, 16, 0, 0, 0).unwrap();
    ///
    /// let range = PeriodRange::custom(start, end, "2025-10-H1").unwrap();
    /// assert_eq!(range.label, "2025-10-H1");
    /// assert!(PeriodRange::custom(end, start, "bad").is_err());
    /// ```
    pub fn custom(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        label: impl Into<String>,
    ) -> EngineResult<Self> {
        if end <= start {
            return Err(EngineError::InvalidRange { start, end });
        }
        Ok(Self {
            start,
            end,
            label: label.into(),
        })
    }

    /// Builds a reporting range from arbitrary instants.
    ///
    /// The bounds are validated as given, then truncated to their UTC dates.
    /// Without a label, `YYYY-MM-DD..YYYY-MM-DD` is used.
    pub fn reporting(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        label: Option<String>,
    ) -> EngineResult<Self> {
        if end <= start {
            return Err(EngineError::InvalidRange { start, end });
        }
        let start_date = start.date_naive();
        let end_date = end.date_naive();
        let label = label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| {
                format!(
                    "{}..{}",
                    start_date.format("%Y-%m-%d"),
                    end_date.format("%Y-%m-%d")
                )
            });
        Ok(Self {
            start: utc_midnight(start_date),
            end: utc_midnight(end_date),
            label,
        })
    }

    /// Builds the range of a calendar month, labelled `YYYY-MM`.
    pub fn month(year: i32, month: u32) -> EngineResult<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            EngineError::InvalidDate {
                message: format!("{}-{} is not a valid month", year, month),
            }
        })?;
        period_range(PeriodKind::Month, first)
    }

    /// Returns true if `instant` lies inside `[start, end)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Computes the interval and label of the period of `kind` containing `anchor`.
///
/// # Arguments
///
/// * `kind` - The calendar granularity
/// * `anchor` - Any date inside the wanted period, taken at UTC midnight
///
/// # Returns
///
/// The half-open [`PeriodRange`], or [`EngineError::InvalidDate`] if the end
/// of the period falls outside the representable calendar.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::{period_range, PeriodKind};
/// use chrono::NaiveDate;
///
/// // 2025-10-21 is a Tuesday
/// let anchor = NaiveDate::from_ymd_opt(2025, 10, 21).unwrap();
/// let week = period_range(PeriodKind::Week, anchor).unwrap();
///
/// assert_eq!(week.start.date_naive(), NaiveDate::from_ymd_opt(2025, 10, 20).unwrap());
/// assert_eq!(week.end.date_naive(), NaiveDate::from_ymd_opt(2025, 10, 27).unwrap());
/// assert_eq!(week.label, "2025-W43");
/// ```
pub fn period_range(kind: PeriodKind, anchor: NaiveDate) -> EngineResult<PeriodRange> {
    let (start, end, label) = match kind {
        PeriodKind::Day => {
            let end = add_days(anchor, 1)?;
            (anchor, end, anchor.format("%Y-%m-%d").to_string())
        }
        PeriodKind::Week => {
            let start = start_of_week(anchor)?;
            let end = add_days(start, 7)?;
            let label = format!("{:04}-W{:02}", anchor.year(), week_number(anchor));
            (start, end, label)
        }
        PeriodKind::Month => {
            let start = first_of_month(anchor.year(), anchor.month())?;
            let end = add_months(start, 1)?;
            let label = format!("{:04}-{:02}", anchor.year(), anchor.month());
            (start, end, label)
        }
        PeriodKind::Quarter => {
            let quarter = (anchor.month() - 1) / 3 + 1;
            let start = first_of_month(anchor.year(), (quarter - 1) * 3 + 1)?;
            let end = add_months(start, 3)?;
            (start, end, format!("{:04}-Q{}", anchor.year(), quarter))
        }
        PeriodKind::Year => {
            let start = first_of_month(anchor.year(), 1)?;
            let end = add_months(start, 12)?;
            (start, end, format!("{:04}", anchor.year()))
        }
    };

    Ok(PeriodRange {
        start: utc_midnight(start),
        end: utc_midnight(end),
        label,
    })
}

/// Week number used in week labels.
///
/// `ceil((anchor - Jan 1) / 7 + weekday(Jan 1) / 7)` with Sunday = 0, clamped
/// to at least 1. This is not ISO-8601 week numbering; existing labels depend
/// on it staying exactly this formula.
pub fn week_number(anchor: NaiveDate) -> u32 {
    let jan_first = NaiveDate::from_ymd_opt(anchor.year(), 1, 1).unwrap_or(anchor);
    let days = (anchor - jan_first).num_days();
    let offset = i64::from(jan_first.weekday().num_days_from_sunday());
    let week = (days + offset + 6) / 7;
    week.max(1) as u32
}

/// Monday on or before `date`; Sundays go back six days.
fn start_of_week(date: NaiveDate) -> EngineResult<NaiveDate> {
    let back = match date.weekday() {
        Weekday::Sun => 6,
        other => other.number_from_monday() - 1,
    };
    sub_days(date, back.into())
}

fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn first_of_month(year: i32, month: u32) -> EngineResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| EngineError::InvalidDate {
        message: format!("{}-{:02}-01 is out of range", year, month),
    })
}

fn add_months(date: NaiveDate, months: u32) -> EngineResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| out_of_range(date))
}

fn add_days(date: NaiveDate, days: u64) -> EngineResult<NaiveDate> {
    date.checked_add_days(chrono::Days::new(days))
        .ok_or_else(|| out_of_range(date))
}

fn sub_days(date: NaiveDate, days: u64) -> EngineResult<NaiveDate> {
    date.checked_sub_days(chrono::Days::new(days))
        .ok_or_else(|| out_of_range(date))
}

fn out_of_range(date: NaiveDate) -> EngineError {
    EngineError::InvalidDate {
        message: format!("period around {} is out of range", date),
    }
}
