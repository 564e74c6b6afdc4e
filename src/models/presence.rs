//! Presence record model.
//!
//! A [`PresenceRecord`] is one check-in/check-out pair produced by the tap
//! state machine. It is open while its check-out is absent.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::employee::EmployeeId;

/// Identifier of a presence record in the store.
pub type RecordId = u64;

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// A check-in/check-out pair belonging to one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// Unique identifier for the record.
    pub id: RecordId,
    /// The employee this record belongs to.
    pub employee_id: EmployeeId,
    /// When the employee checked in.
    pub check_in: DateTime<Utc>,
    /// When the employee checked out, absent while the record is open.
    pub check_out: Option<DateTime<Utc>>,
}

impl PresenceRecord {
    /// Returns true if the record has no check-out yet.
    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }

    /// Returns the unrounded worked hours of a closed record.
    ///
    /// Open records have no duration and return `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::PresenceRecord;
    /// use chrono::{TimeZone, Utc};
    /// use rust_decimal::Decimal;
    ///
    /// let record = PresenceRecord {
    ///     id: 1,
    ///     employee_id: 7,
    ///     check_in: Utc.with_ymd_and_hms(2025, 10, 21, 8, 0, 0).unwrap(),
    ///     check_out: Some(Utc.with_ymd_and_hms(2025, 10, 21, 16, 30, 0).unwrap()),
    /// };
    /// assert_eq!(record.worked_hours(), Some(Decimal::new(85, 1)));
    /// ```
    pub fn worked_hours(&self) -> Option<Decimal> {
        self.check_out.map(|check_out| {
            let millis = (check_out - self.check_in).num_milliseconds();
            Decimal::from(millis) / Decimal::from(MILLIS_PER_HOUR)
        })
    }

    /// Returns true if the check-in lies inside `[start, end)`.
    pub fn checked_in_within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.check_in >= start && self.check_in < end
    }
}
