//! Tap processing.
//!
//! Each employee is either Closed (no open presence record) or Open (one open
//! record). A tap on the same calendar day as the open record's check-in closes
//! it; any other tap opens a new record. A record left open on an earlier day
//! is not closed by a later tap: it stays open and a new record is opened next
//! to it.
//!
//! The "find open record, act, persist" sequence runs while holding the
//! employee's transaction guard from [`PresenceStore::lock_employee`], so two
//! taps for the same employee serialize and the second sees the first.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::PresenceRecord;
use crate::store::{EmployeeStore, PresenceStore};

/// The action a tap resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TapAction {
    /// A new record was opened.
    Checkin,
    /// The open record of the day was closed.
    Checkout,
}

/// The result of a tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapOutcome {
    /// Whether the tap checked in or out.
    pub action: TapAction,
    /// Display name of the employee.
    pub employee_name: String,
    /// The record that was opened or closed.
    pub record: PresenceRecord,
}

/// Calendar used to decide whether a tap falls on the same day as a check-in.
///
/// Defaults to UTC. A site running on local time configures its offset
/// explicitly instead of relying on the host timezone.
///
/// # Example
///
/// ```
/// use attendance_engine::attendance::TapCalendar;
/// use chrono::{TimeZone, Utc};
///
/// let hanoi = TapCalendar::from_offset_minutes(7 * 60).unwrap();
/// let late_evening_utc = Utc.with_ymd_and_hms(2025, 10, 21, 18, 0, 0).unwrap();
/// // 18:00 UTC is already the next day at UTC+7
/// assert_eq!(hanoi.day_of(late_evening_utc).to_string(), "2025-10-22");
/// assert_eq!(TapCalendar::utc().day_of(late_evening_utc).to_string(), "2025-10-21");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapCalendar {
    offset: FixedOffset,
}

impl Default for TapCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl TapCalendar {
    /// The UTC calendar.
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// A calendar at a fixed offset east of UTC, in minutes.
    ///
    /// Fails with [`EngineError::InvalidDate`] outside ±24 hours.
    pub fn from_offset_minutes(minutes: i32) -> EngineResult<Self> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| EngineError::InvalidDate {
                message: format!("UTC offset of {} minutes is out of range", minutes),
            })?;
        Ok(Self { offset })
    }

    /// The calendar day `instant` falls on.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}

/// Applies one tap of `tag` at `now`.
///
/// # Arguments
///
/// * `store` - Roster and presence storage
/// * `tag` - The presented tag identifier
/// * `now` - The tap instant
/// * `calendar` - The calendar used for the same-day check
///
/// # Returns
///
/// The [`TapOutcome`], or [`EngineError::UnknownTag`] when no employee holds
/// the tag.
pub async fn process_tap<S>(
    store: &S,
    tag: &str,
    now: DateTime<Utc>,
    calendar: TapCalendar,
) -> EngineResult<TapOutcome>
where
    S: EmployeeStore + PresenceStore + ?Sized,
{
    let tag = tag.trim();
    let employee = store
        .find_by_tag(tag)
        .await?
        .ok_or_else(|| EngineError::UnknownTag {
            tag: tag.to_string(),
        })?;

    let _guard = store.lock_employee(employee.id).await?;

    let open = store.latest_open_record(employee.id).await?;
    let (action, record) = match open {
        Some(open) if calendar.day_of(open.check_in) == calendar.day_of(now) => {
            let closed = store.close_record(open.id, now).await?;
            (TapAction::Checkout, closed)
        }
        stale => {
            if let Some(stale) = stale {
                warn!(
                    employee_id = employee.id,
                    record_id = stale.id,
                    check_in = %stale.check_in,
                    "Open record from an earlier day left open"
                );
            }
            let opened = store.open_record(employee.id, now).await?;
            (TapAction::Checkin, opened)
        }
    };

    info!(
        employee_id = employee.id,
        record_id = record.id,
        action = ?action,
        "Tap processed"
    );

    Ok(TapOutcome {
        action,
        employee_name: employee.full_name,
        record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewEmployee;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, day, h, m, 0).unwrap()
    }

    async fn store_with_tag(tag: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_employee(NewEmployee {
                full_name: "Linh Tran".to_string(),
                email: "linh@company.com".to_string(),
                tag_id: Some(tag.to_string()),
                hourly_rate: Decimal::new(25000, 0),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_unknown_tag_is_rejected() {
        let store = store_with_tag("T1").await;
        let err = process_tap(&store, "NOPE", at(21, 8, 0), TapCalendar::utc())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownTag { ref tag } if tag == "NOPE"));
        assert!(store.presence_records().await.is_empty());
    }

    #[tokio::test]
    async fn test_first_tap_checks_in() {
        let store = store_with_tag("T1").await;
        let outcome = process_tap(&store, "T1", at(21, 8, 0), TapCalendar::utc())
            .await
            .unwrap();

        assert_eq!(outcome.action, TapAction::Checkin);
        assert_eq!(outcome.employee_name, "Linh Tran");
        assert_eq!(outcome.record.check_in, at(21, 8, 0));
        assert!(outcome.record.check_out.is_none());
    }

    #[tokio::test]
    async fn test_second_tap_same_day_closes_same_record() {
        let store = store_with_tag("T1").await;
        let first = process_tap(&store, "T1", at(21, 8, 0), TapCalendar::utc())
            .await
            .unwrap();
        let second = process_tap(&store, "T1", at(21, 17, 0), TapCalendar::utc())
            .await
            .unwrap();

        assert_eq!(second.action, TapAction::Checkout);
        assert_eq!(second.record.id, first.record.id);
        assert_eq!(second.record.check_out, Some(at(21, 17, 0)));
        assert_eq!(store.presence_records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_third_tap_opens_new_record() {
        let store = store_with_tag("T1").await;
        for t in [at(21, 8, 0), at(21, 12, 0), at(21, 13, 0)] {
            process_tap(&store, "T1", t, TapCalendar::utc()).await.unwrap();
        }
        let records = store.presence_records().await;
        assert_eq!(records.len(), 2);
        assert!(records[1].is_open());
    }

    #[tokio::test]
    async fn test_stale_open_record_stays_open() {
        let store = store_with_tag("T1").await;
        let yesterday = process_tap(&store, "T1", at(20, 8, 0), TapCalendar::utc())
            .await
            .unwrap();
        let today = process_tap(&store, "T1", at(21, 8, 0), TapCalendar::utc())
            .await
            .unwrap();

        assert_eq!(today.action, TapAction::Checkin);
        assert_ne!(today.record.id, yesterday.record.id);

        let records = store.presence_records().await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(PresenceRecord::is_open));

        // the next tap today closes today's record, not yesterday's
        let close = process_tap(&store, "T1", at(21, 17, 0), TapCalendar::utc())
            .await
            .unwrap();
        assert_eq!(close.record.id, today.record.id);
        let stale = &store.presence_records().await[0];
        assert!(stale.is_open());
    }

    #[tokio::test]
    async fn test_same_day_uses_configured_calendar() {
        let store = store_with_tag("T1").await;
        let hanoi = TapCalendar::from_offset_minutes(7 * 60).unwrap();

        // 17:30 UTC on the 20th and 01:30 UTC on the 21st are both the 21st in UTC+7
        process_tap(&store, "T1", Utc.with_ymd_and_hms(2025, 10, 20, 17, 30, 0).unwrap(), hanoi)
            .await
            .unwrap();
        let second = process_tap(&store, "T1", at(21, 1, 30), hanoi).await.unwrap();
        assert_eq!(second.action, TapAction::Checkout);
    }

    #[tokio::test]
    async fn test_tag_is_trimmed() {
        let store = store_with_tag("T1").await;
        let outcome = process_tap(&store, "  T1 ", at(21, 8, 0), TapCalendar::utc())
            .await
            .unwrap();
        assert_eq!(outcome.action, TapAction::Checkin);
    }

    #[test]
    fn test_offset_out_of_range_is_rejected() {
        assert!(TapCalendar::from_offset_minutes(25 * 60).is_err());
        assert!(TapCalendar::from_offset_minutes(-5 * 60).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_taps_never_open_two_records() {
        for _ in 0..20 {
            let store = Arc::new(store_with_tag("T1").await);
            let now = at(21, 8, 0);

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let store = Arc::clone(&store);
                    tokio::spawn(async move {
                        process_tap(store.as_ref(), "T1", now, TapCalendar::utc()).await
                    })
                })
                .collect();

            let mut actions = Vec::new();
            for handle in handles {
                actions.push(handle.await.unwrap().unwrap().action);
            }
            actions.sort_by_key(|a| *a == TapAction::Checkout);

            assert_eq!(actions, vec![TapAction::Checkin, TapAction::Checkout]);
            let records = store.presence_records().await;
            assert_eq!(records.len(), 1);
            assert_eq!(records.iter().filter(|r| r.is_open()).count(), 0);
        }
    }
}
