//! Storage seams for the attendance engine.
//!
//! The engine talks to persistence only through the traits in this module.
//! [`MemoryStore`] is the in-process implementation used by the server binary
//! and by the tests; a database backend implements the same traits.
//!
//! Two consistency rules are part of the contract:
//! - [`PresenceStore::lock_employee`] scopes a per-employee transaction. The
//!   tap path holds it across "find open record, act, persist".
//! - [`PayrollStore::upsert_payrolls`] applies a whole run atomically, and each
//!   (employee, period) key is written at most once per call.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::EngineResult;
use crate::models::{
    Employee, EmployeeId, NewEmployee, PayrollRecord, PayrollUpsert, PresenceRecord, RecordId,
};

pub use memory::MemoryStore;

/// Guard for the per-employee presence transaction; dropping it commits.
pub type EmployeeLock = tokio::sync::OwnedMutexGuard<()>;

/// Roster access.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Returns every employee, ordered by id.
    async fn list_employees(&self) -> EngineResult<Vec<Employee>>;

    /// Looks up an employee by id.
    async fn get_employee(&self, id: EmployeeId) -> EngineResult<Option<Employee>>;

    /// Looks up the employee holding `tag`.
    async fn find_by_tag(&self, tag: &str) -> EngineResult<Option<Employee>>;

    /// Registers a new employee; the tag, if any, must be free.
    async fn insert_employee(&self, employee: NewEmployee) -> EngineResult<Employee>;

    /// Assigns or replaces an employee's tag; the tag must not be held by anyone else.
    async fn assign_tag(&self, id: EmployeeId, tag: &str) -> EngineResult<Employee>;

    /// Sets or clears the banned flag.
    async fn set_banned(&self, id: EmployeeId, banned: bool) -> EngineResult<Employee>;
}

/// Presence record access.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Opens the per-employee transaction scope.
    ///
    /// Callers hold the returned guard for the whole read-decide-write sequence.
    async fn lock_employee(&self, employee_id: EmployeeId) -> EngineResult<EmployeeLock>;

    /// Returns the open record of the employee with the latest check-in.
    async fn latest_open_record(
        &self,
        employee_id: EmployeeId,
    ) -> EngineResult<Option<PresenceRecord>>;

    /// Creates an open record checked in at `check_in`.
    async fn open_record(
        &self,
        employee_id: EmployeeId,
        check_in: DateTime<Utc>,
    ) -> EngineResult<PresenceRecord>;

    /// Sets the check-out of an open record.
    async fn close_record(
        &self,
        record_id: RecordId,
        check_out: DateTime<Utc>,
    ) -> EngineResult<PresenceRecord>;

    /// Returns one employee's records (open or closed) checked in inside
    /// `[start, end)`, ordered by check-in.
    async fn employee_records(
        &self,
        employee_id: EmployeeId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<PresenceRecord>>;
}

/// Payroll record access.
#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// Inserts or overwrites one record per (employee, period) in a single transaction.
    async fn upsert_payrolls(&self, upserts: &[PayrollUpsert]) -> EngineResult<Vec<PayrollRecord>>;

    /// Looks up the record for (employee, period).
    async fn get_payroll(
        &self,
        employee_id: EmployeeId,
        period: &str,
    ) -> EngineResult<Option<PayrollRecord>>;

    /// Returns every record stored under `period`, ordered by employee id.
    async fn payrolls_for_period(&self, period: &str) -> EngineResult<Vec<PayrollRecord>>;
}

/// A consistent read of the roster and the completed presence records.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Every employee, ordered by id.
    pub employees: Vec<Employee>,
    /// Closed records checked in inside the requested interval, ordered by
    /// check-in then id.
    pub records: Vec<PresenceRecord>,
}

/// Reads taken by aggregation and reporting runs.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Reads roster and closed records for `[start, end)` at one point in time.
    async fn snapshot(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> EngineResult<Snapshot>;
}

/// Everything the engine needs from persistence.
pub trait Store: EmployeeStore + PresenceStore + PayrollStore + SnapshotStore {}

impl<T> Store for T where T: EmployeeStore + PresenceStore + PayrollStore + SnapshotStore + ?Sized {}
