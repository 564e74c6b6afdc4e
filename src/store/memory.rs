//! In-process store.
//!
//! [`MemoryStore`] keeps all tables behind one `RwLock`, so snapshots and
//! payroll upserts see and write a consistent state. Per-employee presence
//! transactions use a separate mutex per employee.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Employee, EmployeeId, NewEmployee, PayrollRecord, PayrollUpsert, PresenceRecord, RecordId,
};

use super::{
    EmployeeLock, EmployeeStore, PayrollStore, PresenceStore, Snapshot, SnapshotStore,
};

#[derive(Debug, Default)]
struct Tables {
    employees: BTreeMap<EmployeeId, Employee>,
    presence: BTreeMap<RecordId, PresenceRecord>,
    payrolls: HashMap<(EmployeeId, String), PayrollRecord>,
    next_employee_id: EmployeeId,
    next_record_id: RecordId,
    next_payroll_id: u64,
}

impl Tables {
    fn tag_holder(&self, tag: &str, except: Option<EmployeeId>) -> Option<&Employee> {
        self.employees
            .values()
            .filter(|e| Some(e.id) != except)
            .find(|e| e.tag_id.as_deref() == Some(tag))
    }

    fn ensure_tag_free(&self, tag: &str, except: Option<EmployeeId>) -> EngineResult<()> {
        match self.tag_holder(tag, except) {
            Some(holder) => Err(EngineError::DuplicateTag {
                tag: tag.to_string(),
                holder: holder.full_name.clone(),
            }),
            None => Ok(()),
        }
    }

    fn employee_mut(&mut self, id: EmployeeId) -> EngineResult<&mut Employee> {
        self.employees
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found("Employee", id))
    }
}

/// Store that keeps everything in memory.
///
/// # Example
///
/// ```
/// use attendance_engine::models::Employee;
/// use attendance_engine::store::MemoryStore;
/// use rust_decimal::Decimal;
///
/// let roster = vec![Employee {
///     id: 1,
///     full_name: "Linh Tran".to_string(),
///     email: Some("linh@company.com".to_string()),
///     tag_id: Some("TAG-1".to_string()),
///     hourly_rate: Decimal::new(25000, 0),
///     banned: false,
/// }];
/// let store = MemoryStore::with_employees(roster).unwrap();
/// # drop(store);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    employee_locks: Mutex<HashMap<EmployeeId, Arc<Mutex<()>>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with a roster whose ids are already assigned.
    ///
    /// Fails on an invalid entry or on duplicate ids or tags.
    pub fn with_employees(employees: Vec<Employee>) -> EngineResult<Self> {
        let mut tables = Tables::default();
        for employee in employees {
            employee.validate()?;
            if tables.employees.contains_key(&employee.id) {
                return Err(EngineError::InvalidEmployee {
                    field: "id".to_string(),
                    message: format!("duplicate employee id {}", employee.id),
                });
            }
            if let Some(tag) = employee.tag_id.as_deref() {
                tables.ensure_tag_free(tag, None)?;
            }
            tables.next_employee_id = tables.next_employee_id.max(employee.id);
            tables.employees.insert(employee.id, employee);
        }
        Ok(Self {
            tables: RwLock::new(tables),
            employee_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Returns every presence record, ordered by id.
    pub async fn presence_records(&self) -> Vec<PresenceRecord> {
        self.tables.read().await.presence.values().cloned().collect()
    }

    /// Removes a presence record; used for administrative corrections.
    pub async fn remove_presence_record(&self, id: RecordId) -> Option<PresenceRecord> {
        self.tables.write().await.presence.remove(&id)
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn list_employees(&self) -> EngineResult<Vec<Employee>> {
        Ok(self.tables.read().await.employees.values().cloned().collect())
    }

    async fn get_employee(&self, id: EmployeeId) -> EngineResult<Option<Employee>> {
        Ok(self.tables.read().await.employees.get(&id).cloned())
    }

    async fn find_by_tag(&self, tag: &str) -> EngineResult<Option<Employee>> {
        Ok(self.tables.read().await.tag_holder(tag, None).cloned())
    }

    async fn insert_employee(&self, employee: NewEmployee) -> EngineResult<Employee> {
        employee.validate()?;
        let mut tables = self.tables.write().await;
        if let Some(tag) = employee.tag_id.as_deref() {
            tables.ensure_tag_free(tag.trim(), None)?;
        }
        tables.next_employee_id += 1;
        let stored = employee.into_employee(tables.next_employee_id);
        tables.employees.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn assign_tag(&self, id: EmployeeId, tag: &str) -> EngineResult<Employee> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(EngineError::InvalidEmployee {
                field: "tag_id".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        let mut tables = self.tables.write().await;
        tables.employee_mut(id)?;
        tables.ensure_tag_free(tag, Some(id))?;
        let employee = tables.employee_mut(id)?;
        employee.tag_id = Some(tag.to_string());
        Ok(employee.clone())
    }

    async fn set_banned(&self, id: EmployeeId, banned: bool) -> EngineResult<Employee> {
        let mut tables = self.tables.write().await;
        let employee = tables.employee_mut(id)?;
        employee.banned = banned;
        Ok(employee.clone())
    }
}

#[async_trait]
impl PresenceStore for MemoryStore {
    async fn lock_employee(&self, employee_id: EmployeeId) -> EngineResult<EmployeeLock> {
        let lock = {
            let mut locks = self.employee_locks.lock().await;
            Arc::clone(locks.entry(employee_id).or_default())
        };
        Ok(lock.lock_owned().await)
    }

    async fn latest_open_record(
        &self,
        employee_id: EmployeeId,
    ) -> EngineResult<Option<PresenceRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .presence
            .values()
            .filter(|r| r.employee_id == employee_id && r.is_open())
            .max_by_key(|r| (r.check_in, r.id))
            .cloned())
    }

    async fn open_record(
        &self,
        employee_id: EmployeeId,
        check_in: DateTime<Utc>,
    ) -> EngineResult<PresenceRecord> {
        let mut tables = self.tables.write().await;
        if !tables.employees.contains_key(&employee_id) {
            return Err(EngineError::not_found("Employee", employee_id));
        }
        tables.next_record_id += 1;
        let record = PresenceRecord {
            id: tables.next_record_id,
            employee_id,
            check_in,
            check_out: None,
        };
        tables.presence.insert(record.id, record.clone());
        debug!(record_id = record.id, employee_id, "Presence record opened");
        Ok(record)
    }

    async fn close_record(
        &self,
        record_id: RecordId,
        check_out: DateTime<Utc>,
    ) -> EngineResult<PresenceRecord> {
        let mut tables = self.tables.write().await;
        let record = tables
            .presence
            .get_mut(&record_id)
            .ok_or_else(|| EngineError::not_found("PresenceRecord", record_id))?;
        if !record.is_open() {
            return Err(EngineError::InvalidPresence {
                record_id,
                message: "record is already closed".to_string(),
            });
        }
        if check_out < record.check_in {
            return Err(EngineError::InvalidPresence {
                record_id,
                message: format!(
                    "check-out {} is before check-in {}",
                    check_out, record.check_in
                ),
            });
        }
        record.check_out = Some(check_out);
        debug!(record_id, employee_id = record.employee_id, "Presence record closed");
        Ok(record.clone())
    }

    async fn employee_records(
        &self,
        employee_id: EmployeeId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<PresenceRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<PresenceRecord> = tables
            .presence
            .values()
            .filter(|r| r.employee_id == employee_id && r.checked_in_within(start, end))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.check_in, r.id));
        Ok(records)
    }
}

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn upsert_payrolls(&self, upserts: &[PayrollUpsert]) -> EngineResult<Vec<PayrollRecord>> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let mut written = Vec::with_capacity(upserts.len());
        for upsert in upserts {
            let key = (upsert.employee_id, upsert.period.clone());
            if let Some(existing) = tables.payrolls.get_mut(&key) {
                existing.overwrite(upsert);
                written.push(existing.clone());
                continue;
            }
            tables.next_payroll_id += 1;
            let record = PayrollRecord {
                id: tables.next_payroll_id,
                employee_id: upsert.employee_id,
                period: upsert.period.clone(),
                total_hours: upsert.total_hours,
                total_salary: upsert.total_salary,
            };
            tables.payrolls.insert(key, record.clone());
            written.push(record);
        }
        Ok(written)
    }

    async fn get_payroll(
        &self,
        employee_id: EmployeeId,
        period: &str,
    ) -> EngineResult<Option<PayrollRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payrolls
            .get(&(employee_id, period.to_string()))
            .cloned())
    }

    async fn payrolls_for_period(&self, period: &str) -> EngineResult<Vec<PayrollRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<PayrollRecord> = tables
            .payrolls
            .values()
            .filter(|p| p.period == period)
            .cloned()
            .collect();
        records.sort_by_key(|p| p.employee_id);
        Ok(records)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn snapshot(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> EngineResult<Snapshot> {
        let tables = self.tables.read().await;
        let employees = tables.employees.values().cloned().collect();
        let mut records: Vec<PresenceRecord> = tables
            .presence
            .values()
            .filter(|r| !r.is_open() && r.checked_in_within(start, end))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.check_in, r.id));
        Ok(Snapshot { employees, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn at(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, day, h, 0, 0).unwrap()
    }

    fn new_employee(name: &str, tag: Option<&str>) -> NewEmployee {
        NewEmployee {
            full_name: name.to_string(),
            email: format!("{}@company.com", name.to_lowercase()),
            tag_id: tag.map(str::to_string),
            hourly_rate: Decimal::new(20000, 0),
        }
    }

    fn upsert(employee_id: EmployeeId, period: &str, hours: i64) -> PayrollUpsert {
        PayrollUpsert {
            employee_id,
            period: period.to_string(),
            total_hours: Decimal::new(hours * 100, 2),
            total_salary: Decimal::new(hours * 1000, 0),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.insert_employee(new_employee("An", None)).await.unwrap();
        let b = store.insert_employee(new_employee("Binh", None)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn test_seeded_store_continues_after_highest_id() {
        let seeded = new_employee("An", Some("T1")).into_employee(10);
        let store = MemoryStore::with_employees(vec![seeded]).unwrap();
        let next = store.insert_employee(new_employee("Binh", None)).await.unwrap();
        assert_eq!(next.id, 11);
    }

    #[tokio::test]
    async fn test_seed_rejects_duplicate_tags() {
        let a = new_employee("An", Some("T1")).into_employee(1);
        let b = new_employee("Binh", Some("T1")).into_employee(2);
        let err = MemoryStore::with_employees(vec![a, b]).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateTag { .. }));
    }

    #[tokio::test]
    async fn test_seed_rejects_negative_rate() {
        let mut seeded = new_employee("An", None).into_employee(1);
        seeded.hourly_rate = Decimal::new(-1, 0);
        let err = MemoryStore::with_employees(vec![seeded]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidEmployee { ref field, .. } if field == "hourly_rate"));
    }

    #[tokio::test]
    async fn test_seed_rejects_blank_name() {
        let seeded = new_employee(" ", None).into_employee(1);
        assert!(MemoryStore::with_employees(vec![seeded]).is_err());
    }

    #[tokio::test]
    async fn test_huge_rate_never_reaches_the_store() {
        let mut seeded = new_employee("An", None).into_employee(1);
        seeded.hourly_rate = Decimal::MAX;
        assert!(MemoryStore::with_employees(vec![seeded]).is_err());

        let store = MemoryStore::new();
        let mut payload = new_employee("Binh", None);
        payload.hourly_rate = Decimal::MAX;
        let err = store.insert_employee(payload).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidEmployee { ref field, .. } if field == "hourly_rate"));
        assert!(store.list_employees().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_rejects_tag_held_by_other() {
        let store = MemoryStore::new();
        store.insert_employee(new_employee("An", Some("T1"))).await.unwrap();
        let err = store
            .insert_employee(new_employee("Binh", Some("T1")))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateTag { ref holder, .. } if holder == "An"));
    }

    #[tokio::test]
    async fn test_assign_tag_allows_reassigning_own_tag() {
        let store = MemoryStore::new();
        let an = store.insert_employee(new_employee("An", Some("T1"))).await.unwrap();
        let updated = store.assign_tag(an.id, "T1").await.unwrap();
        assert_eq!(updated.tag_id.as_deref(), Some("T1"));

        let binh = store.insert_employee(new_employee("Binh", None)).await.unwrap();
        assert!(store.assign_tag(binh.id, "T1").await.is_err());
        assert!(store.assign_tag(99, "T9").await.is_err());
    }

    #[tokio::test]
    async fn test_find_by_tag() {
        let store = MemoryStore::new();
        store.insert_employee(new_employee("An", Some("T1"))).await.unwrap();
        assert_eq!(store.find_by_tag("T1").await.unwrap().unwrap().full_name, "An");
        assert!(store.find_by_tag("T2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_banned_flips_flag() {
        let store = MemoryStore::new();
        let an = store.insert_employee(new_employee("An", None)).await.unwrap();
        assert!(store.set_banned(an.id, true).await.unwrap().banned);
        assert!(!store.set_banned(an.id, false).await.unwrap().banned);
    }

    #[tokio::test]
    async fn test_close_record_rejects_check_out_before_check_in() {
        let store = MemoryStore::new();
        let an = store.insert_employee(new_employee("An", None)).await.unwrap();
        let record = store.open_record(an.id, at(2, 9)).await.unwrap();

        let err = store.close_record(record.id, at(2, 8)).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidPresence { .. }));

        store.close_record(record.id, at(2, 17)).await.unwrap();
        let again = store.close_record(record.id, at(2, 18)).await.unwrap_err();
        assert!(matches!(again, EngineError::InvalidPresence { .. }));
    }

    #[tokio::test]
    async fn test_open_record_requires_employee() {
        let store = MemoryStore::new();
        let err = store.open_record(5, at(1, 9)).await.unwrap_err();
        assert!(matches!(err, EngineError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_latest_open_record_prefers_latest_check_in() {
        let store = MemoryStore::new();
        let an = store.insert_employee(new_employee("An", None)).await.unwrap();
        store.open_record(an.id, at(1, 9)).await.unwrap();
        let newer = store.open_record(an.id, at(2, 9)).await.unwrap();

        let latest = store.latest_open_record(an.id).await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
    }

    #[tokio::test]
    async fn test_snapshot_only_contains_closed_records_in_range() {
        let store = MemoryStore::new();
        let an = store.insert_employee(new_employee("An", None)).await.unwrap();
        let inside = store.open_record(an.id, at(2, 9)).await.unwrap();
        store.close_record(inside.id, at(2, 17)).await.unwrap();
        store.open_record(an.id, at(3, 9)).await.unwrap();
        let outside = store.open_record(an.id, at(20, 9)).await.unwrap();
        store.close_record(outside.id, at(20, 10)).await.unwrap();

        let snapshot = store.snapshot(at(1, 0), at(10, 0)).await.unwrap();
        assert_eq!(snapshot.employees.len(), 1);
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].id, inside.id);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_key() {
        let store = MemoryStore::new();
        let first = store.upsert_payrolls(&[upsert(1, "2025-10", 40)]).await.unwrap();
        let second = store.upsert_payrolls(&[upsert(1, "2025-10", 8)]).await.unwrap();

        assert_eq!(first[0].id, second[0].id);
        let stored = store.get_payroll(1, "2025-10").await.unwrap().unwrap();
        assert_eq!(stored.total_hours, Decimal::new(800, 2));
        assert_eq!(store.payrolls_for_period("2025-10").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_periods_apart() {
        let store = MemoryStore::new();
        store
            .upsert_payrolls(&[upsert(1, "2025-10", 40), upsert(1, "2025-W43", 10)])
            .await
            .unwrap();
        assert_eq!(store.payrolls_for_period("2025-10").await.unwrap().len(), 1);
        assert_eq!(store.payrolls_for_period("2025-W43").await.unwrap().len(), 1);
        assert!(store.get_payroll(2, "2025-10").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_employee_lock_serializes_holders() {
        let store = Arc::new(MemoryStore::new());
        let guard = store.lock_employee(1).await.unwrap();

        let contender = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let _guard = store.lock_employee(1).await.unwrap();
            })
        };
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        // other employees are not blocked
        let _other = store.lock_employee(2).await.unwrap();

        drop(guard);
        contender.await.unwrap();
    }
}
