//! Single-employee payroll lookups.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::{PeriodRange, round_hours};
use crate::error::{EngineError, EngineResult};
use crate::models::{Employee, EmployeeId, PayrollRecord, RecordId};
use crate::store::{EmployeeStore, PayrollStore, PresenceStore};

/// The stored payroll of one employee for one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeePayroll {
    /// The employee.
    pub employee_id: EmployeeId,
    /// Display name.
    pub full_name: String,
    /// Period label.
    pub period: String,
    /// Stored hours.
    pub hours: Decimal,
    /// Stored salary.
    pub salary: Decimal,
}

/// One presence record in an employee detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceDetail {
    /// Record id.
    pub record_id: RecordId,
    /// Check-in instant.
    pub check_in: DateTime<Utc>,
    /// Check-out instant, absent while open.
    pub check_out: Option<DateTime<Utc>>,
    /// Rounded hours; zero while open.
    pub hours: Decimal,
}

/// Stored payroll plus the presence records behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeePeriodDetail {
    /// The employee.
    pub employee_id: EmployeeId,
    /// Display name.
    pub full_name: String,
    /// Contact address.
    pub email: Option<String>,
    /// Period label.
    pub period: String,
    /// Stored hours.
    pub total_hours: Decimal,
    /// Stored salary.
    pub total_salary: Decimal,
    /// Records checked in during the period, by check-in.
    pub records: Vec<PresenceDetail>,
}

async fn load_payroll<S>(
    store: &S,
    employee_id: EmployeeId,
    period: &str,
) -> EngineResult<(Employee, PayrollRecord)>
where
    S: EmployeeStore + PayrollStore + ?Sized,
{
    let payroll = store
        .get_payroll(employee_id, period)
        .await?
        .ok_or_else(|| EngineError::not_found("PayrollRecord", format!("{}/{}", employee_id, period)))?;
    let employee = store
        .get_employee(employee_id)
        .await?
        .ok_or_else(|| EngineError::not_found("Employee", employee_id))?;
    Ok((employee, payroll))
}

/// Looks up the payroll stored for (employee, period).
///
/// Fails with [`EngineError::RecordNotFound`] when nothing is stored under
/// that key.
pub async fn employee_payroll<S>(
    store: &S,
    employee_id: EmployeeId,
    period: &str,
) -> EngineResult<EmployeePayroll>
where
    S: EmployeeStore + PayrollStore + ?Sized,
{
    let (employee, payroll) = load_payroll(store, employee_id, period).await?;
    Ok(EmployeePayroll {
        employee_id,
        full_name: employee.full_name,
        period: payroll.period,
        hours: payroll.total_hours,
        salary: payroll.total_salary,
    })
}

/// Returns the payroll stored under `range.label` with the employee's
/// presence records checked in inside `range`, open ones included.
pub async fn employee_period_detail<S>(
    store: &S,
    employee_id: EmployeeId,
    range: &PeriodRange,
) -> EngineResult<EmployeePeriodDetail>
where
    S: EmployeeStore + PayrollStore + PresenceStore + ?Sized,
{
    let (employee, payroll) = load_payroll(store, employee_id, &range.label).await?;
    let records = store
        .employee_records(employee_id, range.start, range.end)
        .await?
        .into_iter()
        .map(|record| PresenceDetail {
            hours: round_hours(record.worked_hours().unwrap_or_default()),
            record_id: record.id,
            check_in: record.check_in,
            check_out: record.check_out,
        })
        .collect();

    Ok(EmployeePeriodDetail {
        employee_id,
        full_name: employee.full_name,
        email: employee.email,
        period: payroll.period,
        total_hours: payroll.total_hours,
        total_salary: payroll.total_salary,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::aggregate_period;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn at(month: u32, day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, day, h, 0, 0).unwrap()
    }

    fn seeded() -> MemoryStore {
        MemoryStore::with_employees(vec![Employee {
            id: 5,
            full_name: "Linh Tran".to_string(),
            email: Some("linh@company.com".to_string()),
            tag_id: Some("T5".to_string()),
            hourly_rate: Decimal::new(25000, 0),
            banned: false,
        }])
        .unwrap()
    }

    #[tokio::test]
    async fn test_employee_payroll_not_found_before_aggregation() {
        let store = seeded();
        let err = employee_payroll(&store, 5, "2025-10").await.unwrap_err();
        assert!(matches!(err, EngineError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_employee_payroll_after_aggregation() {
        let store = seeded();
        let record = store.open_record(5, at(10, 1, 8)).await.unwrap();
        store.close_record(record.id, at(10, 1, 12)).await.unwrap();
        aggregate_period(&store, &PeriodRange::month(2025, 10).unwrap())
            .await
            .unwrap();

        let payroll = employee_payroll(&store, 5, "2025-10").await.unwrap();
        assert_eq!(payroll.full_name, "Linh Tran");
        assert_eq!(payroll.hours.to_string(), "4.00");
        assert_eq!(payroll.salary, Decimal::new(100000, 0));
    }

    #[tokio::test]
    async fn test_period_detail_lists_open_records_with_zero_hours() {
        let store = seeded();
        let closed = store.open_record(5, at(10, 1, 8)).await.unwrap();
        store.close_record(closed.id, at(10, 1, 10)).await.unwrap();
        let open = store.open_record(5, at(10, 2, 8)).await.unwrap();
        store.open_record(5, at(11, 1, 8)).await.unwrap();

        let range = PeriodRange::month(2025, 10).unwrap();
        aggregate_period(&store, &range).await.unwrap();
        let detail = employee_period_detail(&store, 5, &range).await.unwrap();

        assert_eq!(detail.total_hours.to_string(), "2.00");
        assert_eq!(detail.records.len(), 2);
        assert_eq!(detail.records[0].hours.to_string(), "2.00");
        assert_eq!(detail.records[1].record_id, open.id);
        assert_eq!(detail.records[1].hours.to_string(), "0.00");
    }
}
