//! Period summaries.
//!
//! A [`ReportSummary`] is re-derived from presence data for an interval; it
//! does not read or write payroll records. A [`StoredSummary`] is the opposite:
//! it lists the payroll records already stored under a label.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculation::{HOURS_SCALE, PeriodRange, hours_and_salary};
use crate::error::EngineResult;
use crate::models::{Employee, EmployeeId, PresenceRecord};
use crate::store::{EmployeeStore, PayrollStore, Snapshot, SnapshotStore};

/// One employee's line in a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    /// The employee the line belongs to.
    pub employee_id: EmployeeId,
    /// Display name, or `Emp#<id>` when the employee is no longer on the roster.
    pub full_name: String,
    /// Trimmed contact address; blank addresses are dropped.
    pub email: Option<String>,
    /// Rounded hours.
    pub hours: Decimal,
    /// Rounded salary.
    pub salary: Decimal,
}

/// A summary of worked hours and salary over an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Period label.
    pub period: String,
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
    /// Number of items.
    pub employee_count: usize,
    /// Sum of item hours.
    pub total_hours: Decimal,
    /// Sum of item salaries.
    pub total_salary: Decimal,
    /// Items by salary descending.
    pub items: Vec<ReportItem>,
}

/// The payroll records stored under one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSummary {
    /// Period label.
    pub period: String,
    /// Number of items.
    pub employee_count: usize,
    /// Sum of stored hours.
    pub total_hours: Decimal,
    /// Sum of stored salaries.
    pub total_salary: Decimal,
    /// Items by employee id.
    pub items: Vec<ReportItem>,
}

fn totals(items: &[ReportItem]) -> (Decimal, Decimal) {
    let mut hours: Decimal = items.iter().map(|i| i.hours).sum();
    hours.rescale(HOURS_SCALE);
    let salary = items.iter().map(|i| i.salary).sum();
    (hours, salary)
}

fn placeholder_name(employee_id: EmployeeId) -> String {
    format!("Emp#{}", employee_id)
}

/// Builds a summary from a snapshot.
///
/// Only employees with at least one closed record checked in inside `range`
/// appear. Items are grouped in order of first appearance in the snapshot
/// (check-in order), then stably sorted by salary descending, so equal
/// salaries keep that order. A record whose employee is missing from the
/// roster is summarized at a zero rate.
pub fn summarize(range: &PeriodRange, snapshot: &Snapshot) -> ReportSummary {
    let roster: HashMap<EmployeeId, &Employee> =
        snapshot.employees.iter().map(|e| (e.id, e)).collect();

    let mut order: Vec<EmployeeId> = Vec::new();
    let mut grouped: HashMap<EmployeeId, Vec<&PresenceRecord>> = HashMap::new();
    for record in snapshot
        .records
        .iter()
        .filter(|r| !r.is_open() && range.contains(r.check_in))
    {
        let group = grouped.entry(record.employee_id).or_insert_with(|| {
            order.push(record.employee_id);
            Vec::new()
        });
        group.push(record);
    }

    let mut items: Vec<ReportItem> = order
        .into_iter()
        .map(|employee_id| {
            let records = grouped.remove(&employee_id).unwrap_or_default();
            let employee = roster.get(&employee_id).copied();
            let rate = employee.map_or(Decimal::ZERO, |e| e.hourly_rate);
            let (hours, salary) = hours_and_salary(records, rate);
            ReportItem {
                employee_id,
                full_name: employee
                    .map_or_else(|| placeholder_name(employee_id), |e| e.full_name.clone()),
                email: employee.and_then(|e| e.contact_address().map(str::to_string)),
                hours,
                salary,
            }
        })
        .collect();

    // sort_by is stable
    items.sort_by(|a, b| b.salary.cmp(&a.salary));

    let (total_hours, total_salary) = totals(&items);
    ReportSummary {
        period: range.label.clone(),
        start: range.start,
        end: range.end,
        employee_count: items.len(),
        total_hours,
        total_salary,
        items,
    }
}

/// Reads a snapshot of `range` and summarizes it.
pub async fn build_summary<S>(store: &S, range: &PeriodRange) -> EngineResult<ReportSummary>
where
    S: SnapshotStore + ?Sized,
{
    let snapshot = store.snapshot(range.start, range.end).await?;
    let summary = summarize(range, &snapshot);
    debug!(
        period = %summary.period,
        employees = summary.employee_count,
        "Summary built"
    );
    Ok(summary)
}

/// Lists the payroll records stored under `period` without recomputing them.
///
/// An unknown label yields an empty summary.
pub async fn stored_summary<S>(store: &S, period: &str) -> EngineResult<StoredSummary>
where
    S: EmployeeStore + PayrollStore + ?Sized,
{
    let payrolls = store.payrolls_for_period(period).await?;
    let mut items = Vec::with_capacity(payrolls.len());
    for payroll in payrolls {
        let employee = store.get_employee(payroll.employee_id).await?;
        items.push(ReportItem {
            employee_id: payroll.employee_id,
            full_name: employee
                .as_ref()
                .map_or_else(|| placeholder_name(payroll.employee_id), |e| e.full_name.clone()),
            email: employee
                .as_ref()
                .and_then(|e| e.contact_address().map(str::to_string)),
            hours: payroll.total_hours,
            salary: payroll.total_salary,
        });
    }

    let (total_hours, total_salary) = totals(&items);
    Ok(StoredSummary {
        period: period.to_string(),
        employee_count: items.len(),
        total_hours,
        total_salary,
        items,
    })
}
