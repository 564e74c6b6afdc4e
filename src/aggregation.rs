//! Period aggregation.
//!
//! An aggregation run reads one snapshot of the roster and the closed presence
//! records of an interval, computes hours and salary for every employee, and
//! upserts one payroll record per (employee, label) in a single store
//! transaction. Runs recompute from scratch: re-running with the same inputs
//! stores the same values, and re-running after presence data changed replaces
//! the old totals instead of adding to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calculation::{PeriodRange, compute_payroll_lines};
use crate::error::EngineResult;
use crate::models::{PayrollRecord, PayrollUpsert};
use crate::store::{PayrollStore, SnapshotStore};

/// The outcome of one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRun {
    /// The label the records were stored under.
    pub period: String,
    /// Inclusive start of the aggregated interval.
    pub start: DateTime<Utc>,
    /// Exclusive end of the aggregated interval.
    pub end: DateTime<Utc>,
    /// Number of employees processed.
    pub employees: usize,
    /// The stored records, in roster order.
    pub items: Vec<PayrollRecord>,
}

/// Aggregates `range` for the whole roster and upserts the payroll records.
///
/// Any store failure aborts the run; retrying the whole run is safe.
///
/// # Example
///
/// ```
/// use attendance_engine::aggregation::aggregate_period;
/// use attendance_engine::calculation::PeriodRange;
/// use attendance_engine::store::MemoryStore;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let store = MemoryStore::new();
/// let range = PeriodRange::month(2025, 10).unwrap();
///
/// let run = runtime.block_on(aggregate_period(&store, &range)).unwrap();
/// assert_eq!(run.period, "2025-10");
/// assert!(run.items.is_empty());
/// ```
pub async fn aggregate_period<S>(store: &S, range: &PeriodRange) -> EngineResult<AggregationRun>
where
    S: SnapshotStore + PayrollStore + ?Sized,
{
    let snapshot = store.snapshot(range.start, range.end).await?;
    let lines = compute_payroll_lines(range, &snapshot.employees, &snapshot.records);

    let upserts: Vec<PayrollUpsert> = lines
        .into_iter()
        .map(|line| PayrollUpsert {
            employee_id: line.employee_id,
            period: range.label.clone(),
            total_hours: line.hours,
            total_salary: line.salary,
        })
        .collect();

    let items = store.upsert_payrolls(&upserts).await?;

    info!(
        period = %range.label,
        employees = items.len(),
        records = snapshot.records.len(),
        "Payroll aggregated"
    );

    Ok(AggregationRun {
        period: range.label.clone(),
        start: range.start,
        end: range.end,
        employees: items.len(),
        items,
    })
}
