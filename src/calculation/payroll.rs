//! Hours and salary arithmetic.
//!
//! This module holds the pure part of aggregation: given a snapshot of the
//! roster and the completed presence records of an interval, it produces one
//! payroll line per employee. Nothing here touches a store.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{Employee, EmployeeId, PresenceRecord};

use super::period::PeriodRange;

/// Fraction digits kept on hour totals.
pub const HOURS_SCALE: u32 = 2;

/// Fraction digits kept on salary totals.
pub const SALARY_SCALE: u32 = 0;

/// Hours and salary computed for one employee over one interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollLine {
    /// The employee the line belongs to.
    pub employee_id: EmployeeId,
    /// Rounded total hours.
    pub hours: Decimal,
    /// Rounded total salary.
    pub salary: Decimal,
}

/// Rounds an hour total to two fraction digits, half away from zero.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::round_hours;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_hours(Decimal::from_str("2.005").unwrap()).to_string(), "2.01");
/// assert_eq!(round_hours(Decimal::from(8)).to_string(), "8.00");
/// ```
pub fn round_hours(hours: Decimal) -> Decimal {
    let mut rounded = hours.round_dp_with_strategy(HOURS_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(HOURS_SCALE);
    rounded
}

/// Rounds a salary to an integral amount, half away from zero.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::round_salary;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_salary(Decimal::from_str("12345.5").unwrap()).to_string(), "12346");
/// ```
pub fn round_salary(salary: Decimal) -> Decimal {
    let mut rounded =
        salary.round_dp_with_strategy(SALARY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(SALARY_SCALE);
    rounded
}

/// Computes `(hours, salary)` from a set of records and an hourly rate.
///
/// Hours are summed unrounded, then rounded once; salary is the rounded hours
/// times the rate, rounded to an integer.
pub fn hours_and_salary<'a>(
    records: impl IntoIterator<Item = &'a PresenceRecord>,
    hourly_rate: Decimal,
) -> (Decimal, Decimal) {
    let raw: Decimal = records
        .into_iter()
        .filter_map(PresenceRecord::worked_hours)
        .sum();
    let hours = round_hours(raw);
    let salary = round_salary(hours * hourly_rate);
    (hours, salary)
}

/// Computes one payroll line per roster employee for `range`.
///
/// Only records with a check-out and a check-in inside `[start, end)` count.
/// Employees without qualifying records still get a zero line. Lines come
/// back in roster order.
///
/// # Arguments
///
/// * `range` - The interval to aggregate
/// * `employees` - The roster snapshot, rates as of now
/// * `records` - The presence snapshot (may include records outside the range)
pub fn compute_payroll_lines(
    range: &PeriodRange,
    employees: &[Employee],
    records: &[PresenceRecord],
) -> Vec<PayrollLine> {
    let mut by_employee: HashMap<EmployeeId, Vec<&PresenceRecord>> = HashMap::new();
    for record in records
        .iter()
        .filter(|r| !r.is_open() && range.contains(r.check_in))
    {
        by_employee.entry(record.employee_id).or_default().push(record);
    }

    employees
        .iter()
        .map(|employee| {
            let own = by_employee
                .get(&employee.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let (hours, salary) = hours_and_salary(own.iter().copied(), employee.hourly_rate);
            PayrollLine {
                employee_id: employee.id,
                hours,
                salary,
            }
        })
        .collect()
}
