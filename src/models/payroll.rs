//! Payroll record model.
//!
//! A [`PayrollRecord`] holds the recomputed hours and salary of one employee
//! for one period label. The pair (employee, period) is unique.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::employee::EmployeeId;

/// A stored payroll figure for (employee, period label).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRecord {
    /// Unique identifier for the record.
    pub id: u64,
    /// The employee this record belongs to.
    pub employee_id: EmployeeId,
    /// The period label, e.g. "2025-10" or "2025-W43".
    pub period: String,
    /// Total hours, two fraction digits.
    pub total_hours: Decimal,
    /// Total salary, integral.
    pub total_salary: Decimal,
}

/// Values written by one aggregation run for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollUpsert {
    /// The employee the figures belong to.
    pub employee_id: EmployeeId,
    /// The period label the figures are keyed under.
    pub period: String,
    /// Total hours, two fraction digits.
    pub total_hours: Decimal,
    /// Total salary, integral.
    pub total_salary: Decimal,
}

impl PayrollRecord {
    /// Overwrites the figures with those of `upsert`.
    ///
    /// Nothing is accumulated: the previous totals are discarded.
    pub fn overwrite(&mut self, upsert: &PayrollUpsert) {
        self.total_hours = upsert.total_hours;
        self.total_salary = upsert.total_salary;
    }
}
