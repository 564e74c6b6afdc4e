//! Calculation logic for the attendance engine.
//!
//! This module contains the pure functions behind payroll: period range and
//! label computation for day/week/month/quarter/year periods, and the hours
//! and salary arithmetic with its fixed rounding rules.

mod payroll;
mod period;

pub use payroll::{
    HOURS_SCALE, PayrollLine, SALARY_SCALE, compute_payroll_lines, hours_and_salary,
    round_hours, round_salary,
};
pub use period::{PeriodKind, PeriodRange, period_range, week_number};
