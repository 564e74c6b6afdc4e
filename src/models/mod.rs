//! Core data models for the attendance engine.
//!
//! This module contains the roster, presence and payroll types shared by
//! the tap, aggregation and reporting paths.

mod employee;
mod payroll;
mod presence;

pub use employee::{Employee, EmployeeId, MAX_HOURLY_RATE, NewEmployee, contact_address};
pub use payroll::{PayrollRecord, PayrollUpsert};
pub use presence::{PresenceRecord, RecordId};
