//! Reports built on top of presence and payroll data.
//!
//! This module provides:
//! - JSON summaries re-derived from presence records ([`build_summary`])
//! - summaries of stored payroll records ([`stored_summary`])
//! - the CSV export ([`summary_to_csv`])
//! - per-employee notifications through a [`NotificationSender`]
//! - single-employee payroll lookups

mod csv;
mod detail;
mod notification;
mod summary;

pub use csv::{CSV_CONTENT_TYPE, CSV_HEADER, csv_filename, summary_to_csv};
pub use detail::{
    EmployeePayroll, EmployeePeriodDetail, PresenceDetail, employee_payroll,
    employee_period_detail,
};
pub use notification::{
    NotificationOutcome, NotificationSender, NotificationTemplate, TracingSender, format_amount,
    notify_items, render_notification_html, send_reports, send_stored,
};
pub use summary::{
    ReportItem, ReportSummary, StoredSummary, build_summary, stored_summary, summarize,
};
