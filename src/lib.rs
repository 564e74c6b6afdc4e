//! Attendance capture and period payroll engine.
//!
//! This crate records employee presence from tag taps and turns the resulting
//! check-in/check-out pairs into idempotent payroll records for calendar periods
//! (day, week, month, quarter, year) or custom ranges, with summary, CSV and
//! notification projections on top.

#![warn(missing_docs)]

pub mod aggregation;
pub mod api;
pub mod attendance;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod store;
