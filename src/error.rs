//! Error types for the attendance engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the tap, aggregation and reporting paths can produce.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The main error type for the attendance engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently from the store up to the HTTP layer.
///
/// # Example
///
/// ```
/// use attendance_engine::error::EngineError;
///
/// let error = EngineError::UnknownTag {
///     tag: "04:A2:19:7F".to_string(),
/// };
/// assert_eq!(error.to_string(), "Unknown tag: 04:A2:19:7F");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// A tap was made with a tag that is not registered to any employee.
    #[error("Unknown tag: {tag}")]
    UnknownTag {
        /// The tag identifier that was presented.
        tag: String,
    },

    /// A custom range whose end is not after its start.
    #[error("Invalid range: end {end} must be after start {start}")]
    InvalidRange {
        /// The requested start of the range.
        start: DateTime<Utc>,
        /// The requested end of the range.
        end: DateTime<Utc>,
    },

    /// A calendar date could not be built (e.g. month 13).
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// A description of the invalid date.
        message: String,
    },

    /// A lookup of an employee, presence or payroll record found nothing.
    #[error("{entity} not found: {key}")]
    RecordNotFound {
        /// The kind of record that was looked up (e.g. "Employee").
        entity: String,
        /// The key used for the lookup.
        key: String,
    },

    /// A single employee notification could not be delivered.
    #[error("Notification to '{recipient}' failed: {message}")]
    NotificationFailure {
        /// The address (or employee) the message was meant for.
        recipient: String,
        /// A description of the failure.
        message: String,
    },

    /// A tag is already registered to another employee.
    #[error("Tag '{tag}' is already assigned to {holder}")]
    DuplicateTag {
        /// The tag identifier in conflict.
        tag: String,
        /// Display name of the employee holding the tag.
        holder: String,
    },

    /// An employee record was invalid or contained inconsistent data.
    #[error("Invalid employee field '{field}': {message}")]
    InvalidEmployee {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A presence record mutation would break the check-out >= check-in invariant.
    #[error("Invalid presence record {record_id}: {message}")]
    InvalidPresence {
        /// The record being mutated.
        record_id: u64,
        /// A description of the violation.
        message: String,
    },

    /// A stored-period operation found no payroll records for the label.
    #[error("No payroll records for period {period}")]
    NoPayrollForPeriod {
        /// The period label that was requested.
        period: String,
    },

    /// The backing store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::RecordNotFound`].
    pub fn not_found(entity: &str, key: impl ToString) -> Self {
        EngineError::RecordNotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
