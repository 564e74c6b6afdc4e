//! Response types for the attendance API.
//!
//! This module defines the error response structures, the mapping from
//! [`EngineError`] to HTTP status codes, and the bodies that are shaped for
//! the wire rather than echoed from the engine.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregation::AggregationRun;
use crate::attendance::{TapAction, TapOutcome};
use crate::error::EngineError;
use crate::models::{EmployeeId, RecordId};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates an invalid query string error response.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new("INVALID_QUERY", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response with the given body.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, code) = match &error {
            EngineError::UnknownTag { .. } => (StatusCode::NOT_FOUND, "UNKNOWN_TAG"),
            EngineError::RecordNotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            EngineError::InvalidRange { .. } => (StatusCode::BAD_REQUEST, "INVALID_RANGE"),
            EngineError::InvalidDate { .. } => (StatusCode::BAD_REQUEST, "INVALID_DATE"),
            EngineError::InvalidEmployee { .. } => (StatusCode::BAD_REQUEST, "INVALID_EMPLOYEE"),
            EngineError::InvalidPresence { .. } => (StatusCode::BAD_REQUEST, "INVALID_PRESENCE"),
            EngineError::NoPayrollForPeriod { .. } => {
                (StatusCode::BAD_REQUEST, "NO_PAYROLL_FOR_PERIOD")
            }
            EngineError::DuplicateTag { .. } => (StatusCode::CONFLICT, "DUPLICATE_TAG"),
            EngineError::NotificationFailure { .. } => {
                (StatusCode::BAD_GATEWAY, "NOTIFICATION_FAILED")
            }
            EngineError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR")
            }
        };

        let error = match error {
            EngineError::NoPayrollForPeriod { period } => ApiError::with_details(
                code,
                message,
                format!("Run the payroll calculation for '{}' first", period),
            ),
            _ => ApiError::new(code, message),
        };

        ApiErrorResponse { status, error }
    }
}

/// Response body of a tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapResponse {
    /// `checkin` or `checkout`.
    pub action: TapAction,
    /// Display name of the employee.
    pub employee_name: String,
    /// The record that was opened or closed.
    pub record_id: RecordId,
    /// Check-in instant of the record.
    pub check_in: DateTime<Utc>,
    /// Check-out instant, set on checkout.
    pub check_out: Option<DateTime<Utc>>,
}

impl From<TapOutcome> for TapResponse {
    fn from(outcome: TapOutcome) -> Self {
        Self {
            action: outcome.action,
            employee_name: outcome.employee_name,
            record_id: outcome.record.id,
            check_in: outcome.record.check_in,
            check_out: outcome.record.check_out,
        }
    }
}

/// One employee's line in a calculation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationLine {
    /// The employee.
    pub employee_id: EmployeeId,
    /// Stored hours.
    pub hours: Decimal,
    /// Stored salary.
    pub salary: Decimal,
}

/// Response body of a payroll calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResponse {
    /// The label the records were stored under.
    pub label: String,
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
    /// One line per roster employee.
    pub per_employee: Vec<CalculationLine>,
}

impl From<AggregationRun> for CalculationResponse {
    fn from(run: AggregationRun) -> Self {
        Self {
            label: run.period,
            start: run.start,
            end: run.end,
            per_employee: run
                .items
                .into_iter()
                .map(|record| CalculationLine {
                    employee_id: record.employee_id,
                    hours: record.total_hours,
                    salary: record.total_salary,
                })
                .collect(),
        }
    }
}
