//! Employee model and related types.
//!
//! This module defines the [`Employee`] roster entry and the [`NewEmployee`]
//! payload used to register one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Identifier of an employee in the store.
pub type EmployeeId = u64;

/// Largest accepted hourly rate.
///
/// Keeps `hours * rate` and the period totals well inside `Decimal` range.
pub const MAX_HOURLY_RATE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Trims an address and drops it when nothing is left.
pub fn contact_address(email: Option<&str>) -> Option<&str> {
    email.map(str::trim).filter(|address| !address.is_empty())
}

fn invalid(field: &str, message: &str) -> EngineError {
    EngineError::InvalidEmployee {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn validate_fields(full_name: &str, hourly_rate: Decimal, tag_id: Option<&str>) -> EngineResult<()> {
    if full_name.trim().is_empty() {
        return Err(invalid("full_name", "must not be empty"));
    }
    if hourly_rate < Decimal::ZERO {
        return Err(invalid("hourly_rate", "cannot be negative"));
    }
    if hourly_rate > MAX_HOURLY_RATE {
        return Err(invalid(
            "hourly_rate",
            &format!("cannot exceed {}", MAX_HOURLY_RATE),
        ));
    }
    if tag_id.is_some_and(|tag| tag.trim().is_empty()) {
        return Err(invalid("tag_id", "must not be blank when provided"));
    }
    Ok(())
}

/// Represents an employee on the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: EmployeeId,
    /// Display name.
    pub full_name: String,
    /// Contact address used for period notifications.
    #[serde(default)]
    pub email: Option<String>,
    /// Physical tag registered to this employee, unique across the roster.
    #[serde(default)]
    pub tag_id: Option<String>,
    /// Hourly pay rate, never negative.
    pub hourly_rate: Decimal,
    /// Whether the employee is banned from logging in.
    #[serde(default)]
    pub banned: bool,
}

impl Employee {
    /// Returns the notification address if one is set and not blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::Employee;
    /// use rust_decimal::Decimal;
    ///
    /// let employee = Employee {
    ///     id: 1,
    ///     full_name: "Linh Tran".to_string(),
    ///     email: Some("   ".to_string()),
    ///     tag_id: None,
    ///     hourly_rate: Decimal::new(25000, 0),
    ///     banned: false,
    /// };
    /// assert_eq!(employee.contact_address(), None);
    /// ```
    pub fn contact_address(&self) -> Option<&str> {
        contact_address(self.email.as_deref())
    }

    /// Checks a roster entry loaded from outside the store.
    ///
    /// Applies the same name, rate and tag rules as [`NewEmployee::validate`];
    /// the email stays optional.
    pub fn validate(&self) -> EngineResult<()> {
        validate_fields(&self.full_name, self.hourly_rate, self.tag_id.as_deref())
    }
}

/// Payload for registering a new employee; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    /// Display name.
    pub full_name: String,
    /// Contact address.
    pub email: String,
    /// Optional physical tag.
    #[serde(default)]
    pub tag_id: Option<String>,
    /// Hourly pay rate.
    pub hourly_rate: Decimal,
}

impl NewEmployee {
    /// Checks the required fields and the rate bounds.
    pub fn validate(&self) -> EngineResult<()> {
        if self.email.trim().is_empty() {
            return Err(invalid("email", "must not be empty"));
        }
        validate_fields(&self.full_name, self.hourly_rate, self.tag_id.as_deref())
    }

    /// Builds the stored employee once an id has been assigned.
    pub fn into_employee(self, id: EmployeeId) -> Employee {
        Employee {
            id,
            full_name: self.full_name.trim().to_string(),
            email: Some(self.email.trim().to_string()),
            tag_id: self.tag_id.map(|tag| tag.trim().to_string()),
            hourly_rate: self.hourly_rate,
            banned: false,
        }
    }
}
