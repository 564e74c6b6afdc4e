//! Configuration types for the attendance server.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use serde::Deserialize;

use crate::models::Employee;
use crate::report::NotificationTemplate;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: String,
    /// Maximum log level (`trace`, `debug`, `info`, `warn`, `error`).
    pub log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Attendance capture settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttendanceSettings {
    /// Offset east of UTC, in minutes, of the calendar used for the tap
    /// same-day check. Zero means UTC.
    pub utc_offset_minutes: i32,
}

/// The contents of `settings.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Attendance capture settings.
    pub attendance: AttendanceSettings,
    /// Notification wording.
    pub report: NotificationTemplate,
}

/// The contents of `employees.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Roster {
    /// Employees loaded into the store at startup.
    #[serde(default)]
    pub employees: Vec<Employee>,
}
