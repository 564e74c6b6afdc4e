//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the server
//! settings and roster seed from YAML files.

use std::fs;
use std::path::Path;

use crate::attendance::TapCalendar;
use crate::error::{EngineError, EngineResult};
use crate::models::Employee;

use super::types::{Roster, Settings};

/// Loads and provides access to the server configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── settings.yaml   # Server, attendance and report settings
/// └── employees.yaml  # Optional roster seed
/// ```
///
/// # Example
///
/// ```no_run
/// use attendance_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default")?;
/// println!("Listening on {}", loader.settings().server.bind_addr);
/// # Ok::<(), attendance_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: Settings,
    roster: Roster,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/default")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `settings.yaml` is missing
    /// - Any present file contains invalid YAML
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<Settings>(&path.join("settings.yaml"))?;

        let roster_path = path.join("employees.yaml");
        let roster = if roster_path.exists() {
            Self::load_yaml::<Roster>(&roster_path)?
        } else {
            Roster::default()
        };

        // Validate eagerly so a bad offset fails at startup
        TapCalendar::from_offset_minutes(settings.attendance.utc_offset_minutes)?;

        Ok(Self { settings, roster })
    }

    /// Builds a loader from already-parsed values.
    pub fn from_parts(settings: Settings, employees: Vec<Employee>) -> Self {
        Self {
            settings,
            roster: Roster { employees },
        }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the parsed settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the roster seed.
    pub fn employees(&self) -> &[Employee] {
        &self.roster.employees
    }

    /// Returns the calendar for the tap same-day check.
    pub fn tap_calendar(&self) -> EngineResult<TapCalendar> {
        TapCalendar::from_offset_minutes(self.settings.attendance.utc_offset_minutes)
    }
}
