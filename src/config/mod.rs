//! Configuration loading for the attendance server.
//!
//! This module loads the server, attendance and report settings plus an
//! optional roster seed from a directory of YAML files.
//!
//! # Example
//!
//! ```no_run
//! use attendance_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Seeded employees: {}", config.employees().len());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{AttendanceSettings, Roster, ServerSettings, Settings};
