//! Application state for the attendance API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::attendance::TapCalendar;
use crate::config::ConfigLoader;
use crate::error::EngineResult;
use crate::report::{NotificationSender, NotificationTemplate, TracingSender};
use crate::store::{MemoryStore, Store};

/// Shared application state.
///
/// Contains resources that are shared across all request handlers: the
/// loaded configuration, the store and the notification sender.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    store: Arc<dyn Store>,
    sender: Arc<dyn NotificationSender>,
    calendar: TapCalendar,
}

impl AppState {
    /// Creates a new application state.
    ///
    /// Fails when the configured UTC offset is out of range.
    pub fn new(
        config: ConfigLoader,
        store: Arc<dyn Store>,
        sender: Arc<dyn NotificationSender>,
    ) -> EngineResult<Self> {
        let calendar = config.tap_calendar()?;
        Ok(Self {
            config: Arc::new(config),
            store,
            sender,
            calendar,
        })
    }

    /// Creates a state backed by a [`MemoryStore`] seeded with the configured
    /// roster, sending notifications through a [`TracingSender`].
    pub fn in_memory(config: ConfigLoader) -> EngineResult<Self> {
        let store = MemoryStore::with_employees(config.employees().to_vec())?;
        Self::new(config, Arc::new(store), Arc::new(TracingSender))
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the store.
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Returns the notification sender.
    pub fn sender(&self) -> &dyn NotificationSender {
        self.sender.as_ref()
    }

    /// Returns the calendar for the tap same-day check.
    pub fn calendar(&self) -> TapCalendar {
        self.calendar
    }

    /// Returns the notification wording.
    pub fn template(&self) -> &NotificationTemplate {
        &self.config.settings().report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::store::EmployeeStore;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_in_memory_state_seeds_roster() {
        let config = ConfigLoader::load("./config/default").unwrap();
        let seeded = config.employees().len();
        let state = AppState::in_memory(config).unwrap();
        assert_eq!(state.store().list_employees().await.unwrap().len(), seeded);
    }

    #[test]
    fn test_calendar_comes_from_settings() {
        let mut settings = Settings::default();
        settings.attendance.utc_offset_minutes = -300;
        let state = AppState::in_memory(ConfigLoader::from_parts(settings, vec![])).unwrap();
        assert_eq!(state.calendar(), TapCalendar::from_offset_minutes(-300).unwrap());
    }
}
