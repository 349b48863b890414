#![forbid(unsafe_code)]

//! Store configuration from `HEARTH_*` environment variables.
//!
//! # Environment
//!
//! | Variable | Type | Effect |
//! |----------|------|--------|
//! | `HEARTH_HOME_TAB` | non-empty string | Initial `active_tab` |
//! | `HEARTH_START_DATE` | `YYYY-MM-DD` | Pins the initial `current_date` |
//! | `HEARTH_ADMIN_MODE` | bool | Initial `is_admin_mode` |
//! | `HEARTH_ERROR_LOG_CAPACITY` | usize | Listener errors retained for inspection |
//!
//! Invalid values never abort startup: each one is reported as a
//! [`ConfigError`] in [`ConfigParse::errors`] and the default is kept.

use std::env;
use std::fmt;

use chrono::NaiveDate;

use crate::calendar;
use crate::state::{ApplicationState, TabId};

pub const ENV_HOME_TAB: &str = "HEARTH_HOME_TAB";
pub const ENV_START_DATE: &str = "HEARTH_START_DATE";
pub const ENV_ADMIN_MODE: &str = "HEARTH_ADMIN_MODE";
pub const ENV_ERROR_LOG_CAPACITY: &str = "HEARTH_ERROR_LOG_CAPACITY";

/// Default number of listener errors the store retains.
pub const DEFAULT_ERROR_LOG_CAPACITY: usize = 32;

/// Startup configuration for an observable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Tab selected on startup.
    pub home_tab: TabId,
    /// Calendar date on startup; `None` means today.
    pub start_date: Option<NaiveDate>,
    /// Start in admin mode.
    pub admin_mode: bool,
    /// Listener errors kept for inspection (0 = keep none).
    pub error_log_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            home_tab: TabId::home(),
            start_date: None,
            admin_mode: false,
            error_log_capacity: DEFAULT_ERROR_LOG_CAPACITY,
        }
    }
}

/// Parsed configuration plus the diagnostics collected while parsing.
#[derive(Debug, Clone)]
pub struct ConfigParse {
    pub config: StoreConfig,
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl StoreConfig {
    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> StoreConfig {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Parse config from an arbitrary key lookup.
    pub fn from_env_with<F>(mut get: F) -> ConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = StoreConfig::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_HOME_TAB) {
            match TabId::parse(&value) {
                Ok(tab) => config.home_tab = tab,
                Err(err) => errors.push(ConfigError::new("home_tab", value, err.to_string())),
            }
        }

        if let Some(value) = get(ENV_START_DATE) {
            match parse_date(&value) {
                Some(date) => config.start_date = Some(date),
                None => errors.push(ConfigError::new(
                    "start_date",
                    value,
                    "expected date YYYY-MM-DD",
                )),
            }
        }

        if let Some(value) = get(ENV_ADMIN_MODE) {
            match parse_bool(&value) {
                Some(parsed) => config.admin_mode = parsed,
                None => errors.push(ConfigError::new(
                    "admin_mode",
                    value,
                    "expected bool (1/0/true/false)",
                )),
            }
        }

        if let Some(value) = get(ENV_ERROR_LOG_CAPACITY) {
            match parse_usize(&value) {
                Some(parsed) => config.error_log_capacity = parsed,
                None => errors.push(ConfigError::new(
                    "error_log_capacity",
                    value,
                    "expected non-negative integer",
                )),
            }
        }

        ConfigParse { config, errors }
    }

    #[must_use]
    pub fn with_home_tab(mut self, tab: impl Into<TabId>) -> Self {
        self.home_tab = tab.into();
        self
    }

    #[must_use]
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_admin_mode(mut self, enabled: bool) -> Self {
        self.admin_mode = enabled;
        self
    }

    #[must_use]
    pub fn with_error_log_capacity(mut self, capacity: usize) -> Self {
        self.error_log_capacity = capacity;
        self
    }

    /// The state record a store built from this config starts with.
    #[must_use]
    pub fn initial_state(&self) -> ApplicationState {
        let mut state =
            ApplicationState::with_date(self.start_date.unwrap_or_else(calendar::today));
        state.active_tab = self.home_tab.clone();
        state.is_admin_mode = self.admin_mode;
        state
    }
}

/// Parse a `YYYY-MM-DD` date.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Parse the usual boolean spellings (`1/0`, `true/false`, `yes/no`, `on/off`).
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[inline]
fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}
