#![forbid(unsafe_code)]

//! Core: state record, typed patches, calendar arithmetic, and configuration.
//!
//! # Role in Hearth
//! `hearth-core` is the data layer of the dashboard state store. It owns the
//! [`ApplicationState`] record, the ordered [`StatePatch`] used to update it,
//! and the ambient pieces every binary needs (environment configuration and
//! logging setup).
//!
//! # Primary responsibilities
//! - **ApplicationState**: closed, typed record of cross-cutting UI flags.
//! - **StatePatch**: ordered partial update, one typed entry per field.
//! - **Calendar**: simple local-date stepping for calendar views.
//! - **Config**: `HEARTH_*` environment parsing with diagnostics.
//! - **Logging**: `tracing-subscriber` initialization (`logging` feature).
//!
//! # How it fits in the system
//! The runtime (`hearth-runtime`) wraps an `ApplicationState` in an
//! observable store and emits typed change events. This crate has no event
//! machinery of its own, so it can be used by render or persistence layers
//! without pulling in the store.

pub mod calendar;
pub mod config;
#[cfg(feature = "logging")]
pub mod logging;
pub mod state;

pub use calendar::CalendarStep;
pub use config::{ConfigError, ConfigParse, StoreConfig};
#[cfg(feature = "logging")]
pub use logging::LogConfig;
pub use state::{
    ApplicationState, Field, FieldChange, FieldPatch, StatePatch, TabId, TabIdError,
};
