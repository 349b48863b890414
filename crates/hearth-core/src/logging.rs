#![forbid(unsafe_code)]

//! Structured logging setup.
//!
//! Every crate logs through `tracing`. Binaries enable the `logging` feature
//! and call [`init`] once at startup; libraries never install a subscriber
//! themselves.
//!
//! The filter comes from `HEARTH_LOG`, falling back to `RUST_LOG`, then to
//! `info`. JSON output requires the `tracing-json` feature; without it a
//! JSON request falls back to the plain formatter with a warning.

use std::env;

use tracing_subscriber::EnvFilter;

pub const ENV_LOG: &str = "HEARTH_LOG";
pub const ENV_LOG_FORMAT: &str = "HEARTH_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

/// Logging options for a binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `hearth_runtime=trace,info`.
    pub filter: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Read `HEARTH_LOG` / `RUST_LOG` and `HEARTH_LOG_FORMAT=json`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|f| !f.trim().is_empty());
        let filter = non_empty(get(ENV_LOG))
            .or_else(|| non_empty(get("RUST_LOG")))
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let json = get(ENV_LOG_FORMAT)
            .map(|v| v.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        Self { filter, json }
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
///
/// Output goes to stderr so stdout stays free for command output.
pub fn init(config: &LogConfig) -> bool {
    let filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if config.json {
        return init_json(filter);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(feature = "tracing-json")]
fn init_json(filter: EnvFilter) -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(not(feature = "tracing-json"))]
fn init_json(filter: EnvFilter) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::warn!("JSON log output requested but the tracing-json feature is disabled");
    }
    installed
}
