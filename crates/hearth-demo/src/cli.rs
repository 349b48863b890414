#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually (no external dependencies) to keep the binary lean.
//! Supports environment variable overrides via `HEARTH_DEMO_*` prefix.
//! Command-line flags win over environment variables, which win over the
//! `HEARTH_*` store configuration.

use std::env;
use std::process;

use chrono::NaiveDate;
use hearth_core::config::{parse_bool, parse_date};
use hearth_core::{StoreConfig, TabId};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
Hearth Demo: drive the household dashboard state store from stdin

USAGE:
    hearth-demo [OPTIONS]

OPTIONS:
    --tab=ID             Start on tab ID (default: home)
    --admin              Start in admin mode
    --date=YYYY-MM-DD    Start the calendar on this date (default: today)
    --json               Print state snapshots as JSON
    --help, -h           Show this help message
    --version, -V        Show version

COMMANDS (one per line on stdin):
    tab <id>             Switch the active tab
    admin on|off         Toggle admin mode
    loading on|off       Toggle the loading flag
    date <YYYY-MM-DD>    Jump the calendar to a date
    date <step>          next, prev, next-week, prev-week, next-month, prev-month, today
    state                Print the current state
    help                 List commands
    quit                 Exit

ENVIRONMENT VARIABLES:
    HEARTH_DEMO_TAB            Override --tab
    HEARTH_DEMO_ADMIN          Override --admin (1/true to enable)
    HEARTH_DEMO_DATE           Override --date
    HEARTH_DEMO_JSON           Override --json (1/true to enable)
    HEARTH_HOME_TAB            Store default tab
    HEARTH_START_DATE          Store default date
    HEARTH_ADMIN_MODE          Store default admin mode
    HEARTH_ERROR_LOG_CAPACITY  Listener errors retained for inspection
    HEARTH_LOG                 Log filter (falls back to RUST_LOG, then info)
    HEARTH_LOG_FORMAT          'json' for JSON log lines";

/// Parsed command-line options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Opts {
    /// Starting tab; `None` keeps the store default.
    pub tab: Option<TabId>,
    /// Admin mode override; `None` keeps the store default.
    pub admin: Option<bool>,
    /// Starting calendar date; `None` keeps the store default.
    pub date: Option<NaiveDate>,
    /// Print snapshots as JSON; `None` means plain text.
    pub json: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
}

impl Opts {
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("hearth-demo {VERSION}");
                process::exit(0);
            }
            Err(ParseError::InvalidValue { flag, value }) => {
                eprintln!("Invalid {flag} value: {value}");
                process::exit(1);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Apply environment variable defaults first
        if let Some(val) = get_env("HEARTH_DEMO_TAB")
            && let Ok(tab) = TabId::parse(&val)
        {
            opts.tab = Some(tab);
        }
        if let Some(val) = get_env("HEARTH_DEMO_ADMIN")
            && let Some(enabled) = parse_bool(&val)
        {
            opts.admin = Some(enabled);
        }
        if let Some(val) = get_env("HEARTH_DEMO_DATE")
            && let Some(date) = parse_date(&val)
        {
            opts.date = Some(date);
        }
        if let Some(val) = get_env("HEARTH_DEMO_JSON")
            && let Some(enabled) = parse_bool(&val)
        {
            opts.json = Some(enabled);
        }

        // Parse command-line args (override env vars)
        for arg in args {
            match arg.as_ref() {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                "--admin" => opts.admin = Some(true),
                "--json" => opts.json = Some(true),
                other => {
                    if let Some(val) = other.strip_prefix("--tab=") {
                        match TabId::parse(val) {
                            Ok(tab) => opts.tab = Some(tab),
                            Err(_) => {
                                return Err(ParseError::InvalidValue {
                                    flag: "--tab",
                                    value: val.to_string(),
                                });
                            }
                        }
                    } else if let Some(val) = other.strip_prefix("--date=") {
                        match parse_date(val) {
                            Some(date) => opts.date = Some(date),
                            None => {
                                return Err(ParseError::InvalidValue {
                                    flag: "--date",
                                    value: val.to_string(),
                                });
                            }
                        }
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        Ok(opts)
    }

    /// Whether state snapshots should be printed as JSON.
    #[must_use]
    pub fn json_output(&self) -> bool {
        self.json.unwrap_or(false)
    }

    /// Layer these options over a store configuration.
    #[must_use]
    pub fn apply(&self, mut config: StoreConfig) -> StoreConfig {
        if let Some(tab) = &self.tab {
            config.home_tab = tab.clone();
        }
        if let Some(admin) = self.admin {
            config.admin_mode = admin;
        }
        if let Some(date) = self.date {
            config.start_date = Some(date);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_with_env<I, S>(
        args: I,
        env_pairs: &[(&'static str, &'static str)],
    ) -> Result<Opts, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = std::collections::HashMap::new();
        for (key, value) in env_pairs {
            map.insert(*key, *value);
        }
        Opts::parse_from_env_and_args(args, |key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn no_args_gives_defaults() {
        let opts = parse_with_env(Vec::<String>::new(), &[]).unwrap();
        assert_eq!(opts, Opts::default());
    }

    #[test]
    fn flags_are_parsed() {
        let opts = parse_with_env(["--tab=kid-1", "--admin", "--date=2024-02-29", "--json"], &[])
            .unwrap();
        assert_eq!(opts.tab, Some(TabId::from("kid-1")));
        assert_eq!(opts.admin, Some(true));
        assert_eq!(opts.date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert!(opts.json_output());
    }

    #[test]
    fn args_override_env() {
        let opts = parse_with_env(
            ["--tab=kid-2"],
            &[("HEARTH_DEMO_TAB", "kid-1"), ("HEARTH_DEMO_JSON", "1")],
        )
        .unwrap();
        assert_eq!(opts.tab, Some(TabId::from("kid-2")));
        assert_eq!(opts.json, Some(true));
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let opts = parse_with_env(
            Vec::<String>::new(),
            &[("HEARTH_DEMO_DATE", "tomorrow"), ("HEARTH_DEMO_TAB", " ")],
        )
        .unwrap();
        assert_eq!(opts, Opts::default());
    }

    #[test]
    fn bad_values_and_unknown_args_error() {
        assert_eq!(
            parse_with_env(["--date=2023-02-30"], &[]),
            Err(ParseError::InvalidValue {
                flag: "--date",
                value: "2023-02-30".into()
            })
        );
        assert_eq!(
            parse_with_env(["--tab="], &[]),
            Err(ParseError::InvalidValue {
                flag: "--tab",
                value: String::new()
            })
        );
        assert_eq!(
            parse_with_env(["--bogus"], &[]),
            Err(ParseError::UnknownArg("--bogus".into()))
        );
        assert_eq!(parse_with_env(["-h"], &[]), Err(ParseError::Help));
        assert_eq!(parse_with_env(["--version"], &[]), Err(ParseError::Version));
    }

    #[test]
    fn apply_layers_over_config() {
        let opts = Opts {
            tab: Some(TabId::from("kid-1")),
            admin: Some(true),
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
            json: None,
        };
        let config = opts.apply(StoreConfig::default().with_error_log_capacity(3));
        assert_eq!(config.home_tab.as_str(), "kid-1");
        assert!(config.admin_mode);
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(config.error_log_capacity, 3);
    }

    #[test]
    fn demo_admin_off_overrides_store_admin_mode() {
        let opts = parse_with_env(Vec::<String>::new(), &[("HEARTH_DEMO_ADMIN", "0")]).unwrap();
        assert_eq!(opts.admin, Some(false));
        let config = opts.apply(StoreConfig::default().with_admin_mode(true));
        assert!(!config.admin_mode);
    }

    #[test]
    fn unset_admin_keeps_store_admin_mode() {
        let opts = parse_with_env(Vec::<String>::new(), &[]).unwrap();
        assert_eq!(opts.admin, None);
        let config = opts.apply(StoreConfig::default().with_admin_mode(true));
        assert!(config.admin_mode);
    }

    #[test]
    fn admin_flag_wins_over_demo_env() {
        let opts = parse_with_env(["--admin"], &[("HEARTH_DEMO_ADMIN", "false")]).unwrap();
        assert_eq!(opts.admin, Some(true));
        assert!(opts.apply(StoreConfig::default()).admin_mode);
    }
}
