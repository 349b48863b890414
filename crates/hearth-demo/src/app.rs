#![forbid(unsafe_code)]

//! Demo application: one store, a stand-in render layer, and a line-command
//! loop.
//!
//! The [`RenderLayer`] plays the part of the dashboard's view code: it never
//! polls the store, it only reacts to the events it subscribed to.

use std::cell::Cell;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use chrono::NaiveDate;
use hearth_core::calendar::{month_bounds, week_start};
use hearth_core::config::{parse_bool, parse_date};
use hearth_runtime::{CalendarStep, ObservableStore, Subscription, TabId};
use tracing::{debug, info, warn};

/// A parsed line command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tab(TabId),
    Admin(bool),
    Loading(bool),
    SetDate(NaiveDate),
    StepDate(CalendarStep),
    State,
    Help,
    Quit,
}

/// Errors from [`Command::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    InvalidArgument {
        command: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::Unknown(cmd) => write!(f, "unknown command '{cmd}' (try 'help')"),
            Self::MissingArgument(cmd) => write!(f, "'{cmd}' needs an argument"),
            Self::InvalidArgument {
                command,
                value,
                expected,
            } => write!(f, "'{command}': invalid value '{value}', expected {expected}"),
        }
    }
}

impl std::error::Error for CommandError {}

impl Command {
    /// Parse one input line. Arguments beyond the ones a command takes are
    /// rejected rather than ignored.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Err(CommandError::Empty);
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "tab" => {
                let value = parts.next().ok_or(CommandError::MissingArgument("tab"))?;
                let tab = TabId::parse(value).map_err(|_| CommandError::InvalidArgument {
                    command: "tab",
                    value: value.to_string(),
                    expected: "a tab id",
                })?;
                expect_end("tab", parts)?;
                Command::Tab(tab)
            }
            "admin" => {
                let enabled = parse_switch("admin", parts.next())?;
                expect_end("admin", parts)?;
                Command::Admin(enabled)
            }
            "loading" => {
                let loading = parse_switch("loading", parts.next())?;
                expect_end("loading", parts)?;
                Command::Loading(loading)
            }
            "date" => {
                let value = parts.next().ok_or(CommandError::MissingArgument("date"))?;
                let command = if let Some(step) = CalendarStep::parse(value) {
                    Command::StepDate(step)
                } else if let Some(date) = parse_date(value) {
                    Command::SetDate(date)
                } else {
                    return Err(CommandError::InvalidArgument {
                        command: "date",
                        value: value.to_string(),
                        expected: "YYYY-MM-DD or a step (next, prev-month, today, ...)",
                    });
                };
                expect_end("date", parts)?;
                command
            }
            "state" => {
                expect_end("state", parts)?;
                Command::State
            }
            "help" | "?" => {
                expect_end("help", parts)?;
                Command::Help
            }
            "quit" | "exit" | "q" => {
                expect_end("quit", parts)?;
                Command::Quit
            }
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn parse_switch(command: &'static str, arg: Option<&str>) -> Result<bool, CommandError> {
    let value = arg.ok_or(CommandError::MissingArgument(command))?;
    parse_bool(value).ok_or_else(|| CommandError::InvalidArgument {
        command,
        value: value.to_string(),
        expected: "on|off",
    })
}

fn expect_end<'a>(
    command: &'static str,
    rest: impl Iterator<Item = &'a str>,
) -> Result<(), CommandError> {
    let extra: Vec<&str> = rest.collect();
    if extra.is_empty() {
        Ok(())
    } else {
        Err(CommandError::InvalidArgument {
            command,
            value: extra.join(" "),
            expected: "no further arguments",
        })
    }
}

const COMMAND_HELP: &str = "commands: tab <id> | admin on|off | loading on|off | \
date <YYYY-MM-DD|next|prev|next-week|prev-week|next-month|prev-month|today> | state | quit";

/// Stand-in for the dashboard's view layer.
///
/// Counts one redraw per `StateChanged` and logs the transitions a real view
/// would react to. Dropping it unsubscribes everything.
pub struct RenderLayer {
    redraws: Rc<Cell<u64>>,
    _subscriptions: Vec<Subscription>,
}

impl RenderLayer {
    pub fn attach(store: &ObservableStore) -> Self {
        let redraws = Rc::new(Cell::new(0u64));
        let mut subscriptions = Vec::new();

        let counter = Rc::clone(&redraws);
        subscriptions.push(
            store
                .on_state_changed(move |new, _old| {
                    counter.set(counter.get() + 1);
                    debug!(tab = %new.active_tab, redraw = counter.get(), "redraw");
                })
                .into_guard(),
        );
        subscriptions.push(
            store
                .on_active_tab_changed(|new, old| {
                    info!(from = %old, to = %new, "tab switched");
                })
                .into_guard(),
        );
        subscriptions.push(
            store
                .on_admin_mode_changed(|enabled, _| {
                    if enabled {
                        warn!("admin mode enabled: privileged controls visible");
                    } else {
                        info!("admin mode disabled");
                    }
                })
                .into_guard(),
        );
        subscriptions.push(
            store
                .on_current_date_changed(|new, old| {
                    let (month_first, month_last) = month_bounds(new);
                    if month_bounds(old).0 != month_first {
                        debug!(%month_first, %month_last, "month view reloaded");
                    }
                    debug!(date = %new, week_of = %week_start(new), "calendar moved");
                })
                .into_guard(),
        );

        Self {
            redraws,
            _subscriptions: subscriptions,
        }
    }

    #[must_use]
    pub fn redraws(&self) -> u64 {
        self.redraws.get()
    }
}

/// Whether the command loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The composition root's view of the running demo.
pub struct App {
    store: ObservableStore,
    render: RenderLayer,
    json: bool,
}

impl App {
    pub fn new(store: ObservableStore, json: bool) -> Self {
        let render = RenderLayer::attach(&store);
        Self {
            store,
            render,
            json,
        }
    }

    #[must_use]
    pub fn store(&self) -> &ObservableStore {
        &self.store
    }

    #[must_use]
    pub fn render(&self) -> &RenderLayer {
        &self.render
    }

    pub fn execute(&self, command: Command, out: &mut impl Write) -> io::Result<Flow> {
        match command {
            Command::Tab(tab) => self.store.set_active_tab(tab),
            Command::Admin(enabled) => self.store.set_admin_mode(enabled),
            Command::Loading(loading) => self.store.set_loading(loading),
            Command::SetDate(date) => self.store.set_current_date(date),
            Command::StepDate(step) => {
                let date = self.store.step_date(step);
                writeln!(out, "date: {date}")?;
            }
            Command::State => self.print_state(out)?,
            Command::Help => writeln!(out, "{COMMAND_HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn print_state(&self, out: &mut impl Write) -> io::Result<()> {
        let state = self.store.get_state();
        if self.json {
            let json = serde_json::to_string(&state).map_err(io::Error::other)?;
            writeln!(out, "{json}")
        } else {
            writeln!(
                out,
                "tab={} admin={} loading={} date={} version={} redraws={}",
                state.active_tab,
                state.is_admin_mode,
                state.is_loading,
                state.current_date,
                self.store.version(),
                self.render.redraws(),
            )
        }
    }

    /// Read commands line by line until `quit` or end of input. Bad lines are
    /// reported on `out` and skipped.
    pub fn run(&self, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Ok(command) => {
                    if self.execute(command, out)? == Flow::Quit {
                        break;
                    }
                }
                Err(err) => writeln!(out, "error: {err}")?,
            }
        }
        let failures = self.store.listener_failures();
        if failures > 0 {
            warn!(failures, "listener faults during session");
        }
        Ok(())
    }
}
