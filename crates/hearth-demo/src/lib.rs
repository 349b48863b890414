#![forbid(unsafe_code)]

//! Hearth demo library: CLI parsing and the line-command app.
//!
//! Split out of `main.rs` so integration tests can drive [`app::App`] with
//! in-memory input.

pub mod app;
pub mod cli;
