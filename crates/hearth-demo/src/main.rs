#![forbid(unsafe_code)]

//! Hearth demo binary entry point.
//!
//! This is the composition root: it is the only place a store is created.
//! Everything else receives a handle.

use std::io;

use hearth_core::StoreConfig;
use hearth_core::logging::{self, LogConfig};
use hearth_demo::app::App;
use hearth_demo::cli;
use hearth_runtime::ObservableStore;
use tracing::{info, warn};

fn main() {
    let opts = cli::Opts::parse();

    logging::init(&LogConfig::from_env());

    let parsed = StoreConfig::from_env_with_diagnostics();
    for err in &parsed.errors {
        warn!(error = %err, "ignoring invalid configuration value");
    }
    let config = opts.apply(parsed.config);

    let store = ObservableStore::new(&config);
    info!(tab = %store.active_tab(), date = %store.current_date(), "store ready");

    let app = App::new(store, opts.json_output());
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    if let Err(e) = app.run(stdin.lock(), &mut stdout) {
        eprintln!("I/O error: {e}");
        std::process::exit(1);
    }
}
