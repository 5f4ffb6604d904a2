// src/lib.rs

pub mod address;
pub mod cli;
pub mod errors;
pub mod logging;
pub mod monitor;
pub mod store;

use std::sync::mpsc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::cli::CliArgs;

pub use crate::address::{RootKey, WatchTarget};
pub use crate::errors::MonitorError;
pub use crate::monitor::{ChangeCategory, ChangeEvent, ChangeFilter, KeyMonitor, MonitorState};
pub use crate::store::{Hive, KeyHandle};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - address resolution from the CLI key spec
/// - the key change monitor and its callbacks
/// - an initial read of the named value (so consumers start from the
///   present state, not the next change)
/// - Ctrl-C handling
pub fn run(args: CliArgs) -> Result<()> {
    let hive = Hive::new(&args.hive);
    let monitor = KeyMonitor::from_path(hive.clone(), &args.key)?;

    if !args.filter.is_empty() {
        monitor.set_filter(args.filter.iter().copied().collect())?;
    }

    // Read and log the current bytes before watching.
    if let Some(name) = &args.value {
        match hive.open_key(monitor.target()) {
            Ok(key) => log_value(&key, name),
            Err(err) => warn!(error = %err, "initial read skipped"),
        }
    }

    let value_name = args.value.clone();
    monitor.on_changed(move |event| {
        info!(key = %event.key.target(), at = ?event.at, "key changed");
        if let Some(name) = &value_name {
            log_value(event.key, name);
        }
    });
    monitor.on_error(|err| error!(error = %err, "watch failed"));

    monitor.start()?;
    info!(key = %monitor.target(), "watching (Ctrl-C to exit)");

    // Ctrl-C → graceful shutdown.
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .context("failed to install Ctrl-C handler")?;
    let _ = shutdown_rx.recv();

    monitor.dispose();
    info!("stopped");
    Ok(())
}

fn log_value(key: &KeyHandle, name: &str) {
    match key.value(name) {
        Ok(Some(bytes)) => info!(value = %name, bytes = %hex_string(&bytes), "value read"),
        Ok(None) => warn!(value = %name, "value not present"),
        Err(err) => warn!(value = %name, error = %err, "failed to read value"),
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
