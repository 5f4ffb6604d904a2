// src/errors.rs

//! Crate-wide error taxonomy.

use std::io;

use thiserror::Error;

use crate::address::WatchTarget;

#[derive(Error, Debug)]
pub enum MonitorError {
    /// A key path could not be resolved: its first segment matched no known
    /// root name or alias, or a segment was a traversal token (`.`/`..`).
    #[error("invalid key address token: {token:?}")]
    InvalidAddress { token: String },

    /// `start`/`stop` called on a monitor that has already been disposed.
    #[error("monitor is already disposed")]
    AlreadyDisposed,

    /// The watch target could not be opened for read + notify access.
    #[error("failed to open key {target}: {source}")]
    OpenFailed {
        target: WatchTarget,
        #[source]
        source: io::Error,
    },

    /// Arming the change notification failed, or the watch backend reported a
    /// runtime error. The watch loop does not survive this.
    #[error("failed to arm change notification: {source}")]
    ArmFailed {
        #[source]
        source: notify::Error,
    },

    /// The OS refused to create the watch-loop thread.
    #[error("failed to spawn watch thread: {source}")]
    SpawnFailed {
        #[source]
        source: io::Error,
    },

    /// Operation is not valid in the monitor's current state, e.g. mutating
    /// the change filter while the watch thread is running.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
