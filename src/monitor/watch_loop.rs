// src/monitor/watch_loop.rs

//! The dedicated watch-loop thread.
//!
//! The loop opens the watch target, arms the store's change notification and
//! then blocks on a two-case wait: either a change fires or termination is
//! requested. Both cases arrive through one channel; the watcher callback
//! forwards change events and backend errors into it, and the terminate
//! signal pushes a wake message after raising its level-triggered flag.
//!
//! Any failure opening or arming is fatal to the loop: it is classified,
//! delivered once on the error surface, and the thread ends. The open key
//! handle and the armed watcher are released on every exit path by drop.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::SystemTime;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace};

use crate::address::WatchTarget;
use crate::errors::MonitorError;
use crate::monitor::events::{ChangeEvent, EventSinks};
use crate::monitor::filter::{classify, ChangeFilter};
use crate::monitor::lifecycle::{PHASE_IDLE, PHASE_WATCHING};
use crate::store::Hive;

/// Message on the watch loop's wake channel.
pub(crate) enum Wake {
    /// The store reported a change on the watched key.
    Changed(Event),
    /// The watch backend failed at runtime; the watch is no longer armed.
    Lost(notify::Error),
    /// Termination was requested.
    Terminate,
}

/// Level-triggered termination signal.
///
/// Stays raised once set; a monitor creates a fresh signal for every start,
/// which is what "reset before each new watch loop" amounts to. Raising also
/// pushes a wake message so a loop blocked in `recv` observes it.
pub(crate) struct TerminateSignal {
    raised: AtomicBool,
    wake_tx: Sender<Wake>,
}

impl TerminateSignal {
    pub(crate) fn new(wake_tx: Sender<Wake>) -> Self {
        Self {
            raised: AtomicBool::new(false),
            wake_tx,
        }
    }

    pub(crate) fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
        // The loop may already have exited; a dead channel is fine.
        let _ = self.wake_tx.send(Wake::Terminate);
    }

    pub(crate) fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

/// Everything the watch-loop thread owns for one start/stop cycle.
pub(crate) struct WatchContext {
    pub hive: Hive,
    pub target: WatchTarget,
    pub filter: ChangeFilter,
    pub sinks: Arc<EventSinks>,
    pub terminate: Arc<TerminateSignal>,
    pub phase: Arc<AtomicU8>,
    pub wake_tx: Sender<Wake>,
    pub wake_rx: Receiver<Wake>,
}

/// Thread entry point. Failures never escape the thread boundary; they are
/// marshaled onto the error surface.
pub(crate) fn run(ctx: WatchContext) {
    if let Err(err) = watch_until_terminated(&ctx) {
        debug!(target = %ctx.target, error = %err, "watch loop ended with error");
        ctx.sinks.emit_error(&err);
    } else {
        debug!(target = %ctx.target, "watch loop ended");
    }
    // A loop that ends on its own flips the monitor back to idle. The CAS
    // keeps a stop or dispose that has already advanced the phase authoritative.
    let _ = ctx
        .phase
        .compare_exchange(PHASE_WATCHING, PHASE_IDLE, Ordering::SeqCst, Ordering::SeqCst);
}

fn watch_until_terminated(ctx: &WatchContext) -> Result<(), MonitorError> {
    // Open for read + notify access; owned by this thread until exit.
    let key = ctx.hive.open_key(&ctx.target)?;

    let mut watcher = RecommendedWatcher::new(
        {
            let wake_tx = ctx.wake_tx.clone();
            move |res: notify::Result<Event>| {
                let wake = match res {
                    Ok(event) => Wake::Changed(event),
                    Err(err) => Wake::Lost(err),
                };
                let _ = wake_tx.send(wake);
            }
        },
        Config::default(),
    )
    .map_err(|source| MonitorError::ArmFailed { source })?;

    watcher
        .watch(key.dir(), RecursiveMode::Recursive)
        .map_err(|source| MonitorError::ArmFailed { source })?;

    debug!(target = %ctx.target, dir = ?key.dir(), "change notification armed");

    loop {
        match ctx.wake_rx.recv() {
            // All senders gone: the monitor dropped the terminate signal.
            Err(_) | Ok(Wake::Terminate) => break,
            Ok(Wake::Lost(source)) => return Err(MonitorError::ArmFailed { source }),
            Ok(Wake::Changed(event)) => {
                // Re-check after waking so nothing is dispatched once stop
                // has begun, even if changes were already queued.
                if ctx.terminate.is_raised() {
                    break;
                }
                let Some(category) = classify(&event) else {
                    trace!(kind = ?event.kind, "ignoring non-change event");
                    continue;
                };
                if !ctx.filter.contains(category) {
                    trace!(?category, "change filtered out");
                    continue;
                }
                let change = ChangeEvent {
                    at: SystemTime::now(),
                    key: &key,
                };
                trace!(target = %ctx.target, ?category, "dispatching change");
                ctx.sinks.emit_changed(&change);
            }
        }
    }

    Ok(())
}
