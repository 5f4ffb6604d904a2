// src/monitor/lifecycle.rs

//! The lifecycle controller: [`KeyMonitor`].

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::address::{RootKey, WatchTarget};
use crate::errors::{MonitorError, Result};
use crate::monitor::events::{ChangeEvent, EventSinks};
use crate::monitor::filter::ChangeFilter;
use crate::monitor::watch_loop::{self, TerminateSignal, WatchContext};
use crate::store::{Hive, KeyHandle};

/// Coarse lifecycle state of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Constructed or stopped; no watch thread running.
    Idle,
    /// A watch-loop thread is running.
    Watching,
    /// Terminal; `start`/`stop` are rejected.
    Disposed,
}

// Atomic mirror of [`MonitorState`], kept alongside the lifecycle lock so
// state queries never have to take it.
pub(crate) const PHASE_IDLE: u8 = 0;
pub(crate) const PHASE_WATCHING: u8 = 1;
pub(crate) const PHASE_DISPOSED: u8 = 2;

struct Lifecycle {
    thread: Option<JoinHandle<()>>,
    terminate: Option<Arc<TerminateSignal>>,
    disposed: bool,
}

impl Lifecycle {
    fn thread_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

/// Watches one key in a hive and raises an event whenever it changes,
/// without polling.
///
/// The blocking change-wait runs on a dedicated thread; `start`, `stop` and
/// `dispose` are safe to call from arbitrary threads, including concurrently.
/// `stop` is synchronous: once it returns, the watch thread has exited and no
/// further change or error event will fire.
///
/// Callbacks run on the watch-loop thread and must **not** call `start`,
/// `stop`, `dispose` or `set_filter` on their own monitor; `stop` and
/// `dispose` would be a self-join, and the mutators contend on the lifecycle
/// lock a concurrent `stop` holds while it waits for the callback to return.
/// The read-only accessors (`state`, `is_watching`, `filter`) never take that
/// lock and are safe from anywhere, callbacks included.
pub struct KeyMonitor {
    hive: Hive,
    target: WatchTarget,
    state: Mutex<Lifecycle>,
    // Lock-free mirrors of the lifecycle phase and the active filter.
    phase: Arc<AtomicU8>,
    filter_bits: AtomicU8,
    sinks: Arc<EventSinks>,
}

impl KeyMonitor {
    /// Monitor `subpath` under an already-resolved root.
    ///
    /// Fails with [`MonitorError::InvalidAddress`] on traversal segments
    /// (`.`/`..`) in the subpath.
    pub fn new(hive: Hive, root: RootKey, subpath: &str) -> Result<Self> {
        Ok(Self::with_target(hive, WatchTarget::new(root, subpath)?))
    }

    /// Monitor the key named by an alias-bearing path string such as
    /// `HKCU\SOFTWARE\Microsoft\Windows\CurrentVersion\Explorer\Accent`.
    ///
    /// Fails with [`MonitorError::InvalidAddress`] if the first segment is
    /// not a known root name or alias. No thread is spawned until `start`.
    pub fn from_path(hive: Hive, spec: &str) -> Result<Self> {
        Ok(Self::with_target(hive, WatchTarget::parse(spec)?))
    }

    /// Monitor the location an open [`KeyHandle`] points at.
    ///
    /// The target is taken from the handle; the key is re-opened by each
    /// watch cycle rather than borrowing the handle itself.
    pub fn from_key(hive: Hive, key: &KeyHandle) -> Self {
        Self::with_target(hive, key.target().clone())
    }

    fn with_target(hive: Hive, target: WatchTarget) -> Self {
        Self {
            hive,
            target,
            state: Mutex::new(Lifecycle {
                thread: None,
                terminate: None,
                disposed: false,
            }),
            phase: Arc::new(AtomicU8::new(PHASE_IDLE)),
            filter_bits: AtomicU8::new(ChangeFilter::all().bits()),
            sinks: Arc::new(EventSinks::default()),
        }
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Subscribe to change events. Subscribers are invoked synchronously on
    /// the watch-loop thread, in registration order.
    pub fn on_changed(&self, callback: impl Fn(&ChangeEvent<'_>) + Send + 'static) {
        self.sinks.subscribe_changed(Box::new(callback));
    }

    /// Subscribe to classified watch failures.
    pub fn on_error(&self, callback: impl Fn(&MonitorError) + Send + 'static) {
        self.sinks.subscribe_error(Box::new(callback));
    }

    pub fn filter(&self) -> ChangeFilter {
        ChangeFilter::from_bits(self.filter_bits.load(Ordering::SeqCst))
    }

    /// Replace the change filter. Only permitted while idle; the new filter
    /// applies from the next `start`.
    pub fn set_filter(&self, filter: ChangeFilter) -> Result<()> {
        let state = self.lock_state();
        if state.thread_running() {
            return Err(MonitorError::InvalidOperation(
                "change filter cannot be modified while watching",
            ));
        }
        self.filter_bits.store(filter.bits(), Ordering::SeqCst);
        Ok(())
    }

    pub fn state(&self) -> MonitorState {
        match self.phase.load(Ordering::SeqCst) {
            PHASE_DISPOSED => MonitorState::Disposed,
            PHASE_WATCHING => MonitorState::Watching,
            _ => MonitorState::Idle,
        }
    }

    pub fn is_watching(&self) -> bool {
        self.phase.load(Ordering::SeqCst) == PHASE_WATCHING
    }

    /// Spawn the watch-loop thread. No-op if one is already running.
    ///
    /// A fresh terminate signal is created for every cycle, so a signal
    /// raised by an earlier `stop` can never leak into the new loop. A watch
    /// thread that already ended on its own (after a watch failure) is
    /// reaped and replaced here; there is no automatic restart.
    pub fn start(&self) -> Result<()> {
        let mut state = self.lock_state();
        if state.disposed {
            return Err(MonitorError::AlreadyDisposed);
        }
        if state.thread_running() {
            debug!(target = %self.target, "start: already watching");
            return Ok(());
        }
        if let Some(stale) = state.thread.take() {
            if stale.join().is_err() {
                warn!(target = %self.target, "previous watch thread had panicked");
            }
        }

        let (wake_tx, wake_rx) = mpsc::channel();
        let terminate = Arc::new(TerminateSignal::new(wake_tx.clone()));

        let ctx = WatchContext {
            hive: self.hive.clone(),
            target: self.target.clone(),
            filter: self.filter(),
            sinks: Arc::clone(&self.sinks),
            terminate: Arc::clone(&terminate),
            phase: Arc::clone(&self.phase),
            wake_tx,
            wake_rx,
        };

        // Published before the spawn so the loop thread, which flips the
        // phase back to idle when it exits on its own, can never lose the
        // race against this store.
        self.phase.store(PHASE_WATCHING, Ordering::SeqCst);

        let handle = match thread::Builder::new()
            .name("hive-watch".to_string())
            .spawn(move || watch_loop::run(ctx))
        {
            Ok(handle) => handle,
            Err(source) => {
                self.phase.store(PHASE_IDLE, Ordering::SeqCst);
                return Err(MonitorError::SpawnFailed { source });
            }
        };

        state.thread = Some(handle);
        state.terminate = Some(terminate);
        debug!(target = %self.target, "watch thread started");
        Ok(())
    }

    /// Request termination and block until the watch thread has exited.
    /// No-op if idle.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.lock_state();
        if state.disposed {
            return Err(MonitorError::AlreadyDisposed);
        }
        self.stop_locked(&mut state);
        Ok(())
    }

    /// Stop if needed and retire the monitor. Idempotent; never fails; safe
    /// from any thread. After this, `start` and `stop` are rejected.
    pub fn dispose(&self) {
        let mut state = self.lock_state();
        if state.disposed {
            return;
        }
        self.stop_locked(&mut state);
        state.disposed = true;
        self.phase.store(PHASE_DISPOSED, Ordering::SeqCst);
        debug!(target = %self.target, "monitor disposed");
    }

    // Holding the lock across the join is deliberate: it serializes
    // overlapping stop/dispose calls, and the watch-loop thread never takes
    // this lock, so a self-join cannot arise. Callbacks can still query
    // `state`, `is_watching` and `filter` while the join is in flight; those
    // read the atomic mirrors.
    fn stop_locked(&self, state: &mut Lifecycle) {
        let Some(handle) = state.thread.take() else {
            state.terminate = None;
            return;
        };
        if let Some(terminate) = &state.terminate {
            terminate.raise();
        }
        if handle.join().is_err() {
            warn!(target = %self.target, "watch thread panicked; stop completed anyway");
        }
        state.terminate = None;
        self.phase.store(PHASE_IDLE, Ordering::SeqCst);
        debug!(target = %self.target, "watch thread joined");
    }

    // The lock only guards plain lifecycle data and no user code runs while
    // it is held, so a poisoned guard can be taken over safely.
    fn lock_state(&self) -> MutexGuard<'_, Lifecycle> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for KeyMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMonitor")
            .field("target", &self.target)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Drop for KeyMonitor {
    fn drop(&mut self) {
        self.dispose();
    }
}
