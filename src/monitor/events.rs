// src/monitor/events.rs

//! The monitor's event surface.
//!
//! Change and error callbacks are invoked synchronously on the watch-loop
//! thread, in registration order. The monitor performs no marshaling; a
//! consumer that needs to touch state owned by another thread must hand the
//! data off itself before returning.

use std::sync::Mutex;
use std::time::SystemTime;

use tracing::warn;

use crate::errors::MonitorError;
use crate::store::KeyHandle;

/// A fired change on the watched key.
///
/// The key reference is only valid for the duration of the callback; the
/// watch loop may reuse or close the handle afterwards. Read any needed
/// value bytes before returning.
#[derive(Debug)]
pub struct ChangeEvent<'a> {
    /// When the change was observed by the watch loop.
    pub at: SystemTime,
    /// The changed location, usable to fetch named values' raw bytes.
    pub key: &'a KeyHandle,
}

type ChangeCallback = Box<dyn Fn(&ChangeEvent<'_>) + Send>;
type ErrorCallback = Box<dyn Fn(&MonitorError) + Send>;

/// Subscriber lists for the change and error events.
///
/// Lives behind its own mutexes so registration never contends with the
/// lifecycle lock, and so the watch-loop thread never needs that lock to
/// dispatch.
#[derive(Default)]
pub(crate) struct EventSinks {
    changed: Mutex<Vec<ChangeCallback>>,
    error: Mutex<Vec<ErrorCallback>>,
}

impl EventSinks {
    pub(crate) fn subscribe_changed(&self, callback: ChangeCallback) {
        match self.changed.lock() {
            Ok(mut subscribers) => subscribers.push(callback),
            Err(poisoned) => poisoned.into_inner().push(callback),
        }
    }

    pub(crate) fn subscribe_error(&self, callback: ErrorCallback) {
        match self.error.lock() {
            Ok(mut subscribers) => subscribers.push(callback),
            Err(poisoned) => poisoned.into_inner().push(callback),
        }
    }

    pub(crate) fn emit_changed(&self, event: &ChangeEvent<'_>) {
        let subscribers = match self.changed.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("change subscriber list poisoned; dropping event");
                return;
            }
        };
        for callback in subscribers.iter() {
            callback(event);
        }
    }

    pub(crate) fn emit_error(&self, err: &MonitorError) {
        let subscribers = match self.error.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!(error = %err, "error subscriber list poisoned; dropping event");
                return;
            }
        };
        for callback in subscribers.iter() {
            callback(err);
        }
    }
}
