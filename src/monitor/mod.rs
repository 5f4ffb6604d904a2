// src/monitor/mod.rs

//! The key change monitor.
//!
//! This module is responsible for:
//! - The lifecycle controller ([`KeyMonitor`]): start/stop/dispose under one
//!   lock, at most one watch-loop thread per instance.
//! - The watch loop: a dedicated thread blocking on the store's change
//!   notification until a change fires or termination is requested.
//! - The event surface: `on_changed` / `on_error` subscribers, invoked
//!   synchronously on the watch-loop thread in registration order.
//! - The change filter: which categories of change are delivered.
//!
//! It does **not** interpret value payloads; consumers read whatever bytes
//! they need through the [`crate::store::KeyHandle`] carried by each change
//! event.

pub mod events;
pub mod filter;
pub mod lifecycle;
mod watch_loop;

pub use events::ChangeEvent;
pub use filter::{ChangeCategory, ChangeFilter};
pub use lifecycle::{KeyMonitor, MonitorState};
