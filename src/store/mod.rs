// src/store/mod.rs

//! The hive: a hierarchical, external, persistent key-value store backed by
//! a directory tree.
//!
//! Layout: one subdirectory per root key under the hive base directory
//! (named after the root's canonical long name), keys as nested directories,
//! named values as files holding raw bytes. The store itself knows nothing
//! about watching; the monitor arms its change notification on the key
//! directory a [`KeyHandle`] points at.

pub mod hive;
pub mod key;

pub use hive::Hive;
pub use key::KeyHandle;
