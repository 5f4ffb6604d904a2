// src/store/hive.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::address::WatchTarget;
use crate::errors::{MonitorError, Result};
use crate::store::key::KeyHandle;

/// Cheap handle to a hive rooted at a base directory.
///
/// A `Hive` does no I/O on construction; keys are resolved and opened on
/// demand.
#[derive(Debug, Clone)]
pub struct Hive {
    base: PathBuf,
}

impl Hive {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The on-disk directory a target resolves to, whether or not it exists.
    pub fn key_dir(&self, target: &WatchTarget) -> PathBuf {
        let mut dir = self.base.join(target.root().canonical_name());
        for segment in target.segments() {
            dir.push(segment);
        }
        dir
    }

    /// Open a key for read + notify access.
    ///
    /// Fails with [`MonitorError::OpenFailed`] if the key does not exist in
    /// the hive.
    pub fn open_key(&self, target: &WatchTarget) -> Result<KeyHandle> {
        let dir = self.key_dir(target);
        if !dir.is_dir() {
            return Err(MonitorError::OpenFailed {
                target: target.clone(),
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such key directory: {}", dir.display()),
                ),
            });
        }
        Ok(KeyHandle::new(target.clone(), dir))
    }

    /// Create a key (and any missing parents), then open it.
    ///
    /// Provisioning convenience; the monitor itself never creates keys.
    pub fn create_key(&self, target: &WatchTarget) -> io::Result<KeyHandle> {
        let dir = self.key_dir(target);
        fs::create_dir_all(&dir)?;
        Ok(KeyHandle::new(target.clone(), dir))
    }
}
