// src/store/key.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::address::WatchTarget;

/// An open key in a hive.
///
/// Exposes the key's named values as raw bytes, read on demand. During a
/// change callback the handle is borrowed from the watch-loop thread; any
/// payload a consumer needs must be read before the callback returns.
#[derive(Debug)]
pub struct KeyHandle {
    target: WatchTarget,
    dir: PathBuf,
}

impl KeyHandle {
    pub(crate) fn new(target: WatchTarget, dir: PathBuf) -> Self {
        Self { target, dir }
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// The key's backing directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a named value's raw bytes, or `None` if the value is absent.
    pub fn value(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.dir.join(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Write a named value's raw bytes (creating or overwriting it).
    pub fn set_value(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        fs::write(self.dir.join(name), bytes)
    }

    /// Names of the values stored directly under this key.
    pub fn value_names(&self) -> io::Result<Vec<String>> {
        self.entries(|file_type| file_type.is_file())
    }

    /// Names of the subkeys directly under this key.
    pub fn subkey_names(&self) -> io::Result<Vec<String>> {
        self.entries(|file_type| file_type.is_dir())
    }

    fn entries(&self, keep: impl Fn(fs::FileType) -> bool) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if keep(entry.file_type()?) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
