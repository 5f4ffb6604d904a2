// src/address.rs

//! Store addressing: root keys, aliases and watch targets.
//!
//! A location in the hive is addressed as a root key plus an ordered sequence
//! of path segments. Path strings use `\` (registry style) or `/` as segment
//! delimiters; the first segment of a full path string must be a root name or
//! one of its aliases. Resolution happens once, at construction time.

use std::fmt;
use std::str::FromStr;

use crate::errors::MonitorError;

/// Root of the hierarchical key-value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKey {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
    CurrentConfig,
    PerformanceData,
    DynamicData,
}

impl RootKey {
    /// Canonical long name, also used as the root's directory name in a hive.
    pub fn canonical_name(self) -> &'static str {
        match self {
            RootKey::ClassesRoot => "HKEY_CLASSES_ROOT",
            RootKey::CurrentUser => "HKEY_CURRENT_USER",
            RootKey::LocalMachine => "HKEY_LOCAL_MACHINE",
            RootKey::Users => "HKEY_USERS",
            RootKey::CurrentConfig => "HKEY_CURRENT_CONFIG",
            RootKey::PerformanceData => "HKEY_PERFORMANCE_DATA",
            RootKey::DynamicData => "HKEY_DYN_DATA",
        }
    }

    /// Conventional short alias, where one exists.
    pub fn short_name(self) -> Option<&'static str> {
        match self {
            RootKey::ClassesRoot => Some("HKCR"),
            RootKey::CurrentUser => Some("HKCU"),
            RootKey::LocalMachine => Some("HKLM"),
            RootKey::Users => Some("HKU"),
            RootKey::CurrentConfig => Some("HKCC"),
            RootKey::PerformanceData | RootKey::DynamicData => None,
        }
    }

    /// Resolve a root token (long or short alias, ASCII case-insensitive).
    pub fn from_token(token: &str) -> Option<RootKey> {
        let token = token.trim();
        let all = [
            RootKey::ClassesRoot,
            RootKey::CurrentUser,
            RootKey::LocalMachine,
            RootKey::Users,
            RootKey::CurrentConfig,
            RootKey::PerformanceData,
            RootKey::DynamicData,
        ];
        all.into_iter().find(|root| {
            token.eq_ignore_ascii_case(root.canonical_name())
                || root
                    .short_name()
                    .is_some_and(|short| token.eq_ignore_ascii_case(short))
        })
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl FromStr for RootKey {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RootKey::from_token(s).ok_or_else(|| MonitorError::InvalidAddress {
            token: s.to_string(),
        })
    }
}

/// The store location whose changes are monitored.
///
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    root: RootKey,
    segments: Vec<String>,
}

impl WatchTarget {
    /// Build a target from an already-resolved root and a subpath string
    /// (which may be empty to address the root itself).
    ///
    /// Fails with `InvalidAddress` on `.` or `..` segments; the store backs
    /// keys with directories, so traversal segments could otherwise address
    /// locations outside the hive.
    pub fn new(root: RootKey, subpath: &str) -> crate::errors::Result<Self> {
        Ok(Self {
            root,
            segments: split_segments(subpath)?,
        })
    }

    /// Parse a full path string whose first segment is a root name or alias,
    /// e.g. `HKCU\SOFTWARE\Microsoft\Windows\CurrentVersion\Explorer\Accent`.
    pub fn parse(spec: &str) -> crate::errors::Result<Self> {
        let mut parts = spec.split(['\\', '/']).filter(|s| !s.trim().is_empty());
        let token = parts.next().ok_or_else(|| MonitorError::InvalidAddress {
            token: spec.to_string(),
        })?;

        let root = token.parse::<RootKey>()?;
        let segments = collect_segments(parts)?;

        Ok(Self { root, segments })
    }

    pub fn root(&self) -> RootKey {
        self.root
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The path below the root, backslash-joined (empty for the root itself).
    pub fn subpath(&self) -> String {
        self.segments.join("\\")
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for segment in &self.segments {
            write!(f, "\\{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for WatchTarget {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WatchTarget::parse(s)
    }
}

fn split_segments(subpath: &str) -> crate::errors::Result<Vec<String>> {
    collect_segments(subpath.split(['\\', '/']).filter(|s| !s.trim().is_empty()))
}

// Keys map onto directories, so `.`/`..` are not valid key names: they would
// let a target escape the hive base.
fn collect_segments<'a>(
    parts: impl Iterator<Item = &'a str>,
) -> crate::errors::Result<Vec<String>> {
    let mut segments = Vec::new();
    for part in parts {
        let part = part.trim();
        if part == "." || part == ".." {
            return Err(MonitorError::InvalidAddress {
                token: part.to_string(),
            });
        }
        segments.push(part.to_string());
    }
    Ok(segments)
}
