// src/monitor/filter.rs

//! Change categories and the monitor's notification filter.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use clap::ValueEnum;
use notify::event::{CreateKind, EventKind, MetadataKind, ModifyKind, RemoveKind};
use notify::Event;

/// Category of change reported for a watched key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChangeCategory {
    /// A subkey was added or deleted.
    Key,
    /// Attributes of the key changed.
    Attribute,
    /// A value of the key changed (including adding or deleting a value).
    Value,
    /// The security settings of the key changed.
    Security,
}

impl ChangeCategory {
    fn bit(self) -> u8 {
        match self {
            ChangeCategory::Key => 1,
            ChangeCategory::Attribute => 1 << 1,
            ChangeCategory::Value => 1 << 2,
            ChangeCategory::Security => 1 << 3,
        }
    }
}

/// Independent set of [`ChangeCategory`] members.
///
/// Defaults to all four. Mutable on a monitor only while it is idle.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ChangeFilter(u8);

impl ChangeFilter {
    pub const KEY: ChangeFilter = ChangeFilter(1);
    pub const ATTRIBUTE: ChangeFilter = ChangeFilter(1 << 1);
    pub const VALUE: ChangeFilter = ChangeFilter(1 << 2);
    pub const SECURITY: ChangeFilter = ChangeFilter(1 << 3);

    pub const fn empty() -> Self {
        ChangeFilter(0)
    }

    pub const fn all() -> Self {
        ChangeFilter(0b1111)
    }

    pub fn contains(self, category: ChangeCategory) -> bool {
        self.0 & category.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    // Raw bit access, used to mirror the filter through an atomic.
    pub(crate) fn bits(self) -> u8 {
        self.0
    }

    pub(crate) fn from_bits(bits: u8) -> Self {
        ChangeFilter(bits & ChangeFilter::all().0)
    }
}

impl Default for ChangeFilter {
    fn default() -> Self {
        ChangeFilter::all()
    }
}

impl From<ChangeCategory> for ChangeFilter {
    fn from(category: ChangeCategory) -> Self {
        ChangeFilter(category.bit())
    }
}

impl BitOr for ChangeFilter {
    type Output = ChangeFilter;

    fn bitor(self, rhs: ChangeFilter) -> ChangeFilter {
        ChangeFilter(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChangeFilter {
    fn bitor_assign(&mut self, rhs: ChangeFilter) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<ChangeCategory> for ChangeFilter {
    fn from_iter<I: IntoIterator<Item = ChangeCategory>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ChangeFilter::empty(), |acc, c| acc | c.into())
    }
}

impl fmt::Debug for ChangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for category in [
            ChangeCategory::Key,
            ChangeCategory::Attribute,
            ChangeCategory::Value,
            ChangeCategory::Security,
        ] {
            if self.contains(category) {
                set.entry(&category);
            }
        }
        set.finish()
    }
}

/// Map a watcher event onto a change category.
///
/// Directory create/remove means a subkey appeared or vanished; file-level
/// create/remove/data events are value changes; permission and ownership
/// metadata map to security, any other metadata to attributes. Access events
/// carry no change and are dropped.
pub(crate) fn classify(event: &Event) -> Option<ChangeCategory> {
    match event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
            Some(ChangeCategory::Key)
        }
        EventKind::Create(_) | EventKind::Remove(_) => Some(ChangeCategory::Value),
        EventKind::Modify(ModifyKind::Data(_)) => Some(ChangeCategory::Value),
        EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::Permissions | MetadataKind::Ownership,
        )) => Some(ChangeCategory::Security),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(ChangeCategory::Attribute),
        EventKind::Modify(ModifyKind::Name(_)) => {
            // A rename target that still exists as a directory is a subkey
            // move; everything else is treated as a value change.
            if event.paths.iter().any(|p| p.is_dir()) {
                Some(ChangeCategory::Key)
            } else {
                Some(ChangeCategory::Value)
            }
        }
        EventKind::Modify(_) | EventKind::Any => Some(ChangeCategory::Value),
        EventKind::Access(_) | EventKind::Other => None,
    }
}
