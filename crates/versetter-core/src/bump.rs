//! Version bump application.
//!
//! A [`BumpRequest`] carries the increments and prerelease change asked for on
//! the command line. [`apply`] mutates the [`VersionRecord`] in place and
//! returns a [`BumpOutcome`] listing what changed, so the caller knows whether
//! the record needs to be persisted.
//!
//! Increments are independent and never reset lower components: bumping the
//! major of `1.2.3` yields `2.2.3`, not `2.0.0`.

use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::record::VersionRecord;

/// Prerelease value that clears the current label.
pub const CLEAR_PRERELEASE: &str = " ";

// ──────────────────────────────────────────────
// Request / outcome types
// ──────────────────────────────────────────────

/// The bump operations requested for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BumpRequest {
    /// Add one to the major component.
    pub major: bool,
    /// Add one to the minor component.
    pub minor: bool,
    /// Add one to the patch component.
    pub patch: bool,
    /// New prerelease label. [`CLEAR_PRERELEASE`] removes it; an empty
    /// string is ignored.
    pub prerelease: Option<String>,
}

impl BumpRequest {
    /// Whether the request asks for anything at all.
    pub fn is_empty(&self) -> bool {
        !self.major
            && !self.minor
            && !self.patch
            && self.prerelease.as_deref().is_none_or(str::is_empty)
    }
}

/// A single change applied to the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Change {
    /// Major incremented to the contained value.
    Major(u64),
    /// Minor incremented to the contained value.
    Minor(u64),
    /// Patch incremented to the contained value.
    Patch(u64),
    /// Prerelease label removed.
    PrereleaseCleared,
    /// Prerelease label set to the contained value.
    PrereleaseSet(String),
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major(v) => write!(f, "increment major: {v}"),
            Self::Minor(v) => write!(f, "increment minor: {v}"),
            Self::Patch(v) => write!(f, "increment patch: {v}"),
            Self::PrereleaseCleared => write!(f, "prerelease reset"),
            Self::PrereleaseSet(p) => write!(f, "prerelease changed: {p}"),
        }
    }
}

/// What [`apply`] did to the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BumpOutcome {
    /// Changes in application order.
    pub changes: Vec<Change>,
}

impl BumpOutcome {
    /// Whether the record was modified and should be persisted.
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

// ──────────────────────────────────────────────
// Apply
// ──────────────────────────────────────────────

/// Apply `request` to `record`.
///
/// Checks run in the order major, minor, patch, prerelease; each is
/// evaluated on its own.
#[instrument(skip_all, fields(from = %record))]
pub fn apply(record: &mut VersionRecord, request: &BumpRequest) -> BumpOutcome {
    let mut changes = Vec::new();

    if request.major {
        changes.push(Change::Major(increment(&mut record.major, "major")));
    }

    if request.minor {
        changes.push(Change::Minor(increment(&mut record.minor, "minor")));
    }

    if request.patch {
        changes.push(Change::Patch(increment(&mut record.patch, "patch")));
    }

    match request.prerelease.as_deref() {
        None | Some("") => {}
        Some(CLEAR_PRERELEASE) => {
            record.prerelease.clear();
            changes.push(Change::PrereleaseCleared);
        }
        Some(label) => {
            if semver::Prerelease::new(label).is_err() {
                warn!(prerelease = label, "prerelease is not a valid semver identifier");
            }
            record.prerelease = label.to_owned();
            changes.push(Change::PrereleaseSet(label.to_owned()));
        }
    }

    debug!(to = %record, changed = !changes.is_empty(), "bump applied");
    BumpOutcome { changes }
}

/// Add one to `value`, staying at `u64::MAX` instead of overflowing.
fn increment(value: &mut u64, component: &str) -> u64 {
    match value.checked_add(1) {
        Some(next) => *value = next,
        None => warn!(component, "version component at maximum, not incremented"),
    }
    *value
}
