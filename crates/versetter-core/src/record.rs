//! The persisted version record.
//!
//! A [`VersionRecord`] is the single source of truth for the project version.
//! [`RecordStore`] keeps it in a small YAML document (`version.yaml` by
//! default):
//!
//! ```yaml
//! major: 1
//! minor: 4
//! patch: 0
//! prerelease: beta
//! ```

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Default record file name, relative to the working directory.
pub const DEFAULT_RECORD_FILE: &str = "version.yaml";

/// Errors from record persistence.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The record file exists but could not be read.
    #[error("error reading version file {path}: {source}")]
    Read {
        /// Record file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The record file could not be written.
    #[error("error writing version file {path}: {source}")]
    Write {
        /// Record file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The record could not be rendered as YAML.
    #[error("error serializing version: {0}")]
    Serialize(String),
}

/// Result alias for record operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// A semantic version with an optional prerelease label.
///
/// An empty `prerelease` means "no prerelease suffix".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionRecord {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
    /// Prerelease label, empty when unset.
    pub prerelease: String,
}

impl VersionRecord {
    /// Create a record without a prerelease label.
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: String::new(),
        }
    }

    /// Attach a prerelease label.
    pub fn with_prerelease(mut self, prerelease: impl Into<String>) -> Self {
        self.prerelease = prerelease.into();
        self
    }

    /// The record created on first run: `0.0.1`.
    pub const fn initial() -> Self {
        Self::new(0, 0, 1)
    }

    /// `major.minor.patch[-prerelease]`.
    pub fn semantic_string(&self) -> String {
        self.to_string()
    }

    /// `major.minor.patch`, ignoring any prerelease label.
    ///
    /// Used by formats that cannot carry a prerelease tag.
    pub fn bare_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// Whether a prerelease label is set.
    pub fn has_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.has_prerelease() {
            write!(f, "-{}", self.prerelease)?;
        }
        Ok(())
    }
}

/// Loads and persists the [`VersionRecord`].
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: Utf8PathBuf,
}

impl RecordStore {
    /// Create a store backed by `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the record file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Load the record, creating it with [`VersionRecord::initial`] if absent.
    ///
    /// Fields that fail to parse are reported and left at zero, and the
    /// fields that do parse are kept. A failed save of the initial record
    /// is reported the same way.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Read`] when the file exists but cannot be read.
    #[instrument(skip(self), fields(path = %self.path))]
    pub fn load(&self) -> RecordResult<VersionRecord> {
        if !self.path.exists() {
            let record = VersionRecord::initial();
            info!(%record, "no version file, creating one");
            if let Err(err) = self.save(&record) {
                warn!(error = %err, "failed to create version file");
            }
            return Ok(record);
        }

        let data = std::fs::read_to_string(&self.path).map_err(|source| RecordError::Read {
            path: self.path.clone(),
            source,
        })?;

        let record = decode(&data);
        debug!(%record, "version record loaded");
        Ok(record)
    }

    /// Overwrite the record file with `record`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    #[instrument(skip_all, fields(path = %self.path, record = %record))]
    pub fn save(&self, record: &VersionRecord) -> RecordResult<()> {
        let yaml =
            serde_saphyr::to_string(record).map_err(|e| RecordError::Serialize(e.to_string()))?;
        std::fs::write(&self.path, yaml).map_err(|source| RecordError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!("version record saved");
        Ok(())
    }
}

/// Decode a record, keeping every field that parses.
///
/// Fields that are missing, null or of the wrong type stay at zero (empty
/// for `prerelease`). A document that is not a YAML mapping yields the zero
/// record.
fn decode(data: &str) -> VersionRecord {
    let fields = match serde_saphyr::from_str::<Value>(data) {
        Ok(Value::Object(fields)) => fields,
        Ok(Value::Null) => Map::new(),
        Ok(other) => {
            warn!(found = %other, "version file is not a mapping, using zero version");
            Map::new()
        }
        Err(err) => {
            warn!(error = %err, "can't parse version file, using zero version");
            Map::new()
        }
    };

    VersionRecord {
        major: component(&fields, "major"),
        minor: component(&fields, "minor"),
        patch: component(&fields, "patch"),
        prerelease: label(&fields, "prerelease"),
    }
}

fn component(fields: &Map<String, Value>, key: &str) -> u64 {
    match fields.get(key) {
        None | Some(Value::Null) => 0,
        Some(value) => value.as_u64().unwrap_or_else(|| {
            warn!(key, %value, "ignoring invalid version field");
            0
        }),
    }
}

fn label(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => value.to_string(),
        Some(value) => {
            warn!(key, %value, "ignoring invalid version field");
            String::new()
        }
    }
}
