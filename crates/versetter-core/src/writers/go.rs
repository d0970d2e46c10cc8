//! Fixed-shape Go version blob (`go`).
//!
//! Produces `{"Major":1,"Minor":2,"Patch":3,"Special":"beta"}` for consumption
//! by Go build tooling. The prerelease label travels as `Special`.

use camino::Utf8Path;
use serde::Serialize;
use tracing::instrument;

use super::{WriteResult, write_target};
use crate::record::VersionRecord;

#[derive(Serialize)]
struct GoVersion<'a> {
    #[serde(rename = "Major")]
    major: u64,
    #[serde(rename = "Minor")]
    minor: u64,
    #[serde(rename = "Patch")]
    patch: u64,
    #[serde(rename = "Special")]
    special: &'a str,
}

/// Render the Go version blob for `record`.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(record: &VersionRecord) -> WriteResult<String> {
    let blob = GoVersion {
        major: record.major,
        minor: record.minor,
        patch: record.patch,
        special: &record.prerelease,
    };
    Ok(serde_json::to_string(&blob)?)
}

/// Overwrite `path` with the Go version blob.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
#[instrument(skip(record), fields(version = %record))]
pub fn write(record: &VersionRecord, path: &Utf8Path) -> WriteResult<()> {
    write_target(path, render(record)?)
}
