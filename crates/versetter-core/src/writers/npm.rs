//! `package.json` version field (`npm`).

use camino::Utf8Path;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{WriteError, WriteResult, read_target, require_target, write_target};
use crate::record::VersionRecord;

/// The field holding the package version.
pub const VERSION_FIELD: &str = "version";

/// Replace the top-level `version` field of a JSON object.
///
/// Other keys keep their order.
///
/// # Errors
///
/// Fails if `content` is not a JSON object or has no `version` field.
pub fn patch(content: &str, version: &str) -> WriteResult<String> {
    let Value::Object(mut root) = serde_json::from_str::<Value>(content)? else {
        return Err(WriteError::NotAnObject);
    };

    let field = root
        .get_mut(VERSION_FIELD)
        .ok_or_else(|| WriteError::MissingField(VERSION_FIELD.to_owned()))?;
    *field = Value::String(version.to_owned());

    Ok(serde_json::to_string(&Value::Object(root))?)
}

/// Set the full version in the `package.json` at `path`.
///
/// # Errors
///
/// Fails if the file is missing, unreadable, not a JSON object, lacks a
/// `version` field, or cannot be written. Nothing is written on failure.
#[instrument(skip(record), fields(version = %record))]
pub fn write(record: &VersionRecord, path: &Utf8Path) -> WriteResult<()> {
    require_target(path)?;
    let content = read_target(path)?;
    let patched = patch(&content, &record.semantic_string())?;
    write_target(path, patched)?;
    debug!("package version rewritten");
    Ok(())
}
