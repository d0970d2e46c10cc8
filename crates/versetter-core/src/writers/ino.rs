//! Arduino-style template overwrite (`ino`).
//!
//! The property is the complete file contents as a single-line template.
//! Literal `\r` and `\n` escapes become real control characters and `%s`
//! receives the bare version. The target is replaced wholesale.

use camino::Utf8Path;
use tracing::{debug, instrument};

use super::{WriteResult, format_template, write_target};
use crate::record::VersionRecord;

/// Turn literal `\r` / `\n` escape sequences into CR / LF.
pub fn unescape(template: &str) -> String {
    template.replace("\\r", "\r").replace("\\n", "\n")
}

/// Render the file contents for `template`.
pub fn render(template: &str, version: &str) -> String {
    format_template(&unescape(template), version)
}

/// Overwrite `path` with the rendered template, creating it if needed.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
#[instrument(skip(record), fields(version = %record.bare_string()))]
pub fn write(record: &VersionRecord, template: &str, path: &Utf8Path) -> WriteResult<()> {
    let contents = render(template, &record.bare_string());
    write_target(path, &contents)?;
    debug!(bytes = contents.len(), "template written");
    Ok(())
}
