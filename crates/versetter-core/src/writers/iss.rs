//! Inno Setup `#define` line (`iss`).
//!
//! The property names the preprocessor variable holding the version. The
//! matching `#define` is rewritten and preceded by a marker comment; when no
//! such define exists one is inserted at the top of the script. Output always
//! uses CRLF line endings, which is what Inno Setup scripts use.

use camino::Utf8Path;
use tracing::{debug, instrument};

use super::{WriteResult, read_target, require_target, write_target};
use crate::record::VersionRecord;

/// Marker comment placed above the managed `#define`.
///
/// The text is kept byte-identical to what earlier tooling wrote so existing
/// scripts are recognized and the marker is not duplicated.
pub const MARKER: &str = ";version number set by GoVersionSetter.";

const DIRECTIVE: &str = "#define";
const LINE_ENDING: &str = "\r\n";

fn define_line(name: &str, version: &str) -> String {
    format!("{DIRECTIVE} {name} \"{version}\"")
}

fn defines_name(line: &str, name: &str) -> bool {
    line.starts_with(DIRECTIVE)
        && line
            .split(' ')
            .nth(1)
            .is_some_and(|token| token.to_lowercase() == name.to_lowercase())
}

/// Rewrite `content`, setting the `#define <name>` value to `version`.
///
/// Existing marker lines are dropped and regenerated, so repeated runs never
/// accumulate markers. Every output line ends in `\r\n`.
pub fn patch(content: &str, name: &str, version: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut found = false;

    for line in content.lines() {
        if line == MARKER {
            continue;
        }
        if defines_name(line, name) {
            found = true;
            lines.push(MARKER.to_owned());
            lines.push(define_line(name, version));
        } else {
            lines.push(line.to_owned());
        }
    }

    if !found {
        lines.splice(0..0, [MARKER.to_owned(), define_line(name, version)]);
    }

    lines
        .iter()
        .flat_map(|line| [line.as_str(), LINE_ENDING])
        .collect()
}

/// Set `#define <name> "<version>"` in the Inno Setup script at `path`.
///
/// # Errors
///
/// Fails if the script is missing, unreadable, or cannot be written.
#[instrument(skip(record), fields(version = %record))]
pub fn write(record: &VersionRecord, name: &str, path: &Utf8Path) -> WriteResult<()> {
    require_target(path)?;
    let content = read_target(path)?;
    let patched = patch(&content, name, &record.semantic_string());
    write_target(path, patched)?;
    debug!("inno setup define rewritten");
    Ok(())
}
