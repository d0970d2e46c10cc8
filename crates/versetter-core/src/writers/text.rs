//! Line-addressed plain text (`txt`).
//!
//! The property is `<lineIndex>,<template>`: the 0-based line to replace and
//! a template whose `%s` receives the bare version. Only the first comma
//! separates the two, so templates may contain commas.

use camino::Utf8Path;
use tracing::{debug, instrument};

use super::{WriteError, WriteResult, format_template, read_target, write_target};
use crate::record::VersionRecord;

/// Parsed `txt` locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLocator {
    /// 0-based line index.
    pub index: usize,
    /// Replacement line template.
    pub template: String,
}

impl LineLocator {
    /// Parse `<lineIndex>,<template>`.
    ///
    /// # Errors
    ///
    /// Fails if the comma is missing or the index is not a non-negative integer.
    pub fn parse(property: &str) -> WriteResult<Self> {
        let invalid = |reason: &str| WriteError::InvalidProperty {
            property: property.to_owned(),
            reason: reason.to_owned(),
        };

        let (index, template) = property
            .split_once(',')
            .ok_or_else(|| invalid("expected <line>,<template>"))?;
        let index = index
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(&format!("bad line number: {e}")))?;

        Ok(Self {
            index,
            template: template.to_owned(),
        })
    }
}

/// Replace line `locator.index` of `content` with the rendered template.
///
/// Lines are split on `\n` and rejoined with `\n`, so a trailing newline (or
/// `\r` before each `\n`) survives untouched on the other lines.
///
/// # Errors
///
/// Returns [`WriteError::LineOutOfRange`] if the index is past the last line.
pub fn patch_line(content: &str, locator: &LineLocator, version: &str) -> WriteResult<String> {
    let replacement = format_template(&locator.template, version);
    let mut lines: Vec<&str> = content.split('\n').collect();
    let count = lines.len();

    let slot = lines
        .get_mut(locator.index)
        .ok_or(WriteError::LineOutOfRange {
            index: locator.index,
            count,
        })?;
    *slot = &replacement;

    Ok(lines.join("\n"))
}

/// Rewrite one line of the text file at `path`.
///
/// # Errors
///
/// Fails on an unreadable file or an out-of-range line; the file is left
/// untouched in both cases.
#[instrument(skip(record), fields(version = %record.bare_string()))]
pub fn write(record: &VersionRecord, locator: &LineLocator, path: &Utf8Path) -> WriteResult<()> {
    let content = read_target(path)?;
    let patched = patch_line(&content, locator, &record.bare_string())?;
    write_target(path, patched)?;

    debug!(line = locator.index, "text line rewritten");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn locator(property: &str) -> LineLocator {
        LineLocator::parse(property).unwrap()
    }

    #[test]
    fn replaces_middle_line() {
        let out = patch_line("a\nb\nc", &locator("1,X=%s"), "2.0.0").unwrap();
        assert_eq!(out, "a\nX=2.0.0\nc");
    }

    #[test]
    fn keeps_trailing_newline() {
        let out = patch_line("a\nb\n", &locator("0,v%s"), "1.0.0").unwrap();
        assert_eq!(out, "v1.0.0\nb\n");
    }

    #[test]
    fn line_after_trailing_newline_is_addressable() {
        let out = patch_line("a\n", &locator("1,%s"), "1.0.0").unwrap();
        assert_eq!(out, "a\n1.0.0");
    }

    #[test]
    fn template_may_contain_commas() {
        let loc = locator("0,const VERSION = [%s, 0];");
        assert_eq!(loc.template, "const VERSION = [%s, 0];");
        let out = patch_line("old", &loc, "3.1.4").unwrap();
        assert_eq!(out, "const VERSION = [3.1.4, 0];");
    }

    #[test]
    fn out_of_range_line_fails() {
        let err = patch_line("a\nb", &locator("5,%s"), "1.0.0").unwrap_err();
        assert!(matches!(
            err,
            WriteError::LineOutOfRange { index: 5, count: 2 }
        ));
    }

    #[test]
    fn non_numeric_index_fails() {
        assert!(matches!(
            LineLocator::parse("x,%s"),
            Err(WriteError::InvalidProperty { .. })
        ));
        assert!(matches!(
            LineLocator::parse("-1,%s"),
            Err(WriteError::InvalidProperty { .. })
        ));
    }

    #[test]
    fn missing_comma_fails() {
        assert!(matches!(
            LineLocator::parse("3"),
            Err(WriteError::InvalidProperty { .. })
        ));
    }

    #[test]
    fn write_uses_bare_version() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("version.h")).unwrap();
        std::fs::write(&path, "// header\n#define V \"0\"\n").unwrap();

        let record = VersionRecord::new(1, 4, 2).with_prerelease("beta");
        write(&record, &locator("1,#define V \"%s\""), &path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "// header\n#define V \"1.4.2\"\n"
        );
    }

    #[test]
    fn write_out_of_range_leaves_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("v.txt")).unwrap();
        std::fs::write(&path, "only").unwrap();

        let err = write(&VersionRecord::new(1, 0, 0), &locator("3,%s"), &path).unwrap_err();
        assert!(matches!(err, WriteError::LineOutOfRange { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "only");
    }

    #[test]
    fn write_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("absent.txt")).unwrap();
        let err = write(&VersionRecord::new(1, 0, 0), &locator("0,%s"), &path).unwrap_err();
        assert!(matches!(err, WriteError::Read { .. }));
        assert!(!path.exists());
    }
}
