//! Format-specific rewrite routines.
//!
//! Each submodule handles one target format. They all follow the same shape:
//! a pure transform over the document text (easy to test) plus a `write`
//! entry point that reads the target, applies the transform, and overwrites
//! the file.
//!
//! | Environment | Module    | Version used | Locator                          |
//! |-------------|-----------|--------------|----------------------------------|
//! | `txt`       | [`text`]  | bare         | `<line>,<template>`              |
//! | `ino`       | [`ino`]   | bare         | template with `\r` / `\n` escapes |
//! | `go`        | [`go`]    | components   | none                             |
//! | `gores`     | [`gores`] | full         | `a/b/c,x/y` key paths            |
//! | `vs`        | [`vs`]    | bare         | none                             |
//! | `npm`       | [`npm`]   | full         | none                             |
//! | `iss`       | [`iss`]   | full         | `#define` name                   |

pub mod go;
pub mod gores;
pub mod ino;
pub mod iss;
pub mod npm;
pub mod text;
pub mod vs;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Errors from rewriting a target file.
#[derive(Error, Debug)]
pub enum WriteError {
    /// The locator/property required by this format was not supplied.
    #[error("no property found")]
    MissingProperty,

    /// The locator was supplied but is malformed.
    #[error("invalid property {property:?}: {reason}")]
    InvalidProperty {
        /// The property as given.
        property: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The target file does not exist.
    #[error("can't find target file: {0}")]
    TargetNotFound(Utf8PathBuf),

    /// The target file could not be read.
    #[error("failed reading {path}: {source}")]
    Read {
        /// Target file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The target file could not be written.
    #[error("failed writing {path}: {source}")]
    Write {
        /// Target file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A line index points past the end of the file.
    #[error("line {index} is out of range ({count} lines)")]
    LineOutOfRange {
        /// Requested 0-based line index.
        index: usize,
        /// Number of lines in the file.
        count: usize,
    },

    /// The target is not valid JSON.
    #[error("failed parsing json: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON document root is not an object.
    #[error("json document is not an object")]
    NotAnObject,

    /// A JSON object lacks the field to update.
    #[error("{0} field not present")]
    MissingField(String),

    /// The target is not well-formed XML.
    #[error("error decoding xml: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The target is readable but its content is not UTF-8.
    #[error("{path} is not valid UTF-8: {source}")]
    Encoding {
        /// Target file path.
        path: Utf8PathBuf,
        /// Where decoding stopped.
        source: std::string::FromUtf8Error,
    },

    /// The XML target could not be opened. Fatal.
    #[error("failed opening {path}: {source}")]
    Open {
        /// Target file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Rewritten XML could not be emitted. Fatal.
    #[error("failed emitting xml: {0}")]
    Emit(#[source] std::io::Error),
}

impl WriteError {
    /// Whether this error must terminate the process with a failure status.
    ///
    /// Everything else is reported and the run completes normally.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Emit(_))
    }
}

/// Result alias for write operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// Substitute `value` for the first `%s` or `%v` placeholder in `template`.
///
/// `%%` renders a literal percent sign. Any other `%` sequence is copied
/// through unchanged, and a template without a placeholder renders as-is.
pub fn format_template(template: &str, value: &str) -> String {
    let mut out = String::with_capacity(template.len() + value.len());
    let mut substituted = false;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some('s' | 'v') if !substituted => {
                chars.next();
                out.push_str(value);
                substituted = true;
            }
            _ => out.push('%'),
        }
    }

    out
}

/// Fail with [`WriteError::MissingProperty`] if `property` is absent or empty.
pub(crate) fn require_property(property: Option<&str>) -> WriteResult<&str> {
    property
        .filter(|p| !p.is_empty())
        .ok_or(WriteError::MissingProperty)
}

/// Fail with [`WriteError::TargetNotFound`] if `path` does not exist.
pub(crate) fn require_target(path: &Utf8Path) -> WriteResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(WriteError::TargetNotFound(path.to_path_buf()))
    }
}

pub(crate) fn read_target(path: &Utf8Path) -> WriteResult<String> {
    std::fs::read_to_string(path).map_err(|source| WriteError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_target(path: &Utf8Path, contents: impl AsRef<[u8]>) -> WriteResult<()> {
    std::fs::write(path, contents).map_err(|source| WriteError::Write {
        path: path.to_path_buf(),
        source,
    })
}
