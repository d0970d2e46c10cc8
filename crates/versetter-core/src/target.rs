//! Environment selection and dispatch to the format writers.
//!
//! An environment token (`npm`, `vs`, ...) picks the target format. The
//! property string is parsed into the locator shape that format expects, then
//! [`dispatch`] hands the record to the matching writer.
//!
//! Unknown environment tokens are a silent no-op. Writer failures are
//! reported in the returned [`DispatchOutcome`]; only fatal failures (see
//! [`WriteError::is_fatal`]) come back as `Err`.

use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Serialize, Serializer};
use tracing::{debug, info, instrument, warn};

use crate::record::VersionRecord;
use crate::writers::gores::KeyPath;
use crate::writers::text::LineLocator;
use crate::writers::{self, WriteError, WriteResult};

/// Target file format, selected by environment token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Inno Setup script `#define`.
    Iss,
    /// `package.json` `version` field.
    Npm,
    /// MSBuild `PropertyGroup/Version`.
    Vs,
    /// `go-winres` JSON key paths.
    Gores,
    /// Go version JSON blob.
    Go,
    /// Arduino template overwrite.
    Ino,
    /// Plain text line.
    Txt,
}

impl Environment {
    /// All environments, in token-match order.
    pub const ALL: &[Self] = &[
        Self::Iss,
        Self::Npm,
        Self::Vs,
        Self::Gores,
        Self::Go,
        Self::Ino,
        Self::Txt,
    ];

    /// The command-line token for this environment.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Iss => "iss",
            Self::Npm => "npm",
            Self::Vs => "vs",
            Self::Gores => "gores",
            Self::Go => "go",
            Self::Ino => "ino",
            Self::Txt => "txt",
        }
    }

    /// Whether the writer needs a property string.
    pub const fn needs_property(self) -> bool {
        matches!(self, Self::Iss | Self::Gores | Self::Ino | Self::Txt)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error for an unrecognized environment token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEnvironment(pub String);

impl fmt::Display for UnknownEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown environment: {}", self.0)
    }
}

impl std::error::Error for UnknownEnvironment {}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|env| env.token() == s)
            .ok_or_else(|| UnknownEnvironment(s.to_owned()))
    }
}

/// Where inside the target the version belongs, per format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// `txt`: line index and template.
    Line(LineLocator),
    /// `ino`: whole-file template.
    Template(String),
    /// `go`: fixed shape.
    GoBlob,
    /// `gores`: list of key paths.
    KeyPaths(Vec<KeyPath>),
    /// `vs`: `PropertyGroup/Version`.
    PropertyGroupVersion,
    /// `npm`: top-level `version`.
    VersionField,
    /// `iss`: `#define` name.
    Define(String),
}

impl Locator {
    /// Parse `property` into the locator shape `environment` expects.
    ///
    /// # Errors
    ///
    /// Fails with [`WriteError::MissingProperty`] if the format needs a
    /// property and none (or an empty one) was given, or with
    /// [`WriteError::InvalidProperty`] if it is malformed.
    pub fn parse(environment: Environment, property: Option<&str>) -> WriteResult<Self> {
        let property = || writers::require_property(property);
        Ok(match environment {
            Environment::Txt => Self::Line(LineLocator::parse(property()?)?),
            Environment::Ino => Self::Template(property()?.to_owned()),
            Environment::Go => Self::GoBlob,
            Environment::Gores => Self::KeyPaths(writers::gores::parse_paths(property()?)),
            Environment::Vs => Self::PropertyGroupVersion,
            Environment::Npm => Self::VersionField,
            Environment::Iss => Self::Define(property()?.to_owned()),
        })
    }
}

/// A fully resolved rewrite request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteTarget {
    /// Target format.
    pub environment: Environment,
    /// File to rewrite.
    pub path: Utf8PathBuf,
    /// Location of the version inside the file.
    pub locator: Locator,
}

impl RewriteTarget {
    /// Rewrite the target file with `record`.
    ///
    /// # Errors
    ///
    /// Returns whatever the format writer reports.
    #[instrument(skip_all, fields(environment = %self.environment, path = %self.path))]
    pub fn apply(&self, record: &VersionRecord) -> WriteResult<()> {
        let path = self.path.as_path();
        match &self.locator {
            Locator::Line(line) => writers::text::write(record, line, path),
            Locator::Template(template) => writers::ino::write(record, template, path),
            Locator::GoBlob => writers::go::write(record, path),
            Locator::KeyPaths(paths) => writers::gores::write(record, paths, path),
            Locator::PropertyGroupVersion => writers::vs::write(record, path),
            Locator::VersionField => writers::npm::write(record, path),
            Locator::Define(name) => writers::iss::write(record, name, path),
        }
    }
}

/// Result of a dispatch that did not hit a fatal error.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum DispatchOutcome {
    /// The token did not name a known environment; nothing was done.
    UnknownEnvironment {
        /// The token as given.
        token: String,
    },
    /// The target file was rewritten.
    Rewritten {
        /// Target format.
        environment: Environment,
        /// Rewritten file.
        path: Utf8PathBuf,
    },
    /// The writer reported an error; the target was left as it was.
    Failed {
        /// Target format.
        environment: Environment,
        /// Target file.
        path: Utf8PathBuf,
        /// What went wrong.
        #[serde(serialize_with = "display")]
        error: WriteError,
    },
}

fn display<S: Serializer>(error: &WriteError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Select the writer for `token` and rewrite `path` with `record`.
///
/// # Errors
///
/// Only fatal writer errors are returned; the caller should end the process
/// with a failure status. Everything else is folded into the outcome.
#[instrument(skip(record), fields(version = %record))]
pub fn dispatch(
    token: &str,
    record: &VersionRecord,
    property: Option<&str>,
    path: &Utf8Path,
) -> Result<DispatchOutcome, WriteError> {
    let Ok(environment) = token.parse::<Environment>() else {
        debug!(token, "unknown environment, nothing to do");
        return Ok(DispatchOutcome::UnknownEnvironment {
            token: token.to_owned(),
        });
    };

    info!(%environment, "changing {environment} version");
    let result = Locator::parse(environment, property).and_then(|locator| {
        RewriteTarget {
            environment,
            path: path.to_path_buf(),
            locator,
        }
        .apply(record)
    });

    match result {
        Ok(()) => Ok(DispatchOutcome::Rewritten {
            environment,
            path: path.to_path_buf(),
        }),
        Err(error) if error.is_fatal() => Err(error),
        Err(error) => {
            warn!(%environment, error = %error, "target not updated");
            Ok(DispatchOutcome::Failed {
                environment,
                path: path.to_path_buf(),
                error,
            })
        }
    }
}
