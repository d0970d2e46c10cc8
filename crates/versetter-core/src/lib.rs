//! Core library for versetter.
//!
//! versetter keeps a project's version in one small YAML record and stamps
//! it into the metadata files other toolchains read (`package.json`, MSBuild
//! projects, Inno Setup scripts, ...).
//!
//! # Modules
//!
//! - [`record`] - The version record and its YAML store
//! - [`bump`] - Increment and prerelease rules
//! - [`writers`] - One rewriter per target format
//! - [`target`] - Environment selection and dispatch
//! - [`config`] - Configuration loading and management
//! - [`error`] - Configuration error types
//!
//! # Quick Start
//!
//! ```no_run
//! use camino::Utf8Path;
//! use versetter_core::{BumpRequest, RecordStore, bump, target};
//!
//! let store = RecordStore::new("version.yaml");
//! let mut record = store.load().expect("record is readable");
//! let outcome = bump::apply(&mut record, &BumpRequest { patch: true, ..Default::default() });
//! if outcome.changed() {
//!     store.save(&record).expect("record is writable");
//! }
//! target::dispatch("npm", &record, None, Utf8Path::new("package.json"))
//!     .expect("no fatal rewrite error");
//! ```
#![deny(unsafe_code)]

pub mod bump;

pub mod config;

pub mod error;

pub mod record;

pub mod target;

pub mod writers;

pub use bump::{BumpOutcome, BumpRequest, Change};

pub use config::{Config, ConfigLoader, LogLevel, TargetConfig};

pub use error::{ConfigError, ConfigResult};

pub use record::{RecordError, RecordResult, RecordStore, VersionRecord};

pub use target::{DispatchOutcome, Environment};

pub use writers::{WriteError, WriteResult};
