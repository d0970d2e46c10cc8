//! Library interface for the `versetter` CLI.
//!
//! This crate exposes the CLI's argument parser as a library, primarily for
//! documentation generation and testing. The actual entry point is in
//! `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`commands`] - Command implementations

pub mod commands;

use camino::Utf8PathBuf;
use clap::{CommandFactory, Parser};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }

    /// Whether log lines on stderr should carry ANSI colors.
    pub fn stderr_enabled(self) -> bool {
        match self {
            Self::Auto => std::io::stderr().is_terminal(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENTS:
    npm      package.json \"version\" field
    vs       MSBuild <PropertyGroup><Version>
    iss      Inno Setup #define (--prop: define name)
    gores    go-winres JSON (--prop: key/path,key/path)
    go       Go version JSON (overwrites --file)
    ino      Arduino template (--prop: template, %s = version)
    txt      Text line (--prop: index,template)

ENVIRONMENT VARIABLES:
    RUST_LOG                Log filter (e.g., debug, versetter_core=trace)
    VERSETTER_LOG_PATH      Explicit JSONL log file path
    VERSETTER_LOG_DIR       JSONL log directory
";

/// Command-line interface definition for versetter.
#[derive(Parser)]
#[command(name = "versetter")]
#[command(
    about = "Keep one version record and stamp it into project metadata files",
    long_about = None
)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// Version bump and rewrite target.
    #[command(flatten)]
    pub stamp: commands::stamp::StampArgs,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long)]
    pub chdir: Option<PathBuf>,

    /// Version record location (default: version.yaml)
    #[arg(long, value_name = "FILE")]
    pub version_file: Option<Utf8PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long)]
    pub json: bool,
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}
