//! Stamp command: load the record, apply bumps, save, rewrite the target.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, error, instrument, warn};

use versetter_core::bump::{self, BumpRequest, Change};
use versetter_core::config::{Config, TargetConfig};
use versetter_core::record::{RecordStore, VersionRecord};
use versetter_core::target::{self, DispatchOutcome};

/// Version bump and rewrite target flags.
#[derive(Args, Debug, Default, Clone)]
pub struct StampArgs {
    /// Increment patch version
    #[arg(short = 'i', long)]
    pub inc: bool,

    /// Increment minor version
    #[arg(short = 'm', long)]
    pub incminor: bool,

    /// Increment major version
    #[arg(short = 'n', long)]
    pub incmajor: bool,

    /// Prerelease label (a single space clears it)
    #[arg(short = 'p', long, value_name = "PRERELEASE")]
    pub pre: Option<String>,

    /// File to set the version into
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<Utf8PathBuf>,

    /// Target environment: npm, vs, iss, gores, go, ino, txt
    #[arg(short = 'e', long, value_name = "ENV")]
    pub env: Option<String>,

    /// Environment-specific property (define name, key paths, template, ...)
    #[arg(short = 'o', long, value_name = "PROPERTY")]
    pub prop: Option<String>,
}

impl StampArgs {
    /// The bump part of the flags.
    pub fn to_request(&self) -> BumpRequest {
        BumpRequest {
            major: self.incmajor,
            minor: self.incminor,
            patch: self.inc,
            prerelease: self.pre.clone(),
        }
    }
}

/// Rewrite target after merging flags over `[target]` config.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedTarget {
    env: String,
    file: Utf8PathBuf,
    property: Option<String>,
}

impl ResolvedTarget {
    /// `None` when no environment was given anywhere.
    fn resolve(args: &StampArgs, defaults: Option<&TargetConfig>) -> Option<Self> {
        let defaults = defaults.cloned().unwrap_or_default();
        let env = args.env.clone().or(defaults.env).filter(|e| !e.is_empty())?;
        Some(Self {
            env,
            file: args.file.clone().or(defaults.file).unwrap_or_default(),
            property: args.prop.clone().or(defaults.property),
        })
    }
}

/// Machine-readable summary of one run.
#[derive(Debug, Serialize)]
struct RunReport {
    record: Utf8PathBuf,
    previous: String,
    current: String,
    changed: bool,
    changes: Vec<Change>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<DispatchOutcome>,
}

/// Prints human status lines unless JSON output was requested.
struct Status {
    json: bool,
}

impl Status {
    fn line(&self, label: &str, value: impl std::fmt::Display) {
        if !self.json {
            println!("{}: {}", label.dimmed(), value);
        }
    }

    fn change(&self, change: &Change) {
        if !self.json {
            println!("  {} {}", "•".cyan(), change);
        }
    }

    fn outcome(&self, outcome: &DispatchOutcome) {
        if self.json {
            return;
        }
        match outcome {
            DispatchOutcome::Rewritten { environment, path } => {
                println!("{} {} {}", "✓".green(), environment.bold(), path.cyan());
            }
            DispatchOutcome::Failed {
                environment,
                path,
                error,
            } => {
                println!(
                    "{} {} {}: {}",
                    "✗".yellow(),
                    environment.bold(),
                    path.cyan(),
                    error.yellow()
                );
            }
            DispatchOutcome::UnknownEnvironment { .. } => {}
        }
    }
}

/// Run the stamp workflow.
///
/// An unreadable record is reported and ends the run successfully. A fatal
/// rewrite error is returned.
///
/// # Arguments
/// * `args` - Bump and target flags
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `version_file` - `--version-file` override
#[instrument(name = "cmd_stamp", skip_all, fields(json_output = global_json))]
pub fn cmd_stamp(
    args: StampArgs,
    global_json: bool,
    config: &Config,
    version_file: Option<&Utf8Path>,
) -> anyhow::Result<()> {
    let record_path = version_file.unwrap_or_else(|| config.version_file());
    let store = RecordStore::new(record_path);
    let status = Status { json: global_json };

    let mut record = match store.load() {
        Ok(record) => record,
        Err(err) => {
            error!(error = %err, "version record not loaded");
            eprintln!("{} {err}", "error:".red().bold());
            return Ok(());
        }
    };
    let previous = record.clone();
    status.line("actual version", previous.bold());

    let request = args.to_request();
    debug!(?request, "applying bump request");
    let outcome = bump::apply(&mut record, &request);
    for change in &outcome.changes {
        status.change(change);
    }
    if outcome.changed()
        && let Err(err) = store.save(&record)
    {
        warn!(error = %err, "version record not saved");
        eprintln!("{} {err}", "warning:".yellow().bold());
    }

    status.line("version for processing", record.green());

    let target = ResolvedTarget::resolve(&args, config.target.as_ref())
        .map(|resolved| rewrite(&resolved, &record))
        .transpose()?;
    if let Some(ref outcome) = target {
        status.outcome(outcome);
    }

    if global_json {
        let report = RunReport {
            record: store.path().to_path_buf(),
            previous: previous.semantic_string(),
            current: record.semantic_string(),
            changed: outcome.changed(),
            changes: outcome.changes,
            target,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn rewrite(resolved: &ResolvedTarget, record: &VersionRecord) -> anyhow::Result<DispatchOutcome> {
    debug!(env = %resolved.env, file = %resolved.file, "dispatching rewrite");
    target::dispatch(
        &resolved.env,
        record,
        resolved.property.as_deref(),
        &resolved.file,
    )
    .with_context(|| format!("failed to rewrite {}", resolved.file))
}
