//! Compare command
//!
//! Usage: slotguard compare --ref <FILE> --head <FILE> [--format text|json]

use clap::{Args, ValueEnum};
use slotguard_core::errors::{ExError, ExErrorKind};
use slotguard_core::logging_facility::{init, Profile};
use slotguard_engine::{compare_snapshot_files, load_config, EngineConfig};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Reference (currently deployed) snapshot
    #[arg(long = "ref", value_name = "FILE")]
    pub reference: PathBuf,

    /// Head (proposed) snapshot
    #[arg(long, value_name = "FILE")]
    pub head: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,

    /// Fail when a unit of the reference snapshot is missing from head
    #[arg(long)]
    pub fail_on_removed_unit: bool,

    /// Fail when head contains a unit the reference snapshot does not
    #[arg(long)]
    pub fail_on_added_unit: bool,

    /// Use the slots declared in the snapshots instead of recomputing them
    #[arg(long)]
    pub honor_declared_slots: bool,

    /// Emit operation logs on stderr
    #[arg(long, value_enum, value_name = "PROFILE")]
    pub log: Option<LogProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogProfile {
    Development,
    Production,
}

/// Outcome of a run, mapped to the process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// An unsafe finding or a unit policy rejection
    Fail,
    /// Malformed input: a file or unit could not be read
    InputError,
}

impl Verdict {
    pub fn code(&self) -> i32 {
        match self {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
            Verdict::InputError => 2,
        }
    }
}

/// Execute compare command
pub fn execute(args: CompareArgs) -> Result<Verdict, ExError> {
    if let Some(profile) = args.log {
        init(match profile {
            LogProfile::Development => Profile::Development,
            LogProfile::Production => Profile::Production,
        });
    }

    let config = effective_config(&args)?;
    let report = compare_snapshot_files(&args.reference, &args.head, &config)?;

    match args.format {
        OutputFormat::Text => print!("{}", report.to_text(&config)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report.to_json(&config)?).map_err(|e| {
                ExError::new(ExErrorKind::Serialization)
                    .with_op("compare")
                    .with_message(e.to_string())
            })?;
            println!("{}", json);
        }
    }

    if report.has_input_errors() {
        for (unit, err) in report.failures() {
            eprintln!("Error in {}: {}", unit, err);
        }
        return Ok(Verdict::InputError);
    }

    if report.passes(&config) {
        Ok(Verdict::Pass)
    } else {
        Ok(Verdict::Fail)
    }
}

/// Config file values with command-line flags applied on top
fn effective_config(args: &CompareArgs) -> Result<EngineConfig, ExError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    config.check.strict_warnings |= args.strict;
    config.units.fail_on_removed |= args.fail_on_removed_unit;
    config.units.fail_on_added |= args.fail_on_added_unit;
    config.snapshot.honor_declared_slots |= args.honor_declared_slots;

    Ok(config)
}
