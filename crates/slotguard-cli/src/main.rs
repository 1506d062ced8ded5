//! slotguard CLI
//!
//! Command-line interface for the storage layout compatibility gate

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "slotguard")]
#[command(about = "slotguard - Storage layout upgrade safety checks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare a reference snapshot against a head snapshot
    Compare(commands::compare::CompareArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare(args) => commands::compare::execute(args),
    };

    match result {
        Ok(verdict) => std::process::exit(verdict.code()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(commands::compare::Verdict::InputError.code());
        }
    }
}
