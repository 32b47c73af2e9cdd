use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare a Terraform state file against a live snapshot
    Scan(ScanArgs),
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Path to the Terraform state document (JSON)
    #[arg(long, env = "DRIFTWATCH_STATE")]
    pub state: PathBuf,

    /// Path to the live snapshot document (JSON)
    #[arg(long, env = "DRIFTWATCH_SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Optional engine configuration file (JSON)
    #[arg(long, env = "DRIFTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
}
