//! CLI command definitions for envmirror
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::config::Configurator;
use crate::format::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Inspect and validate environment configuration files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the environment file
    #[arg(short, long, global = true, default_value = Configurator::DEFAULT_PATH)]
    pub file: PathBuf,

    /// Do not fall back to the process environment for missing keys
    #[arg(long, global = true)]
    pub no_system_env: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value of a key (exit status 1 when absent)
    Get(GetArgs),

    /// List the keys defined in the environment file
    Keys,

    /// Bind the service configuration and report every field
    Check(CheckArgs),
}

/// Arguments for the get subcommand
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Key to look up (case-insensitive in the file, exact in the environment)
    pub key: String,
}

/// Arguments for the check subcommand
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
