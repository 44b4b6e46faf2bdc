//! envmirror
//!
//! Command-line front end for inspecting `.env` files and validating the
//! service configuration they feed.

use anyhow::Result;
use clap::Parser;
use envmirror::cli::{CheckArgs, Cli, Command, GetArgs};
use envmirror::config::Configurator;
use envmirror::format::{OutputFormat, format_error_json, format_reports_json, format_reports_text};
use envmirror::service::{ServiceConfig, register_adapters};
use std::fs::OpenOptions;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    debug!("Loading configuration from {}", cli.file.display());
    let configurator =
        Configurator::from_path(&cli.file)?.allow_default_to_system_environment(!cli.no_system_env);

    match cli.command {
        Command::Get(args) => Ok(run_get(&configurator, &args)),
        Command::Keys => {
            for key in configurator.source().keys() {
                println!("{}", key);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check(args) => run_check(&configurator, &args),
    }
}

fn run_get(configurator: &Configurator, args: &GetArgs) -> ExitCode {
    match configurator.get(&args.key) {
        Some(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        None => {
            debug!("{} is not set", args.key);
            ExitCode::FAILURE
        }
    }
}

fn run_check(configurator: &Configurator, args: &CheckArgs) -> Result<ExitCode> {
    register_adapters(configurator.adapters());

    let mut config = ServiceConfig::default();
    let reports = configurator.describe(&mut config)?;

    match configurator.mirror(&mut config) {
        Ok(()) => {
            info!(
                "Configuration OK: {} via {}",
                config.service_name, config.kafka_host
            );
            match args.format {
                OutputFormat::Text => print!("{}", format_reports_text(&reports)),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&format_reports_json(&reports))?)
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!("Configuration invalid: {}", err);
            match args.format {
                OutputFormat::Text => {
                    print!("{}", format_reports_text(&reports));
                    eprintln!("error: {}", err);
                }
                OutputFormat::Json => {
                    let body = serde_json::json!({
                        "fields": format_reports_json(&reports),
                        "error": format_error_json(&err),
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
