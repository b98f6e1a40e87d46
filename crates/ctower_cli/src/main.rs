//! ctower CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Template error
//! - 5: Composition error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;

use commands::{Cli, Commands};
use ctower_iaas::IaasError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const COMPOSE_ERROR: u8 = 5;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Manifest(args) => commands::manifest::execute(args),
        Commands::CloudConfig(args) => commands::cloud_config::execute(args),
        Commands::StemcellUrl(args) => commands::stemcell_url::execute(args),
        Commands::Assemble(args) => commands::assemble::execute(args),
        Commands::ValidateOutputs(args) => commands::validate_outputs::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Log to stderr so documents written to stdout stay clean.
fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "ctower=debug,warn"
    } else if quiet {
        "warn"
    } else {
        "ctower=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<IaasError>() {
        Some(IaasError::Metadata(_)) | Some(IaasError::MissingSettings { .. }) => {
            ExitCodes::VALIDATION_FAILURE
        }
        Some(IaasError::InvalidValue { .. }) => ExitCodes::VALIDATION_FAILURE,
        Some(IaasError::Template(_)) => ExitCodes::TEMPLATE_ERROR,
        Some(IaasError::Compose(_)) | Some(IaasError::StemcellVersionNotFound { .. }) => {
            ExitCodes::COMPOSE_ERROR
        }
        Some(IaasError::UnknownIaas(_)) | Some(IaasError::Settings { .. }) => {
            ExitCodes::INVALID_ARGS
        }
        _ if e.downcast_ref::<ctower_metadata::MetadataError>().is_some() => {
            ExitCodes::VALIDATION_FAILURE
        }
        _ => ExitCodes::GENERAL_ERROR,
    }
}
