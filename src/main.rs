use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod domain;
mod exit_codes;
mod services;

use cli::Cli;
use domain::errors::{CacheError, SettingsError};
use services::output::print_error;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match commands::dispatch(&cli) {
        Ok(code) => code,
        Err(e) => {
            let (code, exit) = classify(&e);
            print_error(cli.json, code, &format!("{:#}", e));
            exit
        }
    };
    std::process::exit(code);
}

/// `RUST_LOG` wins; otherwise `-v` flags pick the level. Logs go to stderr.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn classify(e: &anyhow::Error) -> (&'static str, i32) {
    if let Some(err) = e.downcast_ref::<CacheError>() {
        return match err {
            CacheError::NotSerializable { .. } => ("CONFIG_NOT_SERIALIZABLE", exit_codes::FAILURE),
            CacheError::ArtifactMissing(_) => ("ARTIFACT_MISSING", exit_codes::FAILURE),
        };
    }
    if e.downcast_ref::<SettingsError>().is_some() {
        return ("INVALID_SETTINGS", exit_codes::INVALID_SETTINGS);
    }
    ("INTERNAL_ERROR", exit_codes::FAILURE)
}
