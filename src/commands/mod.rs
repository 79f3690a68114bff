//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `cache.rs`: the `cache` command (full pipeline).
//! - `maintenance.rs`: `clear`, `scan` and `show`.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate business logic to `services/*`.
//! - Return the process exit code; errors bubble up to `main`.

pub mod cache;
pub mod maintenance;

use crate::cli::{Cli, Commands};

pub fn dispatch(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Cache {
            paths,
            pattern,
            strict,
        } => cache::handle_cache(cli, paths, pattern.as_deref(), *strict),
        Commands::Clear { cache_path } => maintenance::handle_clear(cli, cache_path.as_deref()),
        Commands::Scan { paths, pattern } => {
            maintenance::handle_scan(cli, paths, pattern.as_deref())
        }
        Commands::Show { cache_path } => maintenance::handle_show(cli, cache_path.as_deref()),
    }
}
