use crate::cli::{Cli, PathArgs};
use crate::domain::errors::CacheError;
use crate::domain::models::{ClearReport, PathOverrides};
use crate::exit_codes;
use crate::services::codec::decode;
use crate::services::guard::scan_tree;
use crate::services::output::{print_one, print_out};
use crate::services::settings::{build_scanner, load_settings, resolve_layout};
use crate::services::storage::{clear_artifact, Filesystem, LocalFs};

fn cache_only(cache_path: Option<&str>) -> PathOverrides {
    PathOverrides {
        cache_path: cache_path.map(str::to_string),
        ..PathOverrides::default()
    }
}

pub fn handle_clear(cli: &Cli, cache_path: Option<&str>) -> anyhow::Result<i32> {
    let settings = load_settings(&cli.base)?;
    let layout = resolve_layout(&cli.base, &settings, &cache_only(cache_path));
    let removed = clear_artifact(&LocalFs, &layout.cache_path)?;
    let report = ClearReport {
        path: layout.cache_path.display().to_string(),
        removed,
    };
    print_one(cli.json, report, |r| {
        if r.removed {
            "Configuration cache cleared successfully.".to_string()
        } else {
            "No configuration cache to clear.".to_string()
        }
    })?;
    Ok(exit_codes::SUCCESS)
}

/// Advisory only: always exits 0, whatever the scan finds.
pub fn handle_scan(cli: &Cli, paths: &PathArgs, pattern: Option<&str>) -> anyhow::Result<i32> {
    let settings = load_settings(&cli.base)?;
    let layout = resolve_layout(&cli.base, &settings, &PathOverrides::from(paths));
    let scanner = build_scanner(pattern, &settings)?;
    let scan = scan_tree(&LocalFs, &layout.app_dir, &layout.guard_exclude, &scanner)?;

    if cli.json {
        print_one(true, scan, |_| String::new())?;
    } else if scan.is_clean() {
        println!("No env() lookups found in application code.");
    } else {
        let offenders: Vec<_> = scan.offenders.iter().collect();
        print_out(false, &offenders, |p| p.display().to_string())?;
    }
    Ok(exit_codes::SUCCESS)
}

pub fn handle_show(cli: &Cli, cache_path: Option<&str>) -> anyhow::Result<i32> {
    let settings = load_settings(&cli.base)?;
    let layout = resolve_layout(&cli.base, &settings, &cache_only(cache_path));
    let bytes = LocalFs
        .read(&layout.cache_path)?
        .ok_or_else(|| CacheError::ArtifactMissing(layout.cache_path.display().to_string()))?;
    let config = decode(&String::from_utf8(bytes)?)?;

    print_one(cli.json, config, |c| {
        serde_json::to_string_pretty(c).unwrap_or_default()
    })?;
    Ok(exit_codes::SUCCESS)
}
