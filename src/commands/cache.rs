use crate::cli::{Cli, PathArgs};
use crate::domain::models::{CacheOutcome, JsonOut, PathOverrides};
use crate::exit_codes;
use crate::services::guard::guard_warning_lines;
use crate::services::output::warn_lines;
use crate::services::pipeline::CachePipeline;
use crate::services::settings::{build_scanner, load_settings, resolve_layout};
use crate::services::storage::LocalFs;

pub fn handle_cache(
    cli: &Cli,
    paths: &PathArgs,
    pattern: Option<&str>,
    strict: bool,
) -> anyhow::Result<i32> {
    let settings = load_settings(&cli.base)?;
    let layout = resolve_layout(&cli.base, &settings, &PathOverrides::from(paths));
    let scanner = build_scanner(pattern, &settings)?;
    let strict = strict || settings.cache.strict;

    let outcome = CachePipeline::new(&layout, &LocalFs, &scanner).run()?;

    let code = match &outcome {
        CacheOutcome::Skipped { .. } if strict => exit_codes::GUARD_SKIPPED,
        _ => exit_codes::SUCCESS,
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut {
                ok: true,
                data: &outcome
            })?
        );
        return Ok(code);
    }

    match &outcome {
        CacheOutcome::Skipped { scan } => warn_lines(&guard_warning_lines(scan)),
        CacheOutcome::Cached { .. } => println!("Configuration cached successfully."),
    }
    Ok(code)
}
