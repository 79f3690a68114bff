//! Static guard against dynamic environment lookups in application code.
//!
//! Once configuration is cached, env files are no longer loaded at runtime,
//! so an `env(...)` call outside the config directory silently returns
//! nothing. The check is a text heuristic, not a parser: it flags matches
//! inside comments and strings and misses lookups spelled any other way.

use crate::domain::errors::SettingsError;
use crate::domain::models::ScanResult;
use crate::services::storage::Filesystem;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub trait RiskScanner {
    fn name(&self) -> &str;
    fn is_risky(&self, content: &str) -> bool;
}

/// Flags content containing any match of a regular expression.
pub struct PatternScanner {
    pattern: Regex,
}

impl PatternScanner {
    pub fn new(pattern: &str) -> Result<Self, SettingsError> {
        let pattern = Regex::new(pattern).map_err(|source| SettingsError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern })
    }
}

impl RiskScanner for PatternScanner {
    fn name(&self) -> &str {
        self.pattern.as_str()
    }

    fn is_risky(&self, content: &str) -> bool {
        self.pattern.is_match(content)
    }
}

/// Scan every file under `root`, skipping anything inside `excluded`.
/// Unreadable, non-UTF-8 and empty files are skipped. A missing `root`
/// has nothing to guard and yields an empty result.
pub fn scan_tree(
    fs: &dyn Filesystem,
    root: &Path,
    excluded: &[PathBuf],
    scanner: &dyn RiskScanner,
) -> anyhow::Result<ScanResult> {
    let mut result = ScanResult::default();
    if !fs.is_dir(root) {
        debug!(root = %root.display(), "guard root missing, nothing to scan");
        return Ok(result);
    }

    for file in fs.all_files(root)? {
        if excluded.iter().any(|ex| file.starts_with(ex)) {
            continue;
        }
        let content = match fs.read(&file) {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => continue,
            },
            Ok(None) => continue,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        if content.is_empty() || !scanner.is_risky(&content) {
            continue;
        }
        let rel = file.strip_prefix(root).unwrap_or(&file).to_path_buf();
        result.offenders.insert(rel);
    }

    debug!(
        scanner = scanner.name(),
        offenders = result.offenders.len(),
        "guard scan finished"
    );
    Ok(result)
}

/// Console lines explaining a non-empty scan result.
pub fn guard_warning_lines(scan: &ScanResult) -> Vec<String> {
    let mut lines = vec!["env() exists in:".to_string(), String::new()];
    lines.extend(scan.offenders.iter().map(|p| p.display().to_string()));
    lines.push(String::new());
    lines.push(
        "Please remove your env() calls outside of the config directory if you want to use config caching"
            .to_string(),
    );
    lines
}
