use crate::domain::errors::SettingsError;
use crate::domain::models::{
    Layout, PathOverrides, SettingsFile, DEFAULT_APP_DIR, DEFAULT_CACHE_PATH, DEFAULT_CONFIG_DIR,
    DEFAULT_ENV_FILE, DEFAULT_GUARD_PATTERN, SETTINGS_FILE,
};
use crate::services::guard::PatternScanner;
use std::path::Path;

/// `confcache.toml` from the base directory, or defaults when absent.
pub fn load_settings(base: &Path) -> Result<SettingsFile, SettingsError> {
    let path = base.join(SETTINGS_FILE);
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let raw = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| SettingsError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Command-line values first, then the settings file, then defaults.
pub fn resolve_layout(base: &Path, settings: &SettingsFile, overrides: &PathOverrides) -> Layout {
    let pick = |flag: &Option<String>, file: &Option<String>, default: &str| {
        base.join(
            flag.as_deref()
                .or(file.as_deref())
                .unwrap_or(default),
        )
    };

    let app_dir = pick(&overrides.app_dir, &settings.paths.app, DEFAULT_APP_DIR);
    let config_dir = pick(&overrides.config_dir, &settings.paths.config, DEFAULT_CONFIG_DIR);
    let env_file = pick(&overrides.env_file, &settings.paths.env_file, DEFAULT_ENV_FILE);
    let cache_path = pick(&overrides.cache_path, &settings.paths.cache, DEFAULT_CACHE_PATH);

    let mut guard_exclude = vec![config_dir.clone()];
    guard_exclude.extend(settings.guard.exclude.iter().map(|p| base.join(p)));

    Layout {
        app_dir,
        config_dir,
        env_file,
        cache_path,
        guard_exclude,
    }
}

pub fn build_scanner(
    flag: Option<&str>,
    settings: &SettingsFile,
) -> Result<PatternScanner, SettingsError> {
    let pattern = flag
        .or(settings.guard.pattern.as_deref())
        .unwrap_or(DEFAULT_GUARD_PATTERN);
    PatternScanner::new(pattern)
}
