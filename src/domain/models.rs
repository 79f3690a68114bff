use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const DEFAULT_APP_DIR: &str = "app";
pub const DEFAULT_CONFIG_DIR: &str = "config";
pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_CACHE_PATH: &str = "bootstrap/cache/config.json";
pub const SETTINGS_FILE: &str = "confcache.toml";

/// Matches `env(` followed later on the same line by `)`.
pub const DEFAULT_GUARD_PATTERN: &str = r"env\(.*\)";

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct JsonErr {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Resolved project paths, each joined onto the base directory.
#[derive(Debug, Clone)]
pub struct Layout {
    pub app_dir: PathBuf,
    pub config_dir: PathBuf,
    pub env_file: PathBuf,
    pub cache_path: PathBuf,
    /// Directories under `app_dir` the guard never reads.
    pub guard_exclude: Vec<PathBuf>,
}

/// `confcache.toml`, every section optional.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub guard: GuardSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PathSettings {
    pub app: Option<String>,
    pub config: Option<String>,
    pub env_file: Option<String>,
    pub cache: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GuardSettings {
    pub pattern: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    #[serde(default)]
    pub strict: bool,
}

/// Overrides taken from the command line; `None` falls back to settings.
#[derive(Debug, Default, Clone)]
pub struct PathOverrides {
    pub app_dir: Option<String>,
    pub config_dir: Option<String>,
    pub env_file: Option<String>,
    pub cache_path: Option<String>,
}

/// Application files whose content matched the guard pattern, relative to
/// the scanned root.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ScanResult {
    pub offenders: BTreeSet<PathBuf>,
}

impl ScanResult {
    pub fn is_clean(&self) -> bool {
        self.offenders.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub path: String,
    pub keys: usize,
    pub bytes: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CacheOutcome {
    Skipped {
        #[serde(flatten)]
        scan: ScanResult,
    },
    Cached { report: CacheReport },
}

#[derive(Serialize)]
pub struct ClearReport {
    pub path: String,
    pub removed: bool,
}
