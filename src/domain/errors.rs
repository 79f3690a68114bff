/// Failures of the cache pipeline itself. Bootstrap and filesystem errors
/// from collaborators are not wrapped and propagate as they are.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("configuration is not serializable")]
    NotSerializable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("no configuration cache at {0}")]
    ArtifactMissing(String),
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("invalid guard pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
