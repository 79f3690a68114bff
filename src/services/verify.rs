use crate::domain::errors::CacheError;
use crate::domain::value::{first_difference, ConfigMap};
use crate::services::codec::decode;
use crate::services::storage::Filesystem;
use anyhow::anyhow;
use std::path::Path;
use tracing::{debug, warn};

/// Read the artifact back and require it to decode to `expected`. On any
/// failure the artifact is deleted before the error is returned, so a cache
/// file that survives a run is always loadable.
pub fn verify_artifact(
    fs: &dyn Filesystem,
    path: &Path,
    expected: &ConfigMap,
) -> anyhow::Result<()> {
    let cause = match load_back(fs, path, expected) {
        Ok(()) => {
            debug!(path = %path.display(), "configuration cache verified");
            return Ok(());
        }
        Err(cause) => cause,
    };

    warn!(path = %path.display(), "configuration cache failed verification, removing it");
    fs.delete(path)?;
    Err(CacheError::NotSerializable {
        source: cause.into(),
    }
    .into())
}

fn load_back(fs: &dyn Filesystem, path: &Path, expected: &ConfigMap) -> anyhow::Result<()> {
    let bytes = fs
        .read(path)?
        .ok_or_else(|| anyhow!("artifact {} disappeared after writing", path.display()))?;
    let text = String::from_utf8(bytes)?;
    let actual = decode(&text)?;
    if let Some(key) = first_difference(expected, &actual) {
        anyhow::bail!("value at `{}` does not survive serialization", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::ConfigValue;
    use crate::services::codec::write_artifact;
    use crate::services::storage::LocalFs;
    use tempfile::TempDir;

    #[test]
    fn faithful_artifact_passes_and_stays() {
        let tmp = TempDir::new().expect("temp dir");
        let path = tmp.path().join("config.json");
        let mut config = ConfigMap::new();
        config.insert("name".into(), "demo".into());

        write_artifact(&LocalFs, &path, &config).expect("write");
        verify_artifact(&LocalFs, &path, &config).expect("verify");
        assert!(path.exists());
    }

    #[test]
    fn unfaithful_artifact_is_deleted_and_reported() {
        let tmp = TempDir::new().expect("temp dir");
        let path = tmp.path().join("config.json");
        let mut services = ConfigMap::new();
        services.insert("resolver".into(), ConfigValue::Float(f64::NAN));
        let mut config = ConfigMap::new();
        config.insert("services".into(), ConfigValue::Mapping(services));

        write_artifact(&LocalFs, &path, &config).expect("write");
        let err = verify_artifact(&LocalFs, &path, &config).expect_err("must fail");

        assert!(!path.exists());
        assert!(matches!(
            err.downcast_ref::<CacheError>(),
            Some(CacheError::NotSerializable { .. })
        ));
        assert!(format!("{:#}", err).contains("services.resolver"));
    }

    #[test]
    fn garbage_artifact_is_deleted() {
        let tmp = TempDir::new().expect("temp dir");
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "not json\n").expect("write");

        assert!(verify_artifact(&LocalFs, &path, &ConfigMap::new()).is_err());
        assert!(!path.exists());
    }
}
