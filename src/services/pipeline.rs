//! Cache build state machine:
//! `clear → guard → (skip | build → serialize → verify → (cached | rollback))`.
//!
//! Every transition runs once; nothing is retried.

use crate::domain::models::{CacheOutcome, CacheReport, Layout};
use crate::services::bootstrap::Kernel;
use crate::services::codec::write_artifact;
use crate::services::guard::{scan_tree, RiskScanner};
use crate::services::storage::{clear_artifact, Filesystem};
use crate::services::verify::verify_artifact;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

pub struct CachePipeline<'a> {
    pub layout: &'a Layout,
    pub fs: &'a dyn Filesystem,
    pub scanner: &'a dyn RiskScanner,
    pub kernel: Kernel,
}

impl<'a> CachePipeline<'a> {
    pub fn new(layout: &'a Layout, fs: &'a dyn Filesystem, scanner: &'a dyn RiskScanner) -> Self {
        Self {
            layout,
            fs,
            scanner,
            kernel: Kernel::for_layout(layout),
        }
    }

    pub fn run(&self) -> anyhow::Result<CacheOutcome> {
        let layout = self.layout;
        clear_artifact(self.fs, &layout.cache_path)?;

        let scan = scan_tree(self.fs, &layout.app_dir, &layout.guard_exclude, self.scanner)?;
        if !scan.is_clean() {
            info!(
                offenders = scan.offenders.len(),
                "env lookups found in application code, cache not built"
            );
            return Ok(CacheOutcome::Skipped { scan });
        }

        debug!("guard clean, bootstrapping fresh configuration");
        let config = self.kernel.bootstrap()?;

        let text = write_artifact(self.fs, &layout.cache_path, &config)?;
        debug!(path = %layout.cache_path.display(), bytes = text.len(), "configuration cache written");

        verify_artifact(self.fs, &layout.cache_path, &config)?;

        let report = CacheReport {
            path: layout.cache_path.display().to_string(),
            keys: config.len(),
            bytes: text.len(),
            sha256: hex::encode(Sha256::digest(text.as_bytes())),
        };
        info!(path = %report.path, keys = report.keys, "configuration cached");
        Ok(CacheOutcome::Cached { report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::CacheError;
    use crate::domain::models::{PathOverrides, SettingsFile, DEFAULT_GUARD_PATTERN};
    use crate::domain::value::{ConfigMap, ConfigValue};
    use crate::services::codec::decode;
    use crate::services::guard::PatternScanner;
    use crate::services::settings::resolve_layout;
    use crate::services::sources::StaticSource;
    use crate::services::storage::LocalFs;
    use std::cell::Cell;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Drops the last bytes of every write, like an interrupted flush.
    struct TruncatingFs;

    impl Filesystem for TruncatingFs {
        fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
            LocalFs.write(path, &contents[..contents.len() / 2])
        }
        fn delete(&self, path: &Path) -> anyhow::Result<bool> {
            LocalFs.delete(path)
        }
        fn read(&self, path: &Path) -> anyhow::Result<Option<Vec<u8>>> {
            LocalFs.read(path)
        }
        fn all_files(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
            LocalFs.all_files(dir)
        }
        fn is_dir(&self, path: &Path) -> bool {
            LocalFs.is_dir(path)
        }
    }

    /// Counts artifact reads to prove verification never ran.
    struct CountingFs {
        reads: Cell<usize>,
        writes: Cell<usize>,
    }

    impl Filesystem for CountingFs {
        fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
            self.writes.set(self.writes.get() + 1);
            LocalFs.write(path, contents)
        }
        fn delete(&self, path: &Path) -> anyhow::Result<bool> {
            LocalFs.delete(path)
        }
        fn read(&self, path: &Path) -> anyhow::Result<Option<Vec<u8>>> {
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                self.reads.set(self.reads.get() + 1);
            }
            LocalFs.read(path)
        }
        fn all_files(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
            LocalFs.all_files(dir)
        }
        fn is_dir(&self, path: &Path) -> bool {
            LocalFs.is_dir(path)
        }
    }

    fn project(app_files: &[(&str, &str)], config_files: &[(&str, &str)]) -> (TempDir, Layout) {
        let tmp = TempDir::new().expect("temp dir");
        let base = tmp.path();
        std::fs::create_dir_all(base.join("app")).expect("mkdir app");
        std::fs::create_dir_all(base.join("config")).expect("mkdir config");
        for (name, body) in app_files {
            std::fs::write(base.join("app").join(name), body).expect("write app file");
        }
        for (name, body) in config_files {
            std::fs::write(base.join("config").join(name), body).expect("write config file");
        }
        let layout = resolve_layout(base, &SettingsFile::default(), &PathOverrides::default());
        (tmp, layout)
    }

    fn scanner() -> PatternScanner {
        PatternScanner::new(DEFAULT_GUARD_PATTERN).expect("scanner")
    }

    fn read_back(layout: &Layout) -> ConfigMap {
        let text = std::fs::read_to_string(&layout.cache_path).expect("artifact exists");
        decode(&text).expect("artifact decodes")
    }

    #[test]
    fn clean_project_is_cached_and_reloads_equal() {
        let (_tmp, layout) = project(
            &[("Controller.src", "render(view)\n")],
            &[("app.toml", "name = \"demo\"\n")],
        );
        let scanner = scanner();
        let pipeline = CachePipeline::new(&layout, &LocalFs, &scanner);

        let outcome = pipeline.run().expect("pipeline");
        let CacheOutcome::Cached { report } = outcome else {
            panic!("expected cached outcome");
        };
        assert_eq!(report.keys, 1);
        assert_eq!(report.sha256.len(), 64);

        let expected = pipeline.kernel.bootstrap().expect("bootstrap");
        assert_eq!(read_back(&layout), expected);
        assert_eq!(
            read_back(&layout)["app"].as_mapping().expect("app")["name"],
            ConfigValue::from("demo")
        );
    }

    #[test]
    fn guard_hit_skips_build_and_never_verifies() {
        let (_tmp, layout) = project(
            &[("Service.src", "key = env(\"X\")\n")],
            &[("app.toml", "name = \"demo\"\n")],
        );
        let fs = CountingFs {
            reads: Cell::new(0),
            writes: Cell::new(0),
        };
        let scanner = scanner();

        let outcome = CachePipeline::new(&layout, &fs, &scanner)
            .run()
            .expect("pipeline");

        let CacheOutcome::Skipped { scan } = outcome else {
            panic!("expected skipped outcome");
        };
        assert!(scan.offenders.contains(Path::new("Service.src")));
        assert!(!layout.cache_path.exists());
        assert_eq!(fs.writes.get(), 0);
        assert_eq!(fs.reads.get(), 0);
    }

    #[test]
    fn stale_artifact_is_removed_even_when_guard_skips() {
        let (_tmp, layout) = project(&[("Service.src", "env(\"X\")")], &[]);
        LocalFs
            .write(&layout.cache_path, b"{\"stale\": true}\n")
            .expect("seed stale cache");
        let scanner = scanner();

        CachePipeline::new(&layout, &LocalFs, &scanner)
            .run()
            .expect("pipeline");
        assert!(!layout.cache_path.exists());
    }

    #[test]
    fn env_lookups_in_config_dir_do_not_trip_the_guard() {
        let (_tmp, layout) = project(&[], &[("app.toml", "# env(\"APP_NAME\")\nname = \"${APP_NAME:-demo}\"\n")]);
        let scanner = scanner();

        let outcome = CachePipeline::new(&layout, &LocalFs, &scanner)
            .run()
            .expect("pipeline");
        assert!(matches!(outcome, CacheOutcome::Cached { .. }));
    }

    #[test]
    fn corrupted_write_rolls_back_and_raises() {
        let (_tmp, layout) = project(&[], &[("app.toml", "name = \"demo\"\n")]);
        let scanner = scanner();

        let err = CachePipeline::new(&layout, &TruncatingFs, &scanner)
            .run()
            .expect_err("verification must fail");

        assert!(!layout.cache_path.exists());
        assert!(matches!(
            err.downcast_ref::<CacheError>(),
            Some(CacheError::NotSerializable { .. })
        ));
        assert!(err.to_string().contains("not serializable"));
    }

    #[test]
    fn unrepresentable_value_from_a_source_rolls_back() {
        let (_tmp, layout) = project(&[], &[]);
        let mut values = ConfigMap::new();
        values.insert("queue".into(), ConfigValue::Float(f64::NEG_INFINITY));
        let scanner = scanner();
        let mut pipeline = CachePipeline::new(&layout, &LocalFs, &scanner);
        pipeline.kernel = Kernel::for_layout(&layout).with_source(Box::new(StaticSource {
            name: "runtime".into(),
            values,
        }));

        assert!(pipeline.run().is_err());
        assert!(!layout.cache_path.exists());
    }

    #[test]
    fn rebuild_without_changes_yields_equal_artifacts() {
        let (_tmp, layout) = project(
            &[],
            &[
                ("app.toml", "name = \"demo\"\n[locale]\ndefault = \"en\"\nfallback = [\"en\", \"nl\"]\n"),
                ("database.json", "{\"port\": 5432, \"ratio\": 0.5}"),
            ],
        );
        let scanner = scanner();
        let pipeline = CachePipeline::new(&layout, &LocalFs, &scanner);

        pipeline.run().expect("first run");
        let first = std::fs::read_to_string(&layout.cache_path).expect("first artifact");
        pipeline.run().expect("second run");
        let second = std::fs::read_to_string(&layout.cache_path).expect("second artifact");

        assert_eq!(decode(&first).expect("decode"), decode(&second).expect("decode"));
        assert_eq!(first, second);
    }

    #[test]
    fn empty_configuration_caches_an_empty_mapping() {
        let (_tmp, layout) = project(&[], &[]);
        let scanner = scanner();

        CachePipeline::new(&layout, &LocalFs, &scanner)
            .run()
            .expect("pipeline");
        assert!(read_back(&layout).is_empty());
        assert_eq!(
            std::fs::read_to_string(&layout.cache_path).expect("artifact"),
            "{}\n"
        );
    }
}
