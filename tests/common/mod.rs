#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated application tree: `app/`, `config/` and an optional `.env`.
pub struct TestEnv {
    _tmp: TempDir,
    pub base: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let base = tmp.path().join("project");
        fs::create_dir_all(base.join("app")).expect("create app dir");
        fs::create_dir_all(base.join("config")).expect("create config dir");
        Self { _tmp: tmp, base }
    }

    pub fn write(&self, rel: &str, body: &str) -> &Self {
        let path = self.base.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, body).expect("write fixture file");
        self
    }

    pub fn cache_path(&self) -> PathBuf {
        self.base.join("bootstrap/cache/config.json")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("confcache");
        cmd.env("CONFCACHE_BASE", &self.base).env_remove("RUST_LOG");
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn read_cache(&self) -> Value {
        read_json(&self.cache_path())
    }
}

pub fn read_json(path: &Path) -> Value {
    let raw = fs::read_to_string(path).expect("read artifact");
    assert!(raw.ends_with('\n'), "artifact must end with a newline");
    serde_json::from_str(&raw).expect("artifact is json")
}
