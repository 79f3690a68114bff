use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem primitives the pipeline needs. `LocalFs` is the real one;
/// tests swap in wrappers to simulate corrupt or partial writes.
pub trait Filesystem {
    /// Write `contents` to `path`, creating parent directories and
    /// replacing anything already there.
    fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()>;

    /// Remove `path`. Returns `false` when there was nothing to remove.
    fn delete(&self, path: &Path) -> anyhow::Result<bool>;

    /// `Ok(None)` when `path` does not exist.
    fn read(&self, path: &Path) -> anyhow::Result<Option<Vec<u8>>>;

    /// Every regular file under `dir`, recursively, in sorted order.
    fn all_files(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>>;

    fn is_dir(&self, path: &Path) -> bool;
}

pub struct LocalFs;

impl Filesystem for LocalFs {
    fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        std::fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    fn delete(&self, path: &Path) -> anyhow::Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("delete {}", path.display())),
        }
    }

    fn read(&self, path: &Path) -> anyhow::Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    fn all_files(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        collect_files(dir, &mut out)?;
        out.sort();
        Ok(out)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("list directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// Remove a previously written cache artifact, if any.
pub fn clear_artifact(fs: &dyn Filesystem, cache_path: &Path) -> anyhow::Result<bool> {
    let removed = fs.delete(cache_path)?;
    debug!(path = %cache_path.display(), removed, "cleared configuration cache");
    Ok(removed)
}
