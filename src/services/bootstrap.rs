//! Fresh configuration snapshots.
//!
//! A snapshot must describe what the application sees on a clean boot, so
//! every build starts from a new [`BootstrapContext`] and never consults a
//! cache artifact that may already be on disk.

use crate::domain::models::Layout;
use crate::domain::value::{deep_merge, ConfigMap};
use crate::services::sources::{parse_env_file, ConfigDirSource, ConfigSource};
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Everything a source may read while loading. Owned by one build.
#[derive(Debug, Clone)]
pub struct BootstrapContext {
    pub config_path: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl BootstrapContext {
    /// Env file values merged under the current process environment;
    /// process variables win. Variables that are not valid UTF-8 are
    /// skipped.
    pub fn fresh(layout: &Layout) -> anyhow::Result<Self> {
        let mut env = if layout.env_file.is_file() {
            let raw = std::fs::read_to_string(&layout.env_file)
                .with_context(|| format!("read env file {}", layout.env_file.display()))?;
            parse_env_file(&raw)
        } else {
            BTreeMap::new()
        };
        env.extend(process_env());

        Ok(Self {
            config_path: layout.config_dir.clone(),
            env,
        })
    }
}

fn process_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                let name = key.unwrap_or_else(|k| k.to_string_lossy().into_owned());
                warn!(variable = %name, "skipping environment variable that is not valid UTF-8");
                None
            }
        })
        .collect()
}

/// Load every source against `ctx` and deep-merge the results in order.
pub fn resolve_configuration(
    ctx: &BootstrapContext,
    sources: &[Box<dyn ConfigSource>],
) -> anyhow::Result<ConfigMap> {
    let mut merged = ConfigMap::new();
    for source in sources {
        let loaded = source
            .load(ctx)
            .with_context(|| format!("load configuration source `{}`", source.name()))?;
        debug!(source = source.name(), keys = loaded.len(), "configuration source loaded");
        deep_merge(&mut merged, loaded);
    }
    Ok(merged)
}

/// Ordered set of configuration sources for one application layout.
pub struct Kernel {
    layout: Layout,
    sources: Vec<Box<dyn ConfigSource>>,
}

impl Kernel {
    pub fn for_layout(layout: &Layout) -> Self {
        Self {
            layout: layout.clone(),
            sources: vec![Box::new(ConfigDirSource)],
        }
    }

    #[cfg(test)]
    pub fn with_source(mut self, source: Box<dyn ConfigSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Build a new context and resolve the full mapping from it.
    pub fn bootstrap(&self) -> anyhow::Result<ConfigMap> {
        let ctx = BootstrapContext::fresh(&self.layout)?;
        resolve_configuration(&ctx, &self.sources)
    }
}
