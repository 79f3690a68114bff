//! Cache artifact codec.
//!
//! The artifact is one JSON document holding the whole mapping, followed by
//! a single newline. Keys keep their insertion order, so equal input
//! mappings encode to identical bytes.

use crate::domain::value::{ConfigMap, ConfigValue};
use crate::services::storage::Filesystem;
use anyhow::Context;
use std::path::Path;

/// Never rejects a value. Non-finite floats still produce text (`null`);
/// verification is what notices they do not come back.
pub fn encode(config: &ConfigMap) -> anyhow::Result<String> {
    let mut text = serde_json::to_string_pretty(config).context("encode configuration")?;
    text.push('\n');
    Ok(text)
}

pub fn decode(text: &str) -> anyhow::Result<ConfigMap> {
    let body = text
        .strip_suffix('\n')
        .context("artifact is missing its trailing newline")?;
    match serde_json::from_str::<ConfigValue>(body).context("artifact is not valid JSON")? {
        ConfigValue::Mapping(m) => Ok(m),
        other => anyhow::bail!("artifact root is a {}, expected a mapping", other.kind()),
    }
}

/// Encode `config` and write it as the sole content of `path`. Returns the
/// text that was written.
pub fn write_artifact(
    fs: &dyn Filesystem,
    path: &Path,
    config: &ConfigMap,
) -> anyhow::Result<String> {
    let text = encode(config)?;
    fs.write(path, text.as_bytes())?;
    Ok(text)
}
