use crate::domain::value::{deep_merge, ConfigMap, ConfigValue};
use crate::services::bootstrap::BootstrapContext;
use anyhow::Context;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

/// One contributor to the merged configuration. Sources are loaded in
/// registration order; later sources override earlier ones key by key.
pub trait ConfigSource {
    fn name(&self) -> &str;
    fn load(&self, ctx: &BootstrapContext) -> anyhow::Result<ConfigMap>;
}

/// Reads every `*.toml` and `*.json` file under the context's config
/// directory. Each file becomes a top-level key named after its stem;
/// files in subdirectories get dotted keys (`services/mail.toml` is
/// `services.mail`). Files sharing a key are deep-merged in path order,
/// so `app.toml` overrides `app.json`.
pub struct ConfigDirSource;

impl ConfigSource for ConfigDirSource {
    fn name(&self) -> &str {
        "config-dir"
    }

    fn load(&self, ctx: &BootstrapContext) -> anyhow::Result<ConfigMap> {
        let mut out = ConfigMap::new();
        if !ctx.config_path.is_dir() {
            return Ok(out);
        }
        let mut files = Vec::new();
        collect_config_files(&ctx.config_path, &mut files)?;
        files.sort();

        for file in files {
            let key = config_key(&ctx.config_path, &file);
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("read config file {}", file.display()))?;
            let value = interpolate(parse_config_file(&file, &raw)?, &ctx.env);
            match out.get_mut(&key) {
                Some(existing) => {
                    warn!(key = %key, file = %file.display(), "config files share a key, merging");
                    merge_value(existing, value);
                }
                None => {
                    out.insert(key, value);
                }
            }
        }
        Ok(out)
    }
}

/// A prepared mapping, standing in for values a provider registers.
#[cfg(test)]
pub struct StaticSource {
    pub name: String,
    pub values: ConfigMap,
}

#[cfg(test)]
impl ConfigSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self, _ctx: &BootstrapContext) -> anyhow::Result<ConfigMap> {
        Ok(self.values.clone())
    }
}

fn collect_config_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("list {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_config_files(&path, out)?;
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("toml") | Some("json")
        ) {
            out.push(path);
        }
    }
    Ok(())
}

fn merge_value(existing: &mut ConfigValue, incoming: ConfigValue) {
    match (existing, incoming) {
        (ConfigValue::Mapping(base), ConfigValue::Mapping(overlay)) => deep_merge(base, overlay),
        (slot, incoming) => *slot = incoming,
    }
}

fn config_key(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file).with_extension("");
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(".")
}

fn parse_config_file(file: &Path, raw: &str) -> anyhow::Result<ConfigValue> {
    let value = if file.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str::<ConfigValue>(raw)
            .with_context(|| format!("parse config file {}", file.display()))?
    } else {
        let table: toml::Table =
            toml::from_str(raw).with_context(|| format!("parse config file {}", file.display()))?;
        ConfigValue::from(toml::Value::Table(table))
    };
    Ok(value)
}

fn lookup_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("static regex is valid")
    })
}

/// Resolve `${VAR}` and `${VAR:-default}` lookups in every string of the
/// tree. A string that is exactly one lookup takes the coerced value of the
/// variable; lookups embedded in longer text are substituted as text.
pub fn interpolate(value: ConfigValue, env: &BTreeMap<String, String>) -> ConfigValue {
    match value {
        ConfigValue::String(s) => interpolate_str(&s, env),
        ConfigValue::Sequence(items) => {
            ConfigValue::Sequence(items.into_iter().map(|v| interpolate(v, env)).collect())
        }
        ConfigValue::Mapping(m) => ConfigValue::Mapping(
            m.into_iter()
                .map(|(k, v)| (k, interpolate(v, env)))
                .collect(),
        ),
        other => other,
    }
}

fn interpolate_str(s: &str, env: &BTreeMap<String, String>) -> ConfigValue {
    let re = lookup_regex();
    if let Some(caps) = re.captures(s) {
        let whole = caps.get(0).map(|m| m.as_str().len()) == Some(s.len());
        if whole {
            return match env.get(&caps[1]) {
                Some(v) => coerce_env_value(v),
                None => caps
                    .get(2)
                    .map(|d| coerce_env_value(d.as_str()))
                    .unwrap_or(ConfigValue::Null),
            };
        }
    } else {
        return ConfigValue::String(s.to_string());
    }

    let replaced = re.replace_all(s, |caps: &Captures<'_>| {
        env.get(&caps[1])
            .cloned()
            .or_else(|| caps.get(2).map(|d| d.as_str().to_string()))
            .unwrap_or_default()
    });
    ConfigValue::String(replaced.into_owned())
}

/// Typed reading of a raw env string.
pub fn coerce_env_value(raw: &str) -> ConfigValue {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "(true)" => return ConfigValue::Bool(true),
        "false" | "(false)" => return ConfigValue::Bool(false),
        "empty" | "(empty)" => return ConfigValue::String(String::new()),
        "null" | "(null)" => return ConfigValue::Null,
        _ => {}
    }
    ConfigValue::String(strip_quotes(raw).to_string())
}

fn strip_quotes(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

/// Parse `KEY=VALUE` lines of an env file. Blank lines and `#` comments are
/// ignored, an `export ` prefix is allowed, quoted values keep `#`.
pub fn parse_env_file(raw: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        out.insert(key.to_string(), env_file_value(value.trim()));
    }
    out
}

/// A quoted value ends at its matching quote; anything after it is a
/// comment. An unquoted value ends at ` #`.
fn env_file_value(raw: &str) -> String {
    if let Some(quote) = raw.chars().next().filter(|c| *c == '"' || *c == '\'') {
        if let Some(end) = raw[1..].find(quote) {
            return raw[1..1 + end].to_string();
        }
        return raw.to_string();
    }
    match raw.find(" #") {
        Some(idx) => raw[..idx].trim_end().to_string(),
        None => raw.to_string(),
    }
}
