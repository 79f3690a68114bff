use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Insertion-ordered configuration tree keyed by setting name.
pub type ConfigMap = IndexMap<String, ConfigValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<ConfigValue>),
    Mapping(ConfigMap),
}

impl ConfigValue {
    #[cfg(test)]
    pub fn as_mapping(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::Sequence(_) => "sequence",
            ConfigValue::Mapping(_) => "mapping",
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Integer(i)
    }
}

impl From<f64> for ConfigValue {
    fn from(f: f64) -> Self {
        ConfigValue::Float(f)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(m: ConfigMap) -> Self {
        ConfigValue::Mapping(m)
    }
}

impl From<toml::Value> for ConfigValue {
    fn from(v: toml::Value) -> Self {
        match v {
            toml::Value::String(s) => ConfigValue::String(s),
            toml::Value::Integer(i) => ConfigValue::Integer(i),
            toml::Value::Float(f) => ConfigValue::Float(f),
            toml::Value::Boolean(b) => ConfigValue::Bool(b),
            toml::Value::Datetime(d) => ConfigValue::String(d.to_string()),
            toml::Value::Array(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::from).collect())
            }
            toml::Value::Table(t) => ConfigValue::Mapping(
                t.into_iter()
                    .map(|(k, v)| (k, ConfigValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Null => serializer.serialize_unit(),
            ConfigValue::Bool(b) => serializer.serialize_bool(*b),
            ConfigValue::Integer(i) => serializer.serialize_i64(*i),
            // Non-finite floats come out as `null`; verification catches it.
            ConfigValue::Float(f) => serializer.serialize_f64(*f),
            ConfigValue::String(s) => serializer.serialize_str(s),
            ConfigValue::Sequence(items) => items.serialize(serializer),
            ConfigValue::Mapping(m) => m.serialize(serializer),
        }
    }
}

struct ConfigValueVisitor;

impl<'de> Visitor<'de> for ConfigValueVisitor {
    type Value = ConfigValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a configuration value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<ConfigValue, D::Error> {
        ConfigValue::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Integer(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<ConfigValue, E> {
        match i64::try_from(u) {
            Ok(i) => Ok(ConfigValue::Integer(i)),
            Err(_) => Ok(ConfigValue::Float(u as f64)),
        }
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<ConfigValue, E> {
        Ok(ConfigValue::String(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<ConfigValue, E> {
        Ok(ConfigValue::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ConfigValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(ConfigValue::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ConfigValue, A::Error> {
        let mut out = ConfigMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((k, v)) = map.next_entry::<String, ConfigValue>()? {
            out.insert(k, v);
        }
        Ok(ConfigValue::Mapping(out))
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(ConfigValueVisitor)
    }
}

/// Merge `overlay` into `base`. Mappings merge key by key; any other
/// value in `overlay` replaces what `base` had.
pub fn deep_merge(base: &mut ConfigMap, overlay: ConfigMap) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(ConfigValue::Mapping(existing)), ConfigValue::Mapping(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Dotted key path of the first place where `actual` departs from
/// `expected`, or `None` when both trees are equal.
pub fn first_difference(expected: &ConfigMap, actual: &ConfigMap) -> Option<String> {
    fn walk(prefix: &str, expected: &ConfigMap, actual: &ConfigMap) -> Option<String> {
        let join = |k: &str| {
            if prefix.is_empty() {
                k.to_string()
            } else {
                format!("{}.{}", prefix, k)
            }
        };
        for (k, ev) in expected {
            match (ev, actual.get(k)) {
                (_, None) => return Some(join(k)),
                (ConfigValue::Mapping(em), Some(ConfigValue::Mapping(am))) => {
                    if let Some(path) = walk(&join(k), em, am) {
                        return Some(path);
                    }
                }
                (ev, Some(av)) if ev != av => return Some(join(k)),
                _ => {}
            }
        }
        actual
            .keys()
            .find(|k| !expected.contains_key(*k))
            .map(|k| join(k))
    }
    walk("", expected, actual)
}
