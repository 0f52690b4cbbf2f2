//! Dynamically-typed configuration values
//!
//! Widget configuration maps hold JSON values of arbitrary shape. `ConfigValue`
//! keeps them lossless across load/save. Decoding tries variants in a fixed
//! order (bool, int, double, string, array, map, null) so a JSON `1` is always
//! an `Int` and never a `Double`.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A JSON value of unknown shape
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
    #[default]
    Null,
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Int(i) => Some(*i as f64),
            ConfigValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    /// Short type name used in log output
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Int(_) => "int",
            ConfigValue::Double(_) => "double",
            ConfigValue::String(_) => "string",
            ConfigValue::Array(_) => "array",
            ConfigValue::Map(_) => "map",
            ConfigValue::Null => "null",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(i) => write!(f, "{i}"),
            ConfigValue::Double(d) => write!(f, "{d}"),
            ConfigValue::String(s) => write!(f, "{s:?}"),
            ConfigValue::Null => f.write_str("null"),
            other => match serde_json::to_string(other) {
                Ok(json) => f.write_str(&json),
                Err(_) => f.write_str(other.kind()),
            },
        }
    }
}

impl Serialize for ConfigValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ConfigValue::Bool(b) => serializer.serialize_bool(*b),
            ConfigValue::Int(i) => serializer.serialize_i64(*i),
            ConfigValue::Double(d) => serializer.serialize_f64(*d),
            ConfigValue::String(s) => serializer.serialize_str(s),
            ConfigValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ConfigValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            ConfigValue::Null => serializer.serialize_unit(),
        }
    }
}

struct ConfigValueVisitor;

impl<'de> Visitor<'de> for ConfigValueVisitor {
    type Value = ConfigValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Int(v))
    }

    /// Integers beyond `i64` fall through to the double variant
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ConfigValue, E> {
        Ok(i64::try_from(v)
            .map(ConfigValue::Int)
            .unwrap_or(ConfigValue::Double(v as f64)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Double(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ConfigValue, E> {
        Ok(ConfigValue::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<ConfigValue, E> {
        Ok(ConfigValue::String(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<ConfigValue, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(ConfigValue::Array(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<ConfigValue, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, ConfigValue>()? {
            entries.insert(key, value);
        }
        Ok(ConfigValue::Map(entries))
    }

    fn visit_unit<E: de::Error>(self) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<ConfigValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        ConfigValue::deserialize(deserializer)
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ConfigValueVisitor)
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        ConfigValue::Int(v.into())
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Double(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::String(v.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::String(v)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(v: Vec<ConfigValue>) -> Self {
        ConfigValue::Array(v)
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Bool(b) => ConfigValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ConfigValue::Int(i),
                None => n.as_f64().map(ConfigValue::Double).unwrap_or(ConfigValue::Null),
            },
            Value::String(s) => ConfigValue::String(s),
            Value::Array(items) => ConfigValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(entries) => {
                ConfigValue::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Null => ConfigValue::Null,
        }
    }
}

impl From<ConfigValue> for serde_json::Value {
    fn from(value: ConfigValue) -> Self {
        use serde_json::Value;
        match value {
            ConfigValue::Bool(b) => Value::Bool(b),
            ConfigValue::Int(i) => Value::from(i),
            // Non-finite doubles have no JSON form
            ConfigValue::Double(d) => serde_json::Number::from_f64(d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ConfigValue::String(s) => Value::String(s),
            ConfigValue::Array(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            ConfigValue::Map(entries) => {
                Value::Object(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            ConfigValue::Null => Value::Null,
        }
    }
}
