//! Dotted property paths into JSON values
//!
//! A path such as `"author.names.0"` walks object fields by name and array
//! elements by decimal index. Lookups never fail loudly: any segment that
//! cannot be followed yields `None`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Segment separator for key paths.
const SEPARATOR: char = '.';

/// A validated dotted path, split into segments once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    raw: String,
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a dotted path. Empty paths and empty segments (`"a..b"`) are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::key(raw, "path is empty"));
        }

        let segments: Vec<String> = raw.split(SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::key(raw, "path contains an empty segment"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The path as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Resolve this path against a value.
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.segments()
            .try_fold(value, |current, segment| step(current, segment))
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for KeyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for KeyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Read the value at `path` inside `value`.
///
/// Unparseable paths resolve to `None` just like missing fields.
pub fn get<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return None;
    }
    path.split(SEPARATOR)
        .try_fold(value, |current, segment| step(current, segment))
}

fn step<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
