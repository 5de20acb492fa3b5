//! Search options and their normalized configuration
//!
//! [`Options`] is the user-facing, partially filled description of a search
//! (deserializable from JSON with camelCase field names). [`Configuration`]
//! is the validated result with every default applied.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::fuzzy::MatchParams;
use crate::path::KeyPath;
use crate::result::SearchResult;

/// Default score above which a candidate is rejected.
pub const DEFAULT_THRESHOLD: f64 = 0.6;
/// Default positional penalty scale.
pub const DEFAULT_DISTANCE: f64 = 100.0;
/// Default shortest reportable match run.
pub const DEFAULT_MIN_MATCH: usize = 1;
/// Weight of a key given as a bare path.
pub const DEFAULT_WEIGHT: f64 = 1.0;
/// Collection size from which aggregation runs in parallel (feature `parallel`).
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1000;

/// Comparator over search results.
pub type SortFn = for<'r> fn(&SearchResult<'r>, &SearchResult<'r>) -> Ordering;

/// How results are ordered before truncation.
#[derive(Clone, Copy, Default)]
pub enum SortBy {
    /// Ascending score, ties broken by ascending index
    #[default]
    Score,
    /// Caller-supplied comparator
    Custom(SortFn),
    /// Keep aggregation order
    Disabled,
}

impl SortBy {
    /// The comparator to apply, if sorting is enabled.
    pub fn comparator(&self) -> Option<SortFn> {
        match self {
            SortBy::Score => Some(by_score),
            SortBy::Custom(f) => Some(*f),
            SortBy::Disabled => None,
        }
    }
}

impl fmt::Debug for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBy::Score => f.write_str("Score"),
            SortBy::Custom(_) => f.write_str("Custom(..)"),
            SortBy::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Default ordering: ascending score, then ascending index.
pub fn by_score(a: &SearchResult<'_>, b: &SearchResult<'_>) -> Ordering {
    a.score
        .partial_cmp(&b.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.index.cmp(&b.index))
}

/// A key as written by the user: a bare path or a path with a weight.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum KeySpec {
    Path(String),
    Weighted {
        path: String,
        #[serde(default)]
        weight: Option<f64>,
    },
}

impl From<&str> for KeySpec {
    fn from(path: &str) -> Self {
        KeySpec::Path(path.to_string())
    }
}

impl From<String> for KeySpec {
    fn from(path: String) -> Self {
        KeySpec::Path(path)
    }
}

impl From<(&str, f64)> for KeySpec {
    fn from((path, weight): (&str, f64)) -> Self {
        KeySpec::Weighted {
            path: path.to_string(),
            weight: Some(weight),
        }
    }
}

/// A normalized search key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Key {
    pub path: KeyPath,
    pub weight: f64,
}

impl Key {
    pub fn new(path: &str, weight: f64) -> Result<Self> {
        let path = KeyPath::parse(path)?;
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::key(
                path.as_str(),
                format!("weight must be a positive finite number, got {weight}"),
            ));
        }
        Ok(Self { path, weight })
    }

    fn from_spec(spec: KeySpec) -> Result<Self> {
        match spec {
            KeySpec::Path(path) => Self::new(&path, DEFAULT_WEIGHT),
            KeySpec::Weighted { path, weight } => {
                Self::new(&path, weight.unwrap_or(DEFAULT_WEIGHT))
            }
        }
    }
}

/// Partial search options. Unset fields take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Options {
    /// Score above which a match is rejected (0 = exact only, 1 = anything)
    pub threshold: Option<f64>,
    /// How strongly the match position penalizes the score (0 disables it)
    pub distance: Option<f64>,
    #[serde(deserialize_with = "deserialize_sort_by")]
    pub sort_by: Option<SortBy>,
    /// Case sensitive matching
    pub sensitive: Option<bool>,
    /// Shortest reportable contiguous match run
    pub min_match: Option<usize>,
    pub keys: Option<Vec<KeySpec>>,
    /// Path to a child collection searched recursively
    pub recursive_by: Option<String>,
    pub parallel_threshold: Option<usize>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = Some(sensitive);
        self
    }

    pub fn min_match(mut self, min_match: usize) -> Self {
        self.min_match = Some(min_match);
        self
    }

    /// Replace the key list.
    pub fn keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<KeySpec>,
    {
        self.keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Append a single key.
    pub fn key(mut self, key: impl Into<KeySpec>) -> Self {
        self.keys.get_or_insert_with(Vec::new).push(key.into());
        self
    }

    pub fn recursive_by(mut self, path: impl Into<String>) -> Self {
        self.recursive_by = Some(path.into());
        self
    }

    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = Some(threshold);
        self
    }

    /// Overlay `other` on top of `self`: fields set in `other` win.
    pub fn merge(self, other: Options) -> Self {
        Self {
            threshold: other.threshold.or(self.threshold),
            distance: other.distance.or(self.distance),
            sort_by: other.sort_by.or(self.sort_by),
            sensitive: other.sensitive.or(self.sensitive),
            min_match: other.min_match.or(self.min_match),
            keys: other.keys.or(self.keys),
            recursive_by: other.recursive_by.or(self.recursive_by),
            parallel_threshold: other.parallel_threshold.or(self.parallel_threshold),
        }
    }
}

/// `sortBy` in JSON is a boolean: `true` for score order, `false` to disable.
fn deserialize_sort_by<'de, D>(deserializer: D) -> std::result::Result<Option<SortBy>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.map(|enabled| {
        if enabled {
            SortBy::Score
        } else {
            SortBy::Disabled
        }
    }))
}

/// Validated search configuration.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub threshold: f64,
    pub distance: f64,
    pub sort_by: SortBy,
    pub sensitive: bool,
    pub min_match: usize,
    pub keys: Vec<Key>,
    pub recursive_by: Option<KeyPath>,
    pub parallel_threshold: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            distance: DEFAULT_DISTANCE,
            sort_by: SortBy::Score,
            sensitive: false,
            min_match: DEFAULT_MIN_MATCH,
            keys: Vec::new(),
            recursive_by: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl Configuration {
    /// Apply defaults to `options` and validate the result.
    pub fn from_options(options: Options) -> Result<Self> {
        let defaults = Self::default();

        let threshold = options.threshold.unwrap_or(defaults.threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::option(
                "threshold",
                format!("must be within [0, 1], got {threshold}"),
            ));
        }

        let distance = options.distance.unwrap_or(defaults.distance);
        if !distance.is_finite() || distance < 0.0 {
            return Err(Error::option(
                "distance",
                format!("must be a non-negative finite number, got {distance}"),
            ));
        }

        let min_match = options.min_match.unwrap_or(defaults.min_match);
        if min_match == 0 {
            return Err(Error::option("minMatch", "must be at least 1"));
        }

        let keys = options
            .keys
            .unwrap_or_default()
            .into_iter()
            .map(Key::from_spec)
            .collect::<Result<Vec<_>>>()?;

        let recursive_by = options
            .recursive_by
            .as_deref()
            .map(KeyPath::parse)
            .transpose()?;

        Ok(Self {
            threshold,
            distance,
            sort_by: options.sort_by.unwrap_or(defaults.sort_by),
            sensitive: options.sensitive.unwrap_or(defaults.sensitive),
            min_match,
            keys,
            recursive_by,
            parallel_threshold: options
                .parallel_threshold
                .unwrap_or(defaults.parallel_threshold),
        })
    }

    /// Parameters handed to the match engine.
    pub fn match_params(&self) -> MatchParams {
        MatchParams {
            threshold: self.threshold,
            distance: self.distance,
            min_match: self.min_match,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::from_options(Options::default()).unwrap();
        assert_eq!(config.threshold, 0.6);
        assert_eq!(config.distance, 100.0);
        assert_eq!(config.min_match, 1);
        assert!(!config.sensitive);
        assert!(config.keys.is_empty());
        assert!(config.recursive_by.is_none());
        assert!(matches!(config.sort_by, SortBy::Score));
    }

    #[test]
    fn test_bare_key_has_default_weight() {
        let config =
            Configuration::from_options(Options::new().keys(["name"]).key(("title", 2.5)))
                .unwrap();
        assert_eq!(config.keys[0], Key::new("name", 1.0).unwrap());
        assert_eq!(config.keys[1].weight, 2.5);
        assert_eq!(config.keys[1].path.as_str(), "title");
    }

    #[test]
    fn test_parse_json_options() {
        let options = Options::from_json(
            r#"{
                "threshold": 0.3,
                "sortBy": false,
                "minMatch": 2,
                "keys": ["name", { "path": "tags" }, { "path": "bio", "weight": 0.5 }],
                "recursiveBy": "children"
            }"#,
        )
        .unwrap();
        let config = Configuration::from_options(options).unwrap();

        assert_eq!(config.threshold, 0.3);
        assert_eq!(config.min_match, 2);
        assert!(matches!(config.sort_by, SortBy::Disabled));
        assert_eq!(
            config
                .keys
                .iter()
                .map(|k| (k.path.as_str(), k.weight))
                .collect::<Vec<_>>(),
            vec![("name", 1.0), ("tags", 1.0), ("bio", 0.5)]
        );
        assert_eq!(config.recursive_by.unwrap().as_str(), "children");
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let err = Options::from_json(r#"{ "treshold": 0.3 }"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_invalid_values() {
        let err = Configuration::from_options(Options::new().threshold(1.5)).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { option: "threshold", .. }));

        let err = Configuration::from_options(Options::new().threshold(f64::NAN)).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { option: "threshold", .. }));

        let err = Configuration::from_options(Options::new().distance(-1.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { option: "distance", .. }));

        let err = Configuration::from_options(Options::new().min_match(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { option: "minMatch", .. }));

        let err = Configuration::from_options(Options::new().key(("name", 0.0))).unwrap_err();
        assert!(matches!(err, Error::InvalidKey { .. }));

        let err = Configuration::from_options(Options::new().key("a..b")).unwrap_err();
        assert!(matches!(err, Error::InvalidKey { .. }));

        let err = Configuration::from_options(Options::new().recursive_by("")).unwrap_err();
        assert!(matches!(err, Error::InvalidKey { .. }));
    }

    #[test]
    fn test_merge_prefers_overlay() {
        let base = Options::new().threshold(0.2).keys(["a"]).sensitive(true);
        let merged = base.merge(Options::new().threshold(0.4));
        assert_eq!(merged.threshold, Some(0.4));
        assert_eq!(merged.sensitive, Some(true));
        assert_eq!(merged.keys, Some(vec![KeySpec::from("a")]));
    }

    #[test]
    fn test_key_serializes_as_path_and_weight() {
        let key = Key::new("name.first", 1.0).unwrap();
        assert_eq!(
            serde_json::to_value(&key).unwrap(),
            serde_json::json!({ "path": "name.first", "weight": 1.0 })
        );
    }
}
