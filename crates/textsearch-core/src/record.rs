//! Search records: a query-independent index over the searched collection
//!
//! Raw items are normalized once into leaves of searchable text, each with a
//! precomputed normalization weight. A collection whose first element is a
//! string is indexed as flat text records; anything else is indexed as
//! objects whose configured key paths are resolved into leaves, optionally
//! recursing into a child collection.

use std::borrow::Cow;

use serde_json::Value;

use crate::config::{Configuration, Key};
use crate::fuzzy::fold_case;

/// Searchable text with its normalization weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<'a> {
    /// Text as it appears in the item
    pub text: Cow<'a, str>,
    /// Lowercased text when matching is case insensitive
    folded: Option<String>,
    /// `1 / sqrt(non-space chars)`, rounded to three decimals
    pub norm: f64,
}

impl<'a> Leaf<'a> {
    /// Build a leaf. Text without any non-space character is not searchable
    /// and yields `None`.
    pub fn new(text: Cow<'a, str>, sensitive: bool) -> Option<Self> {
        let norm = normalize(&text)?;
        let folded = match fold_case(&text, sensitive) {
            Cow::Owned(folded) => Some(folded),
            Cow::Borrowed(_) => None,
        };

        Some(Self { text, folded, norm })
    }

    /// The text the matcher runs against. Match ranges index its chars,
    /// which can outnumber those of `text` when lowercasing expands one
    /// (`'İ'` folds to two).
    pub fn search_text(&self) -> &str {
        self.folded.as_deref().unwrap_or(&self.text)
    }
}

/// A leaf taken from an array, with its position in that array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLeaf<'a> {
    pub leaf: Leaf<'a>,
    pub index: usize,
}

/// What a key path resolved to inside one item.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldLeaves<'a> {
    /// Missing, null, object or blank value: nothing to match
    #[default]
    Empty,
    Single(Leaf<'a>),
    /// Array elements in their original order
    Array(Vec<ArrayLeaf<'a>>),
}

impl<'a> FieldLeaves<'a> {
    pub fn resolve(value: Option<&'a Value>, sensitive: bool) -> Self {
        match value {
            Some(Value::Array(items)) => {
                let mut leaves = Vec::with_capacity(items.len());
                collect_array(items, sensitive, &mut leaves);
                FieldLeaves::Array(leaves)
            }
            Some(value) => scalar_text(value)
                .and_then(|text| Leaf::new(text, sensitive))
                .map_or(FieldLeaves::Empty, FieldLeaves::Single),
            None => FieldLeaves::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldLeaves::Empty => true,
            FieldLeaves::Single(_) => false,
            FieldLeaves::Array(leaves) => leaves.is_empty(),
        }
    }
}

/// The leaves one configured key resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyField<'a> {
    pub key: Key,
    pub leaves: FieldLeaves<'a>,
}

/// A record from a flat string collection.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRecord<'a> {
    pub item: &'a Value,
    pub index: usize,
    /// `None` for blank strings and non-string items
    pub leaf: Option<Leaf<'a>>,
}

/// A record from an object collection, possibly with nested children.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord<'a> {
    pub item: &'a Value,
    /// Position within the parent collection
    pub index: usize,
    /// 0 for the root collection, +1 per recursion level
    pub depth: usize,
    /// One entry per configured key, in key order
    pub fields: Vec<KeyField<'a>>,
    pub children: Vec<ObjectRecord<'a>>,
}

impl<'a> ObjectRecord<'a> {
    pub fn new(item: &'a Value, index: usize, depth: usize, config: &Configuration) -> Self {
        let fields = config
            .keys
            .iter()
            .map(|key| KeyField {
                key: key.clone(),
                leaves: FieldLeaves::resolve(key.path.resolve(item), config.sensitive),
            })
            .collect();

        let children = config
            .recursive_by
            .as_ref()
            .and_then(|path| path.resolve(item))
            .and_then(Value::as_array)
            .map(|children| {
                children
                    .iter()
                    .enumerate()
                    .map(|(i, child)| ObjectRecord::new(child, i, depth + 1, config))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            item,
            index,
            depth,
            fields,
            children,
        }
    }

    /// This node followed by all descendants, depth first.
    pub fn flatten(&self) -> Vec<&ObjectRecord<'a>> {
        let mut nodes = Vec::new();
        self.collect_nodes(&mut nodes);
        nodes
    }

    fn collect_nodes<'r>(&'r self, nodes: &mut Vec<&'r ObjectRecord<'a>>) {
        nodes.push(self);
        for child in &self.children {
            child.collect_nodes(nodes);
        }
    }
}

/// One top-level entry of the index.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchRecord<'a> {
    Text(TextRecord<'a>),
    Object(ObjectRecord<'a>),
}

impl<'a> SearchRecord<'a> {
    /// Index a collection. Never fails: unresolvable paths become empty fields.
    pub fn index(items: &'a [Value], config: &Configuration) -> Vec<Self> {
        if is_string_collection(items) {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    SearchRecord::Text(TextRecord {
                        item,
                        index,
                        leaf: item
                            .as_str()
                            .and_then(|text| Leaf::new(Cow::Borrowed(text), config.sensitive)),
                    })
                })
                .collect()
        } else {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| SearchRecord::Object(ObjectRecord::new(item, index, 0, config)))
                .collect()
        }
    }

    pub fn index_of(&self) -> usize {
        match self {
            SearchRecord::Text(record) => record.index,
            SearchRecord::Object(record) => record.index,
        }
    }
}

/// A collection is treated as plain strings when its first element is one.
pub fn is_string_collection(items: &[Value]) -> bool {
    matches!(items.first(), Some(Value::String(_)))
}

/// Normalization weight of a text, `None` when it has no non-space characters.
pub fn normalize(text: &str) -> Option<f64> {
    let tokens = text.chars().filter(|&c| c != ' ').count();
    if tokens == 0 {
        return None;
    }
    Some((1000.0 / (tokens as f64).sqrt()).round() / 1000.0)
}

/// Strings are searched as is, numbers and booleans by their JSON text.
fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) => Some(Cow::Borrowed(text.as_str())),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        Value::Bool(flag) => Some(Cow::Owned(flag.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Flatten (possibly nested) arrays in order. Each leaf keeps its position
/// within the array that directly contains it.
fn collect_array<'a>(items: &'a [Value], sensitive: bool, leaves: &mut Vec<ArrayLeaf<'a>>) {
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::Array(nested) => collect_array(nested, sensitive, leaves),
            other => {
                if let Some(leaf) = scalar_text(other).and_then(|text| Leaf::new(text, sensitive)) {
                    leaves.push(ArrayLeaf { leaf, index });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use serde_json::json;

    fn config(options: Options) -> Configuration {
        Configuration::from_options(options).unwrap()
    }

    fn texts(leaves: &FieldLeaves<'_>) -> Vec<(String, usize)> {
        match leaves {
            FieldLeaves::Array(leaves) => leaves
                .iter()
                .map(|l| (l.leaf.text.to_string(), l.index))
                .collect(),
            other => panic!("expected array leaves, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a"), Some(1.0));
        assert_eq!(normalize("abcd"), Some(0.5));
        assert_eq!(normalize("ab cd"), Some(0.5));
        assert_eq!(normalize("abc"), Some(0.577));
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
    }

    #[test]
    fn test_leaf_folds_once() {
        let leaf = Leaf::new(Cow::Borrowed("Hello World"), false).unwrap();
        assert_eq!(leaf.text, "Hello World");
        assert_eq!(leaf.search_text(), "hello world");

        let leaf = Leaf::new(Cow::Borrowed("Hello"), true).unwrap();
        assert_eq!(leaf.search_text(), "Hello");
    }

    #[test]
    fn test_string_collection() {
        let items = vec![json!("a"), json!("  "), json!(5), json!("b")];
        let records = SearchRecord::index(&items, &Configuration::default());

        assert_eq!(records.len(), 4);
        let leaves: Vec<Option<&str>> = records
            .iter()
            .map(|r| match r {
                SearchRecord::Text(t) => t.leaf.as_ref().map(|l| l.text.as_ref()),
                SearchRecord::Object(_) => panic!("expected text records"),
            })
            .collect();
        assert_eq!(leaves, vec![Some("a"), None, None, Some("b")]);
        assert_eq!(records[3].index_of(), 3);
    }

    #[test]
    fn test_object_fields_follow_key_order() {
        let items = vec![json!({ "name": "ada", "age": 36, "meta": { "x": 1 } })];
        let cfg = config(Options::new().keys(["age", "name", "missing", "meta"]));
        let records = SearchRecord::index(&items, &cfg);

        let SearchRecord::Object(record) = &records[0] else {
            panic!("expected object record");
        };
        assert_eq!(record.fields.len(), 4);
        let paths: Vec<&str> = record.fields.iter().map(|f| f.key.path.as_str()).collect();
        assert_eq!(paths, vec!["age", "name", "missing", "meta"]);
        assert!(matches!(&record.fields[0].leaves, FieldLeaves::Single(l) if l.text == "36"));
        assert!(matches!(&record.fields[1].leaves, FieldLeaves::Single(l) if l.text == "ada"));
        assert_eq!(record.fields[2].leaves, FieldLeaves::Empty);
        assert_eq!(record.fields[3].leaves, FieldLeaves::Empty);
    }

    #[test]
    fn test_array_order_preserved() {
        let items = vec![json!({ "tags": ["x", "y", "", "z"] })];
        let cfg = config(Options::new().keys(["tags"]));
        let records = SearchRecord::index(&items, &cfg);

        let SearchRecord::Object(record) = &records[0] else {
            panic!("expected object record");
        };
        assert_eq!(
            texts(&record.fields[0].leaves),
            vec![("x".to_string(), 0), ("y".to_string(), 1), ("z".to_string(), 3)]
        );
    }

    #[test]
    fn test_nested_arrays_flatten_in_order() {
        let items = vec![json!({ "tags": ["a", ["b", "c"], "d"] })];
        let cfg = config(Options::new().keys(["tags"]));
        let records = SearchRecord::index(&items, &cfg);

        let SearchRecord::Object(record) = &records[0] else {
            panic!("expected object record");
        };
        assert_eq!(
            texts(&record.fields[0].leaves),
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 0),
                ("c".to_string(), 1),
                ("d".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_recursive_children() {
        let items = vec![
            json!({ "name": "root", "children": [
                { "name": "child", "children": [{ "name": "grandchild" }] },
                { "name": "sibling" }
            ]}),
            json!({ "name": "leaf", "children": "not a list" }),
        ];
        let cfg = config(Options::new().keys(["name"]).recursive_by("children"));
        let records = SearchRecord::index(&items, &cfg);

        let SearchRecord::Object(root) = &records[0] else {
            panic!("expected object record");
        };
        let shape: Vec<(usize, usize)> = root.flatten().iter().map(|n| (n.index, n.depth)).collect();
        assert_eq!(shape, vec![(0, 0), (0, 1), (0, 2), (1, 1)]);

        let SearchRecord::Object(leaf) = &records[1] else {
            panic!("expected object record");
        };
        assert!(leaf.children.is_empty());
    }

    #[test]
    fn test_no_recursion_without_path() {
        let items = vec![json!({ "name": "root", "children": [{ "name": "child" }] })];
        let cfg = config(Options::new().keys(["name"]));
        let records = SearchRecord::index(&items, &cfg);

        let SearchRecord::Object(root) = &records[0] else {
            panic!("expected object record");
        };
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_empty_collection() {
        assert!(SearchRecord::index(&[], &Configuration::default()).is_empty());
    }
}
