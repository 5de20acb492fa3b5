//! Result aggregation: run the matcher over indexed records and score them

use serde::Serialize;
use serde_json::Value;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::Key;
use crate::fuzzy::{MatchRange, Matcher};
use crate::record::{ArrayLeaf, FieldLeaves, KeyField, Leaf, ObjectRecord, SearchRecord, TextRecord};

/// A single matched leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match<'s> {
    /// The matched text
    pub item: &'s str,
    pub norm: f64,
    /// `[start, end]` character ranges in the case folded text
    pub indices: Vec<MatchRange>,
    pub score: f64,
    /// Set for matches inside object records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<&'s Key>,
    /// Set when the text came from an array field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl<'s> Match<'s> {
    fn from_leaf(leaf: &'s Leaf<'_>, matcher: &Matcher) -> Option<Self> {
        let found = matcher.matches_folded(leaf.search_text())?;

        Some(Self {
            item: &leaf.text,
            norm: leaf.norm,
            indices: found.ranges,
            score: found.score,
            key: None,
            index: None,
        })
    }

    /// Exponent applied to this match's score in the record score.
    fn exponent(&self) -> f64 {
        self.key.map_or(1.0, |key| key.weight) * self.norm
    }
}

/// A record that matched the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult<'s> {
    pub item: &'s Value,
    /// Position within the parent collection
    pub index: usize,
    /// 0 = perfect, 1 = worst
    pub score: f64,
    /// Nesting level, 0 for top-level records
    pub depth: usize,
    pub matches: Vec<Match<'s>>,
}

impl<'s> SearchResult<'s> {
    /// Evaluate every record in order.
    pub fn find(matcher: &Matcher, records: &'s [SearchRecord<'s>]) -> Vec<Self> {
        records
            .iter()
            .flat_map(|record| search_record(record, matcher))
            .collect()
    }

    /// Evaluate top-level records in parallel. Output order matches [`SearchResult::find`].
    #[cfg(feature = "parallel")]
    pub fn find_parallel(matcher: &Matcher, records: &'s [SearchRecord<'s>]) -> Vec<Self> {
        records
            .par_iter()
            .flat_map_iter(|record| search_record(record, matcher))
            .collect()
    }
}

fn search_record<'s>(record: &'s SearchRecord<'s>, matcher: &Matcher) -> Vec<SearchResult<'s>> {
    match record {
        SearchRecord::Text(record) => search_text(record, matcher).into_iter().collect(),
        SearchRecord::Object(record) => search_object(record, matcher),
    }
}

fn search_text<'s>(record: &'s TextRecord<'s>, matcher: &Matcher) -> Option<SearchResult<'s>> {
    let found = Match::from_leaf(record.leaf.as_ref()?, matcher)?;

    Some(SearchResult {
        item: record.item,
        index: record.index,
        score: found.score.powf(found.exponent()),
        depth: 0,
        matches: vec![found],
    })
}

/// Every node of the tree is scored on its own; parents and children never
/// share scores.
fn search_object<'s>(record: &'s ObjectRecord<'s>, matcher: &Matcher) -> Vec<SearchResult<'s>> {
    record
        .flatten()
        .into_iter()
        .filter_map(|node| {
            let matches = match_fields(node, matcher);
            if matches.is_empty() {
                return None;
            }

            let score: f64 = matches
                .iter()
                .map(|m| m.score.powf(m.exponent()))
                .product();

            Some(SearchResult {
                item: node.item,
                index: node.index,
                score,
                depth: node.depth,
                matches,
            })
        })
        .collect()
}

fn match_fields<'s>(node: &'s ObjectRecord<'s>, matcher: &Matcher) -> Vec<Match<'s>> {
    let mut matches = Vec::new();

    for KeyField { key, leaves } in &node.fields {
        match leaves {
            FieldLeaves::Empty => {}
            FieldLeaves::Single(leaf) => {
                if let Some(found) = Match::from_leaf(leaf, matcher) {
                    matches.push(Match {
                        key: Some(key),
                        ..found
                    });
                }
            }
            FieldLeaves::Array(leaves) => {
                for ArrayLeaf { leaf, index } in leaves {
                    if let Some(found) = Match::from_leaf(leaf, matcher) {
                        matches.push(Match {
                            key: Some(key),
                            index: Some(*index),
                            ..found
                        });
                    }
                }
            }
        }
    }

    matches
}
