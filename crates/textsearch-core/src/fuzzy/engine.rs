//! Matcher - a compiled query bound to its matching parameters

use tracing::trace;

use super::bitap::{self, Candidate, ChunkMatch};
use super::chunk::Chunk;
use super::{fold_case, MatchParams, MatchRange};

/// A positive match of a query against one text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch {
    /// 0 = exact, 1 = worst
    pub score: f64,
    /// Sorted, disjoint `[start, end]` character ranges
    pub ranges: Vec<MatchRange>,
}

/// Compiled query. Immutable and shareable across threads.
#[derive(Debug, Clone)]
pub struct Matcher {
    query: String,
    chunks: Vec<Chunk>,
    params: MatchParams,
    sensitive: bool,
}

impl Matcher {
    pub fn new(query: &str, params: MatchParams, sensitive: bool) -> Self {
        let query = fold_case(query, sensitive).into_owned();
        let chunks = Chunk::split(&query);

        Self {
            query,
            chunks,
            params,
            sensitive,
        }
    }

    /// The case folded query
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn params(&self) -> &MatchParams {
        &self.params
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    /// An empty query never matches anything.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Match raw text, folding its case first when needed.
    pub fn matches(&self, text: &str) -> Option<TextMatch> {
        self.matches_folded(&fold_case(text, self.sensitive))
    }

    /// Match text that was already folded the same way as the query.
    pub fn matches_folded(&self, text: &str) -> Option<TextMatch> {
        if self.is_empty() {
            return None;
        }

        if text == self.query {
            let last = text.chars().count() - 1;
            return Some(TextMatch {
                score: 0.0,
                ranges: vec![[0, last]],
            });
        }

        let candidate = Candidate::new(text);
        let mut total = 0.0;
        let mut ranges = Vec::new();

        for chunk in &self.chunks {
            let result = bitap::search(&candidate, chunk, &self.params);
            trace!(
                chunk_start = chunk.start,
                score = result.score(),
                hit = result.is_hit(),
                "chunk matched"
            );

            total += result.score();
            if let ChunkMatch::Hit { ranges: found, .. } = result {
                ranges.extend(found);
            }
        }

        if ranges.is_empty() {
            return None;
        }

        Some(TextMatch {
            score: total / self.chunks.len() as f64,
            ranges: merge_ranges(ranges),
        })
    }
}

/// Union of ranges as a sorted list of disjoint, non-adjacent ranges.
fn merge_ranges(mut ranges: Vec<MatchRange>) -> Vec<MatchRange> {
    ranges.sort_unstable();

    let mut merged: Vec<MatchRange> = Vec::with_capacity(ranges.len());
    for [start, end] in ranges {
        match merged.last_mut() {
            Some(last) if start <= last[1] + 1 => last[1] = last[1].max(end),
            _ => merged.push([start, end]),
        }
    }
    merged
}
