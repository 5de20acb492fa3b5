//! TextSearch - index once, query many times

use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::config::{Configuration, Options};
use crate::error::Result;
use crate::fuzzy::Matcher;
use crate::record::{is_string_collection, SearchRecord};
use crate::result::SearchResult;

/// A search over a borrowed collection.
///
/// The index is built once in [`TextSearch::new`] and is immutable
/// afterwards, so one `TextSearch` can serve any number of queries, from any
/// number of threads.
#[derive(Debug, Clone)]
pub struct TextSearch<'a> {
    records: Vec<SearchRecord<'a>>,
    config: Configuration,
}

impl<'a> TextSearch<'a> {
    /// Validate `options` and index `items`.
    pub fn new(items: &'a [Value], options: Options) -> Result<Self> {
        let config = Configuration::from_options(options)?;
        Ok(Self::with_configuration(items, config))
    }

    /// Index `items` with an already validated configuration.
    pub fn with_configuration(items: &'a [Value], config: Configuration) -> Self {
        let start = Instant::now();
        let records = SearchRecord::index(items, &config);

        debug!(
            records = records.len(),
            strings = is_string_collection(items),
            keys = config.keys.len(),
            recursive = config.recursive_by.is_some(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "built search index"
        );

        Self { records, config }
    }

    /// Search for `query`.
    ///
    /// Results are sorted according to the configured [`SortBy`](crate::SortBy)
    /// and truncated to `limit` when it is given and positive. An empty query
    /// matches nothing.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<SearchResult<'_>> {
        let start = Instant::now();
        let matcher = Matcher::new(query, self.config.match_params(), self.config.sensitive);

        if matcher.is_empty() {
            debug!("empty query, nothing to match");
            return Vec::new();
        }

        let mut results = self.aggregate(&matcher);
        let found = results.len();

        let comparator = self.config.sort_by.comparator();
        if let Some(compare) = comparator {
            results.sort_by(compare);
        }

        if let Some(limit) = limit.filter(|&limit| limit > 0) {
            results.truncate(limit);
        }

        debug!(
            query_len = matcher.query().chars().count(),
            chunks = matcher.chunks().len(),
            found,
            returned = results.len(),
            sorted = comparator.is_some(),
            limit = ?limit,
            elapsed_us = start.elapsed().as_micros() as u64,
            "search complete"
        );

        results
    }

    /// Aggregate in parallel with rayon for large collections
    #[cfg(feature = "parallel")]
    fn aggregate(&self, matcher: &Matcher) -> Vec<SearchResult<'_>> {
        if self.records.len() >= self.config.parallel_threshold {
            SearchResult::find_parallel(matcher, &self.records)
        } else {
            SearchResult::find(matcher, &self.records)
        }
    }

    /// Sequential aggregation when the parallel feature is disabled
    #[cfg(not(feature = "parallel"))]
    fn aggregate(&self, matcher: &Matcher) -> Vec<SearchResult<'_>> {
        SearchResult::find(matcher, &self.records)
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// The index, one entry per top-level item
    pub fn records(&self) -> &[SearchRecord<'a>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
