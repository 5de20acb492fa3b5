//! Fuzzy Matching Engine
//!
//! Approximate substring matching with a bit-parallel (Bitap) algorithm:
//!
//! - **Chunks**: queries are split into pieces of at most 32 characters, each
//!   with per-character bit masks ([`chunk`])
//! - **Bitap**: each chunk is matched against the full candidate text with an
//!   exact pre-scan followed by a bit-vector pass per error level ([`bitap`])
//! - **Matcher**: a compiled query that averages chunk scores and merges their
//!   match ranges ([`Matcher`])
//!
//! Scores run from 0 (exact) to 1 (worst).
//!
//! # Features
//!
//! - `simd` - literal pre-scan via `memchr::memmem`
//!
//! # Example
//!
//! ```rust
//! use textsearch_core::fuzzy::{MatchParams, Matcher};
//!
//! let matcher = Matcher::new("wrld", MatchParams::default(), false);
//! let found = matcher.matches("Hello World").unwrap();
//! assert!(found.score > 0.0 && found.score < 0.6);
//! ```

pub mod bitap;
pub mod chunk;
mod engine;

use std::borrow::Cow;

use crate::config::{DEFAULT_DISTANCE, DEFAULT_MIN_MATCH, DEFAULT_THRESHOLD};

pub use chunk::{Chunk, QueryMask, MAX_CHUNK_LEN};
pub use engine::{Matcher, TextMatch};

/// Inclusive `[start, end]` character range of a match.
pub type MatchRange = [usize; 2];

/// Tuning parameters for a single match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchParams {
    /// Score above which an alignment is rejected
    pub threshold: f64,
    /// Positional penalty scale (0 = any offset scores 1)
    pub distance: f64,
    /// Shortest reported match run
    pub min_match: usize,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            distance: DEFAULT_DISTANCE,
            min_match: DEFAULT_MIN_MATCH,
        }
    }
}

/// Lowercase `text` unless matching is case sensitive.
pub fn fold_case(text: &str, sensitive: bool) -> Cow<'_, str> {
    if sensitive {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.to_lowercase())
    }
}
