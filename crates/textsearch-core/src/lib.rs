//! Text Search Core
//!
//! Fuzzy search over collections of strings or JSON records. A collection is
//! indexed once and can then be queried any number of times.
//!
//! # Features
//!
//! - `native` - Enable all native optimizations (SIMD, parallel)
//! - `simd` - SIMD-accelerated exact pre-scan via memchr
//! - `parallel` - Parallel record evaluation via rayon for large collections
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use textsearch_core::Options;
//!
//! let items = vec![
//!     json!({ "title": "Rust in Action", "tags": ["systems", "rust"] }),
//!     json!({ "title": "Programming Elixir", "tags": ["functional"] }),
//! ];
//!
//! let search = textsearch_core::create(&items, Options::new().key(("title", 2.0)).key("tags"))
//!     .unwrap();
//!
//! let results = search.search("rust", Some(5));
//! assert_eq!(results[0].index, 0);
//! assert_eq!(results[0].matches[0].key.unwrap().path.as_str(), "title");
//! ```

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod path;
pub mod record;
pub mod result;
pub mod search;

// Re-export main types at crate root
pub use config::{Configuration, Key, KeySpec, Options, SortBy, SortFn};
pub use error::{Error, Result};
pub use fuzzy::{MatchParams, Matcher, TextMatch};
pub use path::KeyPath;
pub use record::SearchRecord;
pub use result::{Match, SearchResult};
pub use search::TextSearch;

use serde_json::Value;

/// Validate `options` and index `items` for searching.
pub fn create(items: &[Value], options: Options) -> Result<TextSearch<'_>> {
    TextSearch::new(items, options)
}
