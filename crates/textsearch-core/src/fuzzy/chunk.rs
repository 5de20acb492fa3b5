//! Query compilation: chunks and their bit masks

use ahash::AHashMap;

/// Longest pattern a single bit-vector can hold.
pub const MAX_CHUNK_LEN: usize = 32;

/// Per-character bit masks for one chunk.
///
/// Bit `len - 1 - k` is set for every position `k` where the character occurs.
#[derive(Debug, Clone, Default)]
pub struct QueryMask {
    bits: AHashMap<char, u32>,
}

impl QueryMask {
    pub fn new(pattern: &[char]) -> Self {
        let len = pattern.len();
        let mut bits: AHashMap<char, u32> = AHashMap::with_capacity(len);

        for (k, &c) in pattern.iter().enumerate() {
            *bits.entry(c).or_insert(0) |= 1 << (len - k - 1);
        }

        Self { bits }
    }

    /// Mask for `c`, zero when the character is not in the pattern.
    #[inline]
    pub fn get(&self, c: char) -> u32 {
        self.bits.get(&c).copied().unwrap_or(0)
    }
}

/// A slice of the query short enough for bit-parallel matching.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: Vec<char>,
    /// The chunk as a string, for literal substring search
    pub literal: String,
    pub mask: QueryMask,
    /// Offset of the chunk in the full query, in characters
    pub start: usize,
}

impl Chunk {
    fn new(text: &[char], start: usize) -> Self {
        Self {
            text: text.to_vec(),
            literal: text.iter().collect(),
            mask: QueryMask::new(text),
            start,
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split a (case folded) query into chunks.
    ///
    /// Queries up to [`MAX_CHUNK_LEN`] characters give one chunk. Longer
    /// queries give consecutive full chunks plus, when the length is not a
    /// multiple of the chunk size, a tail chunk covering the last
    /// [`MAX_CHUNK_LEN`] characters (overlapping its predecessor).
    pub fn split(query: &str) -> Vec<Chunk> {
        let chars: Vec<char> = query.chars().collect();
        let len = chars.len();

        if len == 0 {
            return Vec::new();
        }
        if len <= MAX_CHUNK_LEN {
            return vec![Chunk::new(&chars, 0)];
        }

        let mut chunks: Vec<Chunk> = chars
            .chunks_exact(MAX_CHUNK_LEN)
            .enumerate()
            .map(|(i, text)| Chunk::new(text, i * MAX_CHUNK_LEN))
            .collect();

        if len % MAX_CHUNK_LEN != 0 {
            let start = len - MAX_CHUNK_LEN;
            chunks.push(Chunk::new(&chars[start..], start));
        }

        chunks
    }
}
