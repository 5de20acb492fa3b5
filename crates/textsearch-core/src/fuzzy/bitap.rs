//! Bit-parallel approximate matching of one chunk against one candidate
//!
//! A Bitap variant with edit distance: an exact pre-scan seeds the threshold,
//! then one bit-vector per error level is swept right to left over a search
//! window that narrows as better alignments are found.

use super::chunk::Chunk;
use super::{MatchParams, MatchRange};

/// Where a match is expected to start. Scores grow with distance from it.
const EXPECTED_LOCATION: usize = 0;

/// Scores are floored here so fuzzy alignments never tie with exact equality.
pub const MIN_SCORE: f64 = 0.001;

/// Outcome of matching a single chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkMatch {
    /// No alignment within the threshold; the score still counts toward the average
    Miss { score: f64 },
    Hit { score: f64, ranges: Vec<MatchRange> },
}

impl ChunkMatch {
    pub fn score(&self) -> f64 {
        match self {
            ChunkMatch::Miss { score } | ChunkMatch::Hit { score, .. } => *score,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, ChunkMatch::Hit { .. })
    }
}

/// Candidate text prepared once for all chunks of a query.
#[derive(Debug)]
pub struct Candidate<'t> {
    #[cfg_attr(not(feature = "simd"), allow(dead_code))]
    text: &'t str,
    chars: Vec<char>,
    /// Byte offset of every char, plus the total length
    #[cfg(feature = "simd")]
    offsets: Vec<usize>,
}

impl<'t> Candidate<'t> {
    pub fn new(text: &'t str) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            #[cfg(feature = "simd")]
            offsets: text
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Next literal occurrence of the chunk at or after char position `from`.
    #[cfg(feature = "simd")]
    fn find(&self, chunk: &Chunk, from: usize) -> Option<usize> {
        use memchr::memmem;

        let byte_from = *self.offsets.get(from)?;
        let found = memmem::find(&self.text.as_bytes()[byte_from..], chunk.literal.as_bytes())?;
        // UTF-8 hits always start on a char boundary
        self.offsets.binary_search(&(byte_from + found)).ok()
    }

    #[cfg(not(feature = "simd"))]
    fn find(&self, chunk: &Chunk, from: usize) -> Option<usize> {
        let needle = &chunk.text;
        if from > self.chars.len() || needle.len() > self.chars.len() - from {
            return None;
        }
        self.chars[from..]
            .windows(needle.len())
            .position(|window| window == needle.as_slice())
            .map(|pos| pos + from)
    }
}

/// Score of an alignment with `errors` edits starting at `location`.
///
/// 0 is a perfect match at the expected location, higher is worse.
pub fn calculate_score(pattern_len: usize, errors: usize, location: usize, distance: f64) -> f64 {
    let accuracy = errors as f64 / pattern_len as f64;
    let proximity = location.abs_diff(EXPECTED_LOCATION);

    if distance == 0.0 {
        if proximity == 0 {
            accuracy
        } else {
            1.0
        }
    } else {
        accuracy + proximity as f64 / distance
    }
}

/// Collapse a per-position match mask into `[start, end]` runs of at least `min_len`.
pub fn mask_to_ranges(mask: &[bool], min_len: usize) -> Vec<MatchRange> {
    let mut ranges = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, &hit) in mask.iter().enumerate() {
        match (hit, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                if i - start >= min_len {
                    ranges.push([start, i - 1]);
                }
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        if mask.len() - start >= min_len {
            ranges.push([start, mask.len() - 1]);
        }
    }

    ranges
}

/// Match one chunk against a candidate.
///
/// Scratch vectors live only for the duration of the call, so concurrent
/// searches never share state.
pub fn search(candidate: &Candidate<'_>, chunk: &Chunk, params: &MatchParams) -> ChunkMatch {
    let pattern_len = chunk.len();
    let text = &candidate.chars;
    let text_len = text.len();
    let distance = params.distance;

    if pattern_len == 0 {
        return ChunkMatch::Miss { score: 1.0 };
    }

    let mut threshold = params.threshold;
    let mut match_mask = vec![false; text_len];

    // Exact occurrences tighten the threshold before the fuzzy pass
    let mut from = EXPECTED_LOCATION;
    while let Some(index) = candidate.find(chunk, from) {
        let score = calculate_score(pattern_len, 0, index, distance);
        threshold = threshold.min(score);
        from = index + pattern_len;

        for flag in &mut match_mask[index..index + pattern_len] {
            *flag = true;
        }
    }

    let terminal = 1u32 << (pattern_len - 1);
    let mut best_location: Option<usize> = None;
    let mut last_bits: Vec<u32> = Vec::new();
    let mut final_score = 1.0;
    let mut bin_max = pattern_len + text_len;

    for errors in 0..pattern_len {
        // Widest window still able to score within the threshold
        let mut bin_min = 0;
        let mut bin_mid = bin_max;
        while bin_min < bin_mid {
            let score =
                calculate_score(pattern_len, errors, EXPECTED_LOCATION + bin_mid, distance);
            if score <= threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        bin_max = bin_mid;

        let mut start = (EXPECTED_LOCATION + 1).saturating_sub(bin_mid).max(1);
        let finish = (EXPECTED_LOCATION + bin_mid).min(text_len) + pattern_len;

        let mut bits = vec![0u32; finish + 2];
        bits[finish + 1] = (1u32 << errors) - 1;

        let mut j = finish;
        while j >= start {
            let location = j - 1;
            let char_match = text.get(location).map_or(0, |&c| chunk.mask.get(c));

            if let Some(flag) = match_mask.get_mut(location) {
                *flag = char_match != 0;
            }

            let mut state = ((bits[j + 1] << 1) | 1) & char_match;
            if errors > 0 {
                let prev_next = last_bits.get(j + 1).copied().unwrap_or(0);
                let prev = last_bits.get(j).copied().unwrap_or(0);
                state |= ((prev_next | prev) << 1) | 1 | prev_next;
            }
            bits[j] = state;

            if state & terminal != 0 {
                final_score = calculate_score(pattern_len, errors, location, distance);

                if final_score <= threshold {
                    threshold = final_score;
                    best_location = Some(location);

                    if location <= EXPECTED_LOCATION {
                        break;
                    }
                    start = (2 * EXPECTED_LOCATION).saturating_sub(location).max(1);
                }
            }

            j -= 1;
        }

        // One more error cannot beat what we have
        if calculate_score(pattern_len, errors + 1, EXPECTED_LOCATION, distance) > threshold {
            break;
        }

        last_bits = bits;
    }

    let score = final_score.max(MIN_SCORE);

    match best_location {
        Some(_) => ChunkMatch::Hit {
            score,
            ranges: mask_to_ranges(&match_mask, params.min_match),
        },
        None => ChunkMatch::Miss { score },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MatchParams {
        MatchParams::default()
    }

    fn chunk(query: &str) -> Chunk {
        Chunk::split(query).remove(0)
    }

    #[test]
    fn test_score_formula() {
        assert_eq!(calculate_score(4, 0, 0, 100.0), 0.0);
        assert_eq!(calculate_score(4, 1, 0, 100.0), 0.25);
        assert!((calculate_score(4, 1, 10, 100.0) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_score_formula_zero_distance() {
        assert_eq!(calculate_score(4, 2, 0, 0.0), 0.5);
        assert_eq!(calculate_score(4, 0, 3, 0.0), 1.0);
    }

    #[test]
    fn test_mask_to_ranges() {
        let mask = [true, true, false, true, false, false, true, true, true];
        assert_eq!(mask_to_ranges(&mask, 1), vec![[0, 1], [3, 3], [6, 8]]);
        assert_eq!(mask_to_ranges(&mask, 2), vec![[0, 1], [6, 8]]);
        assert_eq!(mask_to_ranges(&mask, 3), vec![[6, 8]]);
        assert!(mask_to_ranges(&[], 1).is_empty());
        assert!(mask_to_ranges(&[false, false], 1).is_empty());
    }

    #[test]
    fn test_exact_substring_hit() {
        let candidate = Candidate::new("hello world");
        let result = search(&candidate, &chunk("world"), &params());

        assert!(result.is_hit());
        // found at offset 6: 6 / 100, well above the floor
        assert!((result.score() - 0.06).abs() < 1e-9);
        match result {
            ChunkMatch::Hit { ranges, .. } => assert!(ranges.contains(&[6, 10])),
            ChunkMatch::Miss { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_exact_prefix_is_floored() {
        let candidate = Candidate::new("abc");
        let result = search(&candidate, &chunk("ab"), &params());
        assert!(result.is_hit());
        assert_eq!(result.score(), MIN_SCORE);
    }

    #[test]
    fn test_single_typo_hit() {
        let candidate = Candidate::new("algorithm");
        let result = search(&candidate, &chunk("algoritm"), &params());
        assert!(result.is_hit());
        assert!(result.score() > MIN_SCORE);
        assert!(result.score() <= 0.6);
    }

    #[test]
    fn test_unrelated_miss() {
        let candidate = Candidate::new("b");
        let result = search(&candidate, &chunk("a"), &params());
        assert_eq!(result, ChunkMatch::Miss { score: 1.0 });
    }

    #[test]
    fn test_zero_threshold_requires_exact() {
        let strict = MatchParams {
            threshold: 0.0,
            ..MatchParams::default()
        };
        assert!(!search(&Candidate::new("algorithm"), &chunk("algoritm"), &strict).is_hit());
        assert!(search(&Candidate::new("algorithm"), &chunk("algo"), &strict).is_hit());
    }

    #[test]
    fn test_pattern_longer_than_text() {
        let candidate = Candidate::new("ab");
        let result = search(&candidate, &chunk("abcdefgh"), &params());
        assert!(!result.is_hit());
    }

    #[test]
    fn test_full_width_pattern() {
        let text = "the quick brown fox jumps over the lazy dog";
        let pattern = &text[4..36];
        let result = search(&Candidate::new(text), &chunk(pattern), &params());
        assert!(result.is_hit());
    }

    #[test]
    fn test_multibyte_positions_are_chars() {
        let candidate = Candidate::new("żółw i kot");
        let result = search(&candidate, &chunk("kot"), &params());
        match result {
            ChunkMatch::Hit { ranges, .. } => assert!(ranges.contains(&[7, 9])),
            ChunkMatch::Miss { .. } => panic!("expected a hit"),
        }
    }
}
