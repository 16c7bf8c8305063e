//! Word segmentation: maps utterance text to an ordered table of word units.
//!
//! A word unit is a maximal run of non-whitespace characters. Whitespace runs
//! of any length or script are discarded and never receive an index. Offsets
//! are byte offsets into the original text; backends that report offsets in
//! other units (e.g. UTF-16 code units) must convert before reaching the
//! boundary resolver.

use std::sync::LazyLock;

use regex::Regex;

/// Matches maximal non-whitespace runs.
static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("valid word pattern"));

/// A single addressable word in the utterance text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordUnit {
    /// Position in the word table (0-based).
    pub index: usize,
    /// The word text itself.
    pub text: String,
    /// Byte offset of the first character (inclusive).
    pub start: usize,
    /// Byte offset past the last character (exclusive).
    pub end: usize,
}

/// Ordered word units for the text currently being spoken.
///
/// Built once per accepted play request and immutable afterwards. Units are
/// ascending, non-overlapping and contiguous modulo whitespace.
pub type WordTable = Vec<WordUnit>;

/// Segment text into a word table.
///
/// Empty or whitespace-only input yields an empty table, which the playback
/// engine treats as "nothing to play". Segmenting the same text twice yields
/// identical offsets.
pub fn segment(text: &str) -> WordTable {
    WORD_PATTERN
        .find_iter(text)
        .enumerate()
        .map(|(index, m)| WordUnit { index, text: m.as_str().to_string(), start: m.start(), end: m.end() })
        .collect()
}
