//! Text segmentation for word-level highlighting.
//!
//! Splits utterance text into addressable word units with byte ranges.

mod segmenter;

pub use segmenter::{WordTable, WordUnit, segment};
