//! Boundary-event-to-word-index resolution.
//!
//! Real engines report boundary offsets with platform-dependent granularity:
//! sometimes exactly at word starts, sometimes slightly before, sometimes
//! skipping words entirely. The resolver degrades gracefully instead of
//! desynchronizing visibly, and each event is resolved independently so a
//! non-monotonic offset stream never wedges the highlight.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::text::WordTable;

/// Strategy for mapping an offset with no exact containment to a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Snap to the first word starting after the offset (falling back to the
    /// last word). A highlight that lags by one word reads better than one
    /// that jumps erratically, so this is the default.
    #[default]
    Subsequent,
    /// Snap to the word whose start is nearest by absolute distance. Suits
    /// engines that report per-character progress rather than word starts.
    Nearest,
}

/// Map a reported character offset to a word index.
///
/// Returns `None` for an empty table; otherwise the result is always a valid
/// index into `table`. Exact containment (`start <= offset < end`) wins in
/// either mode.
pub fn resolve_word_index(offset: usize, table: &WordTable, mode: MatchMode) -> Option<usize> {
    if table.is_empty() {
        return None;
    }

    if let Some(unit) = table.iter().find(|u| u.start <= offset && offset < u.end) {
        return Some(unit.index);
    }

    let index = match mode {
        MatchMode::Subsequent => table.iter().find(|u| u.start > offset).map(|u| u.index).unwrap_or(table.len() - 1),
        MatchMode::Nearest => {
            table
                .iter()
                .min_by_key(|u| (u.start.abs_diff(offset), u.index))
                .map(|u| u.index)
                .unwrap_or(table.len() - 1)
        }
    };

    Some(index)
}
