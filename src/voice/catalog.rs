//! Voice descriptors and the process-wide catalog snapshot.

use serde::{Deserialize, Serialize};

/// A synthesis voice as reported by the speech backend.
///
/// The engine only reads these; it never mutates or fabricates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Human-readable voice name (e.g. "Microsoft Heera").
    pub name: String,
    /// BCP-47 style language tag (e.g. "en-IN", "hi-IN").
    pub language: String,
    /// Locally installed voices deliver the most reliable boundary events.
    pub local: bool,
}

impl Voice {
    pub fn new(name: &str, language: &str, local: bool) -> Self {
        Self { name: name.to_string(), language: language.to_string(), local }
    }

    /// Primary language subtag (text before the first region separator).
    pub fn primary_subtag(&self) -> &str {
        primary_subtag(&self.language)
    }
}

/// Extract the primary subtag of a language tag ("en-IN" -> "en").
pub(crate) fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Immutable snapshot of the backend's voice list.
///
/// Replaced wholesale when the backend reports a catalog change; readers
/// always see either the old or the new complete snapshot. `loaded`
/// distinguishes "initial asynchronous load still pending" from "loaded but
/// empty", which drives the play-retry path.
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    generation: u64,
    loaded: bool,
}

impl VoiceCatalog {
    /// An empty catalog whose initial load has not completed yet.
    pub fn pending() -> Self {
        Self::default()
    }

    /// A loaded snapshot superseding `previous`.
    pub fn loaded(voices: Vec<Voice>, previous: &VoiceCatalog) -> Self {
        Self { voices, generation: previous.generation + 1, loaded: true }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the initial asynchronous load has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}
