//! Engine-level error taxonomy.
//!
//! Only two failure classes cross the engine boundary: a missing voice for
//! the requested language (persistent flag) and a fatal playback error
//! (one-shot notice). Empty-text rejections, illegal-state commands and
//! self-inflicted cancellations are handled internally and never surfaced.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Speech capability is entirely absent in this runtime.
    #[error("speech synthesis is not available in this runtime")]
    Unsupported,

    /// No voice in the catalog matches the requested language.
    #[error("no voice available for language '{language}'")]
    VoiceUnavailable { language: String },

    /// The backend reported a non-transient playback failure.
    #[error("playback failed: {kind}")]
    Playback { kind: String },
}
