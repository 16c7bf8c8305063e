//! Speech playback synchronization engine.
//!
//! Owns the play/pause/resume/stop state machine and resolves backend
//! boundary events into word indices the rendering layer can highlight.

mod backend;
mod boundary;
mod driver;
mod error;
mod machine;

#[cfg(test)]
mod tests;

pub use backend::{BackendErrorKind, BackendEvent, BoundaryKind, SpeakRequest, SpeechBackend};
pub use boundary::{MatchMode, resolve_word_index};
pub use driver::{EngineSnapshot, PlaybackPhase, SpeechEngine};
pub use error::EngineError;
pub use machine::EngineConfig;
