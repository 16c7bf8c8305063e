//! Speech backend abstraction and notification events.
//!
//! The backend is an opaque collaborator: commands are best-effort and have
//! no direct return value; effects are observed only through the event
//! channel handed to the engine at construction time. For one utterance the
//! backend emits `Started`, zero or more `Boundary` events and exactly one
//! terminal `Ended` or `Errored`.

use async_trait::async_trait;

use crate::voice::Voice;

/// A speak request issued by the playback state machine.
#[derive(Debug, Clone)]
pub struct SpeakRequest {
    /// Utterance id assigned by the engine; echoed back in every event.
    pub utterance_id: u64,
    /// Full text to synthesize.
    pub text: String,
    /// Language tag the voice was resolved for.
    pub language: String,
    /// Resolved voice descriptor.
    pub voice: Voice,
    /// Speaking rate multiplier (1.0 = normal).
    pub rate: f32,
    /// Voice pitch; the engine always requests neutral.
    pub pitch: f32,
    /// Output volume; the engine always requests full volume.
    pub volume: f32,
}

/// Granularity reported with a boundary event. Only word boundaries drive
/// highlighting; sentence/character events are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Word,
    Sentence,
    Character,
}

/// Terminal error classification for an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Utterance was cancelled by a superseding request or stop; benign.
    Interrupted,
    /// Utterance was cancelled before it started; benign.
    Canceled,
    /// Anything else the backend reports.
    Other(String),
}

impl BackendErrorKind {
    /// Self-inflicted cancellations are swallowed rather than surfaced.
    pub fn is_transient_cancellation(&self) -> bool {
        matches!(self, BackendErrorKind::Interrupted | BackendErrorKind::Canceled)
    }
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendErrorKind::Interrupted => write!(f, "interrupted"),
            BackendErrorKind::Canceled => write!(f, "canceled"),
            BackendErrorKind::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// Notifications delivered by the backend over its event channel.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// Synthesis of the utterance has audibly started.
    Started { utterance_id: u64 },
    /// A character offset was reached during synthesis. Offsets are byte
    /// offsets into the request text and are not guaranteed monotonic.
    Boundary { utterance_id: u64, offset: usize, length: usize, kind: BoundaryKind },
    /// The utterance finished naturally.
    Ended { utterance_id: u64 },
    /// The utterance terminated abnormally.
    Errored { utterance_id: u64, kind: BackendErrorKind },
    /// The voice catalog became available or changed; the engine should
    /// re-fetch `voices()`.
    VoicesChanged,
}

/// Core speech backend interface.
///
/// Implementations wrap a platform speech subsystem (or a simulation of one)
/// and push notifications into the event channel supplied at construction.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Whether speech synthesis is available at all in this runtime.
    fn is_available(&self) -> bool;

    /// Current voice list; may be empty before the asynchronous load
    /// completes (a later `VoicesChanged` signals availability).
    fn voices(&self) -> Vec<Voice>;

    /// Begin synthesizing an utterance. Any previously active utterance
    /// should already have been cancelled by the engine.
    async fn speak(&self, request: SpeakRequest);

    /// Suspend the active utterance, if any.
    async fn pause(&self);

    /// Resume a suspended utterance, if any.
    async fn resume(&self);

    /// Cancel the active utterance. The backend reports the cancellation as
    /// an `Errored` event with an interrupted/canceled kind.
    async fn cancel(&self);
}
