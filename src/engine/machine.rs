//! Playback state machine.
//!
//! Pure core of the engine: consumes user commands, backend events and timer
//! firings, mutates session state and emits `Action`s for the driver to
//! execute against the backend. Keeping it synchronous makes every race in
//! the command/event interleaving testable without a runtime.
//!
//! Every accepted play, stop and fatal reset bumps an epoch counter. Speak
//! requests, scheduled timers and backend events all carry the epoch they
//! were issued under, so anything belonging to a superseded session is
//! provably inert by a single comparison.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::backend::{BackendEvent, BoundaryKind, SpeakRequest};
use crate::engine::boundary::{MatchMode, resolve_word_index};
use crate::engine::error::EngineError;
use crate::text::{WordTable, segment};
use crate::voice::{ResolverPolicy, Voice, VoiceCatalog, resolve};

/// Neutral pitch and full volume are fixed for every utterance.
const NEUTRAL_PITCH: f32 = 1.0;
const FULL_VOLUME: f32 = 1.0;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Strategy for boundary offsets without exact containment.
    pub match_mode: MatchMode,
    /// Voice selection policy.
    pub resolver: ResolverPolicy,
    /// Delay between cancelling a superseded utterance and issuing the
    /// replacement speak request, so the backend does not silently drop it.
    pub respeak_delay: Duration,
    /// Delay before retrying a play that arrived while the voice catalog was
    /// still loading.
    pub catalog_retry_delay: Duration,
    /// Catalog retries before giving up and reporting the voice unavailable.
    pub max_catalog_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            resolver: ResolverPolicy::default(),
            respeak_delay: Duration::from_millis(100),
            catalog_retry_delay: Duration::from_millis(500),
            max_catalog_retries: 4,
        }
    }
}

/// User-facing commands fed into the machine.
#[derive(Debug, Clone)]
pub(crate) enum Command {
    Play(PlayParams),
    Pause,
    Resume,
    Stop,
}

/// Parameters of a play request, carried through catalog retries.
#[derive(Debug, Clone)]
pub(crate) struct PlayParams {
    pub text: String,
    pub language: String,
    pub rate: f32,
}

/// Deferred work scheduled by the machine; fired back via the driver.
#[derive(Debug, Clone)]
pub(crate) enum Timer {
    /// Issue the speak request once the superseded utterance has torn down.
    Respeak { epoch: u64, request: SpeakRequest },
    /// Retry a play that was waiting on the initial catalog load.
    CatalogRetry { epoch: u64, play: PlayParams, attempt: u32 },
}

/// Effects for the driver to execute.
#[derive(Debug, Clone)]
pub(crate) enum Action {
    Speak(SpeakRequest),
    Pause,
    Resume,
    Cancel,
    Schedule { delay: Duration, timer: Timer },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// `pending` until the backend's start notification arrives.
    Playing { pending: bool },
    Paused,
}

/// State owned by one in-flight play request.
#[derive(Debug)]
struct Session {
    utterance_id: u64,
    table: WordTable,
    current: Option<usize>,
}

pub(crate) struct PlaybackMachine {
    config: EngineConfig,
    supported: bool,
    phase: Phase,
    session: Option<Session>,
    /// Bumped on every accepted play, stop and fatal reset.
    epoch: u64,
    /// Language of the most recent play attempt, for catalog refreshes.
    last_language: Option<String>,
    voice_available: bool,
    last_error: Option<EngineError>,
}

impl PlaybackMachine {
    pub(crate) fn new(config: EngineConfig, supported: bool) -> Self {
        Self { config, supported, phase: Phase::Idle, session: None, epoch: 0, last_language: None, voice_available: true, last_error: None }
    }

    pub(crate) fn handle_command(&mut self, command: Command, catalog: &VoiceCatalog) -> Vec<Action> {
        match command {
            Command::Play(params) => self.handle_play(params, catalog),
            Command::Pause => self.handle_pause(),
            Command::Resume => self.handle_resume(),
            Command::Stop => self.handle_stop(),
        }
    }

    fn handle_play(&mut self, params: PlayParams, catalog: &VoiceCatalog) -> Vec<Action> {
        if !self.supported {
            debug!("Speech synthesis not available, ignoring play");
            self.last_error = Some(EngineError::Unsupported);
            return Vec::new();
        }

        // Rejected before anything is touched: an active utterance keeps
        // playing through an empty request.
        if params.text.trim().is_empty() {
            warn!("No text to speak");
            return Vec::new();
        }

        // An accepted play supersedes everything: pending timers, the active
        // session, and any in-flight utterance.
        self.epoch += 1;
        let had_active = self.session.take().is_some();
        self.phase = Phase::Idle;

        let mut actions = Vec::new();
        if had_active {
            actions.push(Action::Cancel);
        }

        self.last_language = Some(params.language.clone());
        self.last_error = None;

        actions.extend(self.try_start(params, catalog, 0, had_active));
        actions
    }

    /// Start a session if the catalog allows it, or schedule a retry.
    fn try_start(&mut self, params: PlayParams, catalog: &VoiceCatalog, attempt: u32, supersedes: bool) -> Vec<Action> {
        if !catalog.is_loaded() {
            if attempt >= self.config.max_catalog_retries {
                warn!("Voice catalog never loaded, giving up on {}", params.language);
                self.voice_available = false;
                self.last_error = Some(EngineError::VoiceUnavailable { language: params.language });
                return Vec::new();
            }
            debug!("Voice catalog not ready, retrying play (attempt {})", attempt + 1);
            return vec![Action::Schedule {
                delay: self.config.catalog_retry_delay,
                timer: Timer::CatalogRetry { epoch: self.epoch, play: params, attempt: attempt + 1 },
            }];
        }

        let Some(voice) = resolve(&params.language, catalog, &self.config.resolver) else {
            warn!("No voice available for {}. Install the language in your OS.", params.language);
            self.voice_available = false;
            self.last_error = Some(EngineError::VoiceUnavailable { language: params.language });
            return Vec::new();
        };
        self.voice_available = true;

        let table = segment(&params.text);
        info!("Words: {} | Language: {} | Voice: {} (local: {})", table.len(), params.language, voice.name, voice.local);

        let request = self.build_request(&params, voice);
        self.session = Some(Session { utterance_id: self.epoch, table, current: None });
        self.phase = Phase::Playing { pending: true };

        if supersedes {
            // The cancel is asynchronous on the backend side; speaking again
            // immediately risks the new utterance being silently dropped.
            vec![Action::Schedule { delay: self.config.respeak_delay, timer: Timer::Respeak { epoch: self.epoch, request } }]
        } else {
            vec![Action::Speak(request)]
        }
    }

    fn build_request(&self, params: &PlayParams, voice: Voice) -> SpeakRequest {
        SpeakRequest {
            utterance_id: self.epoch,
            text: params.text.clone(),
            language: params.language.clone(),
            voice,
            rate: params.rate,
            pitch: NEUTRAL_PITCH,
            volume: FULL_VOLUME,
        }
    }

    fn handle_pause(&mut self) -> Vec<Action> {
        match self.phase {
            Phase::Playing { .. } => {
                self.phase = Phase::Paused;
                info!("Speech paused");
                vec![Action::Pause]
            }
            _ => {
                debug!("Pause ignored outside playback");
                Vec::new()
            }
        }
    }

    fn handle_resume(&mut self) -> Vec<Action> {
        match self.phase {
            Phase::Paused => {
                self.phase = Phase::Playing { pending: false };
                info!("Speech resumed");
                vec![Action::Resume]
            }
            _ => {
                debug!("Resume ignored outside pause");
                Vec::new()
            }
        }
    }

    fn handle_stop(&mut self) -> Vec<Action> {
        // Bump even when idle so a pending catalog retry cannot resurrect.
        self.epoch += 1;
        let had_active = self.session.take().is_some();
        self.phase = Phase::Idle;
        if had_active {
            info!("Speech stopped");
            vec![Action::Cancel]
        } else {
            Vec::new()
        }
    }

    pub(crate) fn on_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Started { utterance_id } => {
                if self.is_current(utterance_id)
                    && let Phase::Playing { pending: true } = self.phase
                {
                    debug!("Speech started");
                    self.phase = Phase::Playing { pending: false };
                    if let Some(session) = self.session.as_mut() {
                        // Optimistic initial highlight before the first
                        // boundary event arrives.
                        session.current = Some(0);
                    }
                }
            }
            BackendEvent::Boundary { utterance_id, offset, kind, .. } => {
                if kind == BoundaryKind::Word && self.is_current(utterance_id) {
                    let mode = self.config.match_mode;
                    if let Some(session) = self.session.as_mut() {
                        session.current = resolve_word_index(offset, &session.table, mode);
                    }
                }
            }
            BackendEvent::Ended { utterance_id } => {
                if self.is_current(utterance_id) {
                    debug!("Speech ended");
                    self.session = None;
                    self.phase = Phase::Idle;
                }
            }
            BackendEvent::Errored { utterance_id, kind } => {
                if kind.is_transient_cancellation() {
                    // Expected fallout from our own cancel; the superseding
                    // transition already did all bookkeeping.
                    debug!("Ignoring transient cancellation ({})", kind);
                } else if self.is_current(utterance_id) {
                    warn!("Speech error: {}", kind);
                    self.session = None;
                    self.phase = Phase::Idle;
                    self.last_error = Some(EngineError::Playback { kind: kind.to_string() });
                }
            }
            BackendEvent::VoicesChanged => {
                // Handled by the driver, which refreshes the catalog snapshot
                // and calls `on_catalog`.
            }
        }
    }

    pub(crate) fn on_timer(&mut self, timer: Timer, catalog: &VoiceCatalog) -> Vec<Action> {
        match timer {
            Timer::Respeak { epoch, request } => {
                if epoch == self.epoch && self.is_current(request.utterance_id) {
                    // A pause issued during the debounce window applies to
                    // this utterance; speak first so the backend has
                    // something to pause.
                    if self.phase == Phase::Paused {
                        vec![Action::Speak(request), Action::Pause]
                    } else {
                        vec![Action::Speak(request)]
                    }
                } else {
                    debug!("Dropping stale deferred speak (epoch {})", epoch);
                    Vec::new()
                }
            }
            Timer::CatalogRetry { epoch, play, attempt } => {
                if epoch == self.epoch {
                    self.try_start(play, catalog, attempt, false)
                } else {
                    debug!("Dropping stale catalog retry (epoch {})", epoch);
                    Vec::new()
                }
            }
        }
    }

    /// Recompute voice availability against a fresh catalog snapshot.
    pub(crate) fn on_catalog(&mut self, catalog: &VoiceCatalog) {
        debug!("Voice catalog updated (generation {}, {} voices)", catalog.generation(), catalog.voices().len());
        if catalog.is_loaded()
            && let Some(language) = self.last_language.as_deref()
        {
            self.voice_available = resolve(language, catalog, &self.config.resolver).is_some();
            // A recovered catalog retires the stale missing-voice notice.
            if self.voice_available
                && matches!(self.last_error, Some(EngineError::VoiceUnavailable { .. }))
            {
                self.last_error = None;
            }
        }
    }

    fn is_current(&self, utterance_id: u64) -> bool {
        self.session.as_ref().is_some_and(|s| s.utterance_id == utterance_id)
    }

    pub(crate) fn is_playing(&self) -> bool {
        matches!(self.phase, Phase::Playing { .. })
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub(crate) fn current_word(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.current)
    }

    pub(crate) fn voice_available(&self) -> bool {
        self.voice_available
    }

    pub(crate) fn supported(&self) -> bool {
        self.supported
    }

    pub(crate) fn last_error(&self) -> Option<EngineError> {
        self.last_error.clone()
    }
}
