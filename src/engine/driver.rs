//! Async driver for the playback state machine.
//!
//! One task owns the machine and reacts to three channels: user commands,
//! backend notifications and timer firings. Effects are executed against the
//! backend and the resulting state is republished over a watch channel, so
//! callers treat `play()` as fire-and-forget and observe it only through the
//! snapshot.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::backend::{BackendEvent, SpeechBackend};
use crate::engine::error::EngineError;
use crate::engine::machine::{Action, Command, EngineConfig, PlayParams, PlaybackMachine, Timer};
use crate::voice::VoiceCatalog;

/// Coarse playback phase exposed to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Read-only state snapshot published by the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineSnapshot {
    pub phase: PlaybackPhase,
    /// Index of the word currently being spoken, if any.
    pub current_word: Option<usize>,
    /// Whether the last requested language has a usable voice.
    pub voice_available: bool,
    /// Whether speech synthesis exists in this runtime at all.
    pub supported: bool,
    /// One-shot notice for the most recent fatal playback error.
    pub last_error: Option<EngineError>,
}

impl EngineSnapshot {
    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.phase == PlaybackPhase::Paused
    }
}

/// Public handle to the synchronization engine.
///
/// Commands never fail synchronously; all outcomes are reported through the
/// snapshot channel.
pub struct SpeechEngine {
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<EngineSnapshot>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl SpeechEngine {
    /// Spawn the driver task over `backend`, consuming its event channel.
    pub fn new(backend: Arc<dyn SpeechBackend>, events: mpsc::Receiver<BackendEvent>, config: EngineConfig) -> Self {
        let supported = backend.is_available();
        if !supported {
            info!("Speech backend '{}' reports synthesis unavailable", backend.name());
        }

        let (command_tx, command_rx) = mpsc::channel(16);
        let machine = PlaybackMachine::new(config, supported);
        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot_of(&machine));
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(drive(backend, machine, command_rx, events, snapshot_tx, shutdown.clone()));

        Self { command_tx, snapshot_rx, shutdown, task }
    }

    /// Request playback of `text` in `language` at `rate`. Fire-and-forget.
    pub async fn play(&self, text: &str, language: &str, rate: f32) {
        self.send(Command::Play(PlayParams { text: text.to_string(), language: language.to_string(), rate })).await;
    }

    pub async fn pause(&self) {
        self.send(Command::Pause).await;
    }

    pub async fn resume(&self) {
        self.send(Command::Resume).await;
    }

    pub async fn stop(&self) {
        self.send(Command::Stop).await;
    }

    async fn send(&self, command: Command) {
        if self.command_tx.send(command).await.is_err() {
            debug!("Engine task gone, command dropped");
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshot updates (for rendering layers).
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Stop the driver task and wait for it to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.task.await;
    }
}

fn snapshot_of(machine: &PlaybackMachine) -> EngineSnapshot {
    EngineSnapshot {
        phase: if machine.is_paused() {
            PlaybackPhase::Paused
        } else if machine.is_playing() {
            PlaybackPhase::Playing
        } else {
            PlaybackPhase::Idle
        },
        current_word: machine.current_word(),
        voice_available: machine.voice_available(),
        supported: machine.supported(),
        last_error: machine.last_error(),
    }
}

/// Driver loop: feed the machine, execute its actions, publish state.
async fn drive(
    backend: Arc<dyn SpeechBackend>,
    mut machine: PlaybackMachine,
    mut command_rx: mpsc::Receiver<Command>,
    mut events: mpsc::Receiver<BackendEvent>,
    snapshot_tx: watch::Sender<EngineSnapshot>,
    shutdown: CancellationToken,
) {
    // Timer firings loop back through their own channel so stale timers are
    // judged against the machine's current epoch, never against task-local
    // state.
    let (timer_tx, mut timer_rx) = mpsc::channel::<Timer>(16);

    let initial = backend.voices();
    let mut catalog = if initial.is_empty() {
        Arc::new(VoiceCatalog::pending())
    } else {
        Arc::new(VoiceCatalog::loaded(initial, &VoiceCatalog::pending()))
    };
    debug!("Initial voice catalog: {} voice(s)", catalog.voices().len());

    loop {
        let actions = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Engine driver shutting down");
                backend.cancel().await;
                break;
            }
            command = command_rx.recv() => match command {
                Some(command) => machine.handle_command(command, &catalog),
                None => {
                    debug!("Command channel closed");
                    break;
                }
            },
            event = events.recv() => match event {
                Some(BackendEvent::VoicesChanged) => {
                    catalog = Arc::new(VoiceCatalog::loaded(backend.voices(), &catalog));
                    machine.on_catalog(&catalog);
                    Vec::new()
                }
                Some(event) => {
                    machine.on_event(event);
                    Vec::new()
                }
                None => {
                    debug!("Backend event channel closed");
                    break;
                }
            },
            timer = timer_rx.recv() => match timer {
                Some(timer) => machine.on_timer(timer, &catalog),
                None => break,
            },
        };

        for action in actions {
            match action {
                Action::Speak(request) => {
                    info!("🔊 Speaking with {} ({})", request.voice.name, request.language);
                    backend.speak(request).await;
                }
                Action::Pause => backend.pause().await,
                Action::Resume => backend.resume().await,
                Action::Cancel => backend.cancel().await,
                Action::Schedule { delay, timer } => {
                    let timer_tx = timer_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = timer_tx.send(timer).await;
                    });
                }
            }
        }

        snapshot_tx.send_if_modified(|current| {
            let next = snapshot_of(&machine);
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
