//! Simulated speech synthesizer.
//!
//! Implements the backend trait by walking the utterance's own word table on
//! a timer: `Started`, one word boundary per word (or every Nth word when a
//! sparse stride is configured), then `Ended`. Cancellation surfaces as an
//! `Errored { Interrupted }` event, mirroring how platform engines report a
//! superseded utterance. An optional catalog delay keeps `voices()` empty at
//! first and fires `VoicesChanged` later, reproducing the asynchronous voice
//! load the engine has to retry around.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::engine::{BackendErrorKind, BackendEvent, BoundaryKind, SpeakRequest, SpeechBackend};
use crate::text::segment;
use crate::voice::Voice;

/// Configuration for the simulated backend.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Voices the catalog reports once loaded.
    pub voices: Vec<Voice>,
    /// Time spent "speaking" one word at rate 1.0.
    pub word_duration: Duration,
    /// Emit a boundary only for every Nth word (1 = every word). Models
    /// engines with sparse boundary notifications.
    pub boundary_stride: usize,
    /// Delay before the voice catalog finishes its initial load. `None`
    /// loads it immediately.
    pub catalog_delay: Option<Duration>,
    /// Report synthesis as unavailable entirely.
    pub available: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { voices: default_voices(), word_duration: Duration::from_millis(240), boundary_stride: 1, catalog_delay: None, available: true }
    }
}

/// Voices covering the demo languages.
fn default_voices() -> Vec<Voice> {
    vec![
        Voice::new("Heera", "en-IN", true),
        Voice::new("Microsoft Hazel", "en-GB", false),
        Voice::new("Samantha", "en-US", false),
        Voice::new("Lekha", "hi-IN", true),
        Voice::new("Madhur", "mr-IN", false),
        Voice::new("Valluvar", "ta-IN", true),
        Voice::new("Chitra", "te-IN", false),
        Voice::new("Darshini", "gu-IN", false),
    ]
}

pub struct SimSynthesizer {
    events: mpsc::Sender<BackendEvent>,
    voices: Mutex<Vec<Voice>>,
    /// Token of the utterance currently being paced, if any.
    active: Mutex<Option<CancellationToken>>,
    paused_tx: watch::Sender<bool>,
    config: SimConfig,
}

impl SimSynthesizer {
    /// Build the backend and the event channel the engine will consume.
    pub fn new(config: SimConfig) -> (Arc<Self>, mpsc::Receiver<BackendEvent>) {
        let (events, events_rx) = mpsc::channel(64);
        let (paused_tx, _) = watch::channel(false);

        let initial_voices = if config.catalog_delay.is_some() { Vec::new() } else { config.voices.clone() };

        let backend = Arc::new(Self { events, voices: Mutex::new(initial_voices), active: Mutex::new(None), paused_tx, config });

        if let Some(delay) = backend.config.catalog_delay {
            let backend_for_load = backend.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                *backend_for_load.voices.lock() = backend_for_load.config.voices.clone();
                debug!("Voice catalog loaded ({} voices)", backend_for_load.config.voices.len());
                let _ = backend_for_load.events.send(BackendEvent::VoicesChanged).await;
            });
        }

        (backend, events_rx)
    }
}

#[async_trait]
impl SpeechBackend for SimSynthesizer {
    fn name(&self) -> &str {
        "sim"
    }

    fn is_available(&self) -> bool {
        self.config.available
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.lock().clone()
    }

    async fn speak(&self, request: SpeakRequest) {
        let token = CancellationToken::new();
        if let Some(previous) = self.active.lock().replace(token.clone()) {
            // The engine cancels before re-speaking; this is a safety net.
            previous.cancel();
        }
        let _ = self.paused_tx.send(false);

        let events = self.events.clone();
        let paused = self.paused_tx.subscribe();
        let stride = self.config.boundary_stride.max(1);
        let word_duration = self.config.word_duration.div_f32(request.rate.max(0.1));

        tokio::spawn(pace_utterance(request, events, paused, token, stride, word_duration));
    }

    async fn pause(&self) {
        let _ = self.paused_tx.send(true);
    }

    async fn resume(&self) {
        let _ = self.paused_tx.send(false);
    }

    async fn cancel(&self) {
        if let Some(token) = self.active.lock().take() {
            token.cancel();
        }
    }
}

/// Emit the event stream for one utterance: start, paced word boundaries,
/// then a terminal end or interrupted error.
async fn pace_utterance(
    request: SpeakRequest,
    events: mpsc::Sender<BackendEvent>,
    mut paused: watch::Receiver<bool>,
    token: CancellationToken,
    stride: usize,
    word_duration: Duration,
) {
    let id = request.utterance_id;
    let table = segment(&request.text);

    if events.send(BackendEvent::Started { utterance_id: id }).await.is_err() {
        warn!("Event channel closed before utterance {} started", id);
        return;
    }

    for unit in &table {
        // Gate on pause before each word; cancellation wins either way. The
        // read guard from `wait_for` must drop before the next await point,
        // so map it away inside the arm.
        tokio::select! {
            _ = token.cancelled() => {
                let _ = events.send(BackendEvent::Errored { utterance_id: id, kind: BackendErrorKind::Interrupted }).await;
                return;
            }
            result = async { paused.wait_for(|p| !*p).await.map(|_| ()) } => {
                if result.is_err() {
                    return;
                }
            }
        }

        if unit.index % stride == 0 {
            let event = BackendEvent::Boundary { utterance_id: id, offset: unit.start, length: unit.end - unit.start, kind: BoundaryKind::Word };
            if events.send(event).await.is_err() {
                return;
            }
        }

        tokio::select! {
            _ = token.cancelled() => {
                let _ = events.send(BackendEvent::Errored { utterance_id: id, kind: BackendErrorKind::Interrupted }).await;
                return;
            }
            _ = tokio::time::sleep(word_duration) => {}
        }
    }

    let _ = events.send(BackendEvent::Ended { utterance_id: id }).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str, rate: f32) -> SpeakRequest {
        SpeakRequest {
            utterance_id: 1,
            text: text.to_string(),
            language: "en-IN".to_string(),
            voice: Voice::new("Heera", "en-IN", true),
            rate,
            pitch: 1.0,
            volume: 1.0,
        }
    }

    fn fast_config() -> SimConfig {
        SimConfig { word_duration: Duration::from_millis(5), ..SimConfig::default() }
    }

    #[tokio::test]
    async fn test_emits_start_boundaries_end() {
        let (backend, mut events) = SimSynthesizer::new(fast_config());
        backend.speak(request("one two three", 1.0)).await;

        assert!(matches!(events.recv().await, Some(BackendEvent::Started { utterance_id: 1 })));

        let mut offsets = Vec::new();
        loop {
            match events.recv().await {
                Some(BackendEvent::Boundary { offset, kind: BoundaryKind::Word, .. }) => offsets.push(offset),
                Some(BackendEvent::Ended { utterance_id: 1 }) => break,
                other => panic!("unexpected event: {:?}", other),
            }
        }
        assert_eq!(offsets, vec![0, 4, 8]);
    }

    #[tokio::test]
    async fn test_cancel_reports_interrupted() {
        let (backend, mut events) = SimSynthesizer::new(SimConfig { word_duration: Duration::from_secs(5), ..SimConfig::default() });
        backend.speak(request("a very long utterance indeed", 1.0)).await;

        assert!(matches!(events.recv().await, Some(BackendEvent::Started { .. })));
        backend.cancel().await;

        loop {
            match events.recv().await {
                Some(BackendEvent::Errored { kind, .. }) => {
                    assert!(kind.is_transient_cancellation());
                    break;
                }
                Some(BackendEvent::Boundary { .. }) => continue,
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_pause_suspends_pacing_until_resume() {
        let (backend, mut events) = SimSynthesizer::new(fast_config());
        backend.speak(request("one two three four five", 1.0)).await;
        assert!(matches!(events.recv().await, Some(BackendEvent::Started { .. })));

        backend.pause().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Drain whatever was in flight when the pause landed; the utterance
        // must not have finished while paused.
        let mut ended = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, BackendEvent::Ended { .. }) {
                ended = true;
            }
        }
        assert!(!ended);

        backend.resume().await;
        loop {
            match events.recv().await {
                Some(BackendEvent::Ended { .. }) => break,
                Some(_) => continue,
                None => panic!("channel closed early"),
            }
        }
    }

    #[tokio::test]
    async fn test_sparse_stride_skips_boundaries() {
        let (backend, mut events) = SimSynthesizer::new(SimConfig { boundary_stride: 2, ..fast_config() });
        backend.speak(request("one two three four five", 1.0)).await;

        let mut boundary_count = 0;
        loop {
            match events.recv().await {
                Some(BackendEvent::Boundary { .. }) => boundary_count += 1,
                Some(BackendEvent::Ended { .. }) => break,
                Some(_) => continue,
                None => panic!("channel closed early"),
            }
        }
        assert_eq!(boundary_count, 3); // words 0, 2, 4
    }

    #[tokio::test]
    async fn test_delayed_catalog_fires_voices_changed() {
        let (backend, mut events) = SimSynthesizer::new(SimConfig { catalog_delay: Some(Duration::from_millis(10)), ..fast_config() });
        assert!(backend.voices().is_empty());

        assert!(matches!(events.recv().await, Some(BackendEvent::VoicesChanged)));
        assert!(!backend.voices().is_empty());
    }
}
