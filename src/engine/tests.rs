//! End-to-end tests: the engine driver running against the simulated
//! backend, observed only through the published snapshot — exactly how a
//! rendering layer consumes it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;

use crate::engine::{EngineConfig, EngineSnapshot, PlaybackPhase, SpeechBackend, SpeechEngine};
use crate::sim::{SimConfig, SimSynthesizer};

const SAMPLE: &str = "India is building a sustainable future";

fn fast_engine_config() -> EngineConfig {
    EngineConfig { respeak_delay: Duration::from_millis(10), catalog_retry_delay: Duration::from_millis(10), ..EngineConfig::default() }
}

fn fast_sim_config() -> SimConfig {
    SimConfig { word_duration: Duration::from_millis(5), ..SimConfig::default() }
}

fn engine_with(sim: SimConfig) -> SpeechEngine {
    let (backend, events) = SimSynthesizer::new(sim);
    let backend: Arc<dyn SpeechBackend> = backend;
    SpeechEngine::new(backend, events, fast_engine_config())
}

async fn wait_until(rx: &mut watch::Receiver<EngineSnapshot>, what: &str, predicate: impl Fn(&EngineSnapshot) -> bool) -> EngineSnapshot {
    timeout(Duration::from_secs(5), rx.wait_for(|s| predicate(s)))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", what))
        .expect("engine task dropped the snapshot channel")
        .clone()
}

#[tokio::test]
async fn test_full_playback_lifecycle() {
    let engine = engine_with(SimConfig { word_duration: Duration::from_millis(25), ..SimConfig::default() });
    let mut rx = engine.subscribe();

    engine.play(SAMPLE, "en-IN", 1.0).await;

    // Start notification produces the optimistic initial highlight.
    let snapshot = wait_until(&mut rx, "playback start", |s| s.is_playing() && s.current_word.is_some()).await;
    assert_eq!(snapshot.current_word, Some(0));
    assert!(snapshot.voice_available);

    // The highlight advances past "building" (index 2).
    wait_until(&mut rx, "highlight to advance", |s| s.current_word.is_some_and(|w| w >= 2)).await;

    // Natural completion returns to idle with no highlight and no error.
    let done = wait_until(&mut rx, "playback end", |s| s.phase == PlaybackPhase::Idle).await;
    assert_eq!(done.current_word, None);
    assert!(done.last_error.is_none());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_pause_freezes_highlight_and_resume_completes() {
    let engine = engine_with(SimConfig { word_duration: Duration::from_millis(20), ..SimConfig::default() });
    let mut rx = engine.subscribe();

    engine.play(SAMPLE, "en-IN", 1.0).await;
    wait_until(&mut rx, "playback start", |s| s.is_playing()).await;

    engine.pause().await;
    wait_until(&mut rx, "pause", |s| s.is_paused()).await;

    // Let any boundary already in flight drain, then the highlight holds
    // still because the paused backend emits nothing.
    tokio::time::sleep(Duration::from_millis(60)).await;
    let frozen = engine.snapshot().current_word;
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(engine.snapshot().current_word, frozen);
    assert!(engine.snapshot().is_paused());

    engine.resume().await;
    wait_until(&mut rx, "resume", |s| s.is_playing()).await;
    let done = wait_until(&mut rx, "completion after resume", |s| s.phase == PlaybackPhase::Idle).await;
    assert!(done.last_error.is_none());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_stop_resets_to_idle() {
    let engine = engine_with(SimConfig { word_duration: Duration::from_millis(50), ..SimConfig::default() });
    let mut rx = engine.subscribe();

    engine.play(SAMPLE, "en-IN", 1.0).await;
    wait_until(&mut rx, "playback start", |s| s.is_playing()).await;

    engine.stop().await;
    let stopped = wait_until(&mut rx, "stop", |s| s.phase == PlaybackPhase::Idle).await;
    assert_eq!(stopped.current_word, None);
    assert!(stopped.last_error.is_none());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_superseding_play_lands_on_new_text() {
    let engine = engine_with(SimConfig { word_duration: Duration::from_millis(30), ..SimConfig::default() });
    let mut rx = engine.subscribe();

    engine.play("the first rather long utterance keeps going", "en-IN", 1.0).await;
    wait_until(&mut rx, "first playback", |s| s.is_playing()).await;

    // Supersede mid-utterance. The cancelled utterance's interrupted error
    // must not disturb the replacement session.
    engine.play("short second text", "en-IN", 1.0).await;
    let restarted = wait_until(&mut rx, "second start", |s| s.is_playing() && s.current_word == Some(0)).await;
    assert!(restarted.last_error.is_none());

    let done = wait_until(&mut rx, "second completion", |s| s.phase == PlaybackPhase::Idle).await;
    assert!(done.last_error.is_none());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_play_waits_for_delayed_catalog() {
    // Catalog loads well inside the retry budget (4 retries, 10ms apart).
    let engine = engine_with(SimConfig { catalog_delay: Some(Duration::from_millis(15)), ..fast_sim_config() });
    let mut rx = engine.subscribe();

    // Issued before the catalog load completes; retried internally.
    engine.play(SAMPLE, "en-IN", 1.0).await;

    wait_until(&mut rx, "retried playback start", |s| s.is_playing()).await;
    let done = wait_until(&mut rx, "playback end", |s| s.phase == PlaybackPhase::Idle).await;
    assert!(done.last_error.is_none());
    assert!(done.voice_available);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_stop_cancels_pending_catalog_retry() {
    let engine = engine_with(SimConfig { catalog_delay: Some(Duration::from_millis(40)), ..fast_sim_config() });

    engine.play(SAMPLE, "en-IN", 1.0).await;
    engine.stop().await;

    // Give the catalog time to load and any stale retry time to fire.
    tokio::time::sleep(Duration::from_millis(120)).await;
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, PlaybackPhase::Idle);
    assert_eq!(snapshot.current_word, None);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_missing_voice_flags_unavailable() {
    let engine = engine_with(fast_sim_config());
    let mut rx = engine.subscribe();

    engine.play("bonjour tout le monde", "fr-FR", 1.0).await;
    let snapshot = wait_until(&mut rx, "voice availability", |s| !s.voice_available).await;
    assert_eq!(snapshot.phase, PlaybackPhase::Idle);
    assert!(matches!(snapshot.last_error, Some(crate::engine::EngineError::VoiceUnavailable { .. })));

    engine.shutdown().await;
}

#[tokio::test]
async fn test_unsupported_backend_disables_play() {
    let engine = engine_with(SimConfig { available: false, ..fast_sim_config() });

    assert!(!engine.snapshot().supported);
    engine.play(SAMPLE, "en-IN", 1.0).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.snapshot().phase, PlaybackPhase::Idle);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_sparse_boundaries_still_reach_the_end() {
    let engine = engine_with(SimConfig { boundary_stride: 3, word_duration: Duration::from_millis(20), ..SimConfig::default() });
    let mut rx = engine.subscribe();

    engine.play(SAMPLE, "en-IN", 1.0).await;
    wait_until(&mut rx, "playback start", |s| s.is_playing()).await;
    wait_until(&mut rx, "highlight past first word", |s| s.current_word.is_some_and(|w| w >= 3)).await;
    let done = wait_until(&mut rx, "playback end", |s| s.phase == PlaybackPhase::Idle).await;
    assert!(done.last_error.is_none());

    engine.shutdown().await;
}
