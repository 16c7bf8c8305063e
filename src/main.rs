//! readalong - read text aloud with a synchronized word highlight.
//!
//! Drives the playback synchronization engine against a simulated speech
//! backend and renders the currently-spoken word in the terminal. The engine
//! itself is backend-agnostic: anything implementing `SpeechBackend` and
//! emitting start/boundary/end/error events can sit behind it.

mod config;
mod engine;
mod sim;
mod text;
mod voice;

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use config::AppConfig;
use engine::{EngineSnapshot, PlaybackPhase, SpeechBackend, SpeechEngine};
use sim::SimSynthesizer;
use text::{WordTable, segment};

/// Render the text with the currently-spoken word in reverse video.
fn render_highlight(table: &WordTable, snapshot: &EngineSnapshot) {
    let mut line = String::new();
    for unit in table {
        if !line.is_empty() {
            line.push(' ');
        }
        if snapshot.current_word == Some(unit.index) {
            line.push_str("\x1b[7m");
            line.push_str(&unit.text);
            line.push_str("\x1b[0m");
        } else {
            line.push_str(&unit.text);
        }
    }
    print!("\r\x1b[2K{}", line);
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_args();

    // Respect RUST_LOG env var, fallback to verbose flag, default to info.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| if config.verbose { EnvFilter::try_new("debug") } else { EnvFilter::try_new("info") })
        .unwrap();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("📖 readalong v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!("❌ Configuration error: {}", e);
        std::process::exit(1);
    }
    config.log_config();

    let text = config.resolve_text()?;
    let table = segment(&text);
    if table.is_empty() {
        error!("❌ Nothing to read");
        std::process::exit(1);
    }

    let (backend, events) = SimSynthesizer::new(config.sim_config());
    let backend: Arc<dyn SpeechBackend> = backend;
    let engine = SpeechEngine::new(backend, events, config.engine_config());
    let mut snapshots = engine.subscribe();

    engine.play(&text, &config.language, config.rate).await;

    let mut started = false;
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!();
                info!("🛑 Received Ctrl+C, stopping...");
                engine.stop().await;
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();

                if !snapshot.supported {
                    error!("❌ Speech synthesis is not available");
                    break;
                }
                if !snapshot.voice_available {
                    error!("❌ No voice available for {}. Install the language in your OS.", config.language);
                    break;
                }
                if let Some(e) = &snapshot.last_error {
                    println!();
                    error!("❌ {}", e);
                    break;
                }

                if snapshot.is_playing() || snapshot.is_paused() {
                    started = true;
                    render_highlight(&table, &snapshot);
                } else if started && snapshot.phase == PlaybackPhase::Idle {
                    println!();
                    info!("✅ Finished reading {} words", table.len());
                    break;
                }
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}
