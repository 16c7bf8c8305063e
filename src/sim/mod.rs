//! Simulated speech backend.
//!
//! Paces boundary events from the word table so the engine can be driven
//! end-to-end without a platform speech subsystem.

mod synthesizer;

pub use synthesizer::{SimConfig, SimSynthesizer};
