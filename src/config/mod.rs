//! Configuration module for the read-aloud demo.
//!
//! Provides CLI argument parsing and the built-in sample texts.

#[allow(clippy::module_inception)]
mod config;
mod samples;

pub use config::AppConfig;
pub use samples::{print_languages, sample_for};
