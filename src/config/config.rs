//! Application configuration and CLI argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::{EngineConfig, MatchMode};
use crate::sim::SimConfig;
use crate::voice::ResolverPolicy;

use super::samples;

/// Read-aloud demo configuration.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "readalong")]
#[command(author, version, about = "Read text aloud with a synchronized word highlight", long_about = None)]
pub struct AppConfig {
    /// Text to read aloud (defaults to the built-in sample for --language)
    pub text: Option<String>,

    /// Read the text from a file instead
    #[arg(long, short = 'f', conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// List languages with built-in sample text and exit
    #[arg(long)]
    pub list_languages: bool,

    /// Spoken language tag
    #[arg(long, short = 'l', env = "READALONG_LANGUAGE", default_value = "en-IN")]
    pub language: String,

    /// Speaking rate multiplier (0.5 = half speed, 2.0 = double)
    #[arg(long, short = 'r', default_value = "1.0", value_parser = parse_rate)]
    pub rate: f32,

    /// Boundary matching strategy: 'subsequent' snaps to the next word
    /// start, 'nearest' to the closest one
    #[arg(long, value_enum, default_value = "subsequent")]
    pub matching: MatchMode,

    /// Voice-name substring preferred when no local voice matches
    #[arg(long, default_value = "microsoft")]
    pub preferred_vendor: String,

    /// Simulated per-word speaking time in milliseconds at rate 1.0
    #[arg(long, default_value = "240")]
    pub word_duration_ms: u64,

    /// Emit a boundary event only for every Nth word (models engines with
    /// sparse notifications)
    #[arg(long, default_value = "1")]
    pub boundary_stride: usize,

    /// Delay the simulated voice catalog load by this many milliseconds
    #[arg(long)]
    pub catalog_delay_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl AppConfig {
    /// Parse configuration from command line arguments.
    pub fn from_args() -> Self {
        let config = Self::parse();

        if config.list_languages {
            samples::print_languages();
            std::process::exit(0);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            anyhow::bail!("Language tag must not be empty");
        }

        if self.boundary_stride == 0 {
            anyhow::bail!("Boundary stride must be at least 1");
        }

        if let Some(file) = &self.file
            && !file.exists()
        {
            anyhow::bail!("Text file not found: {}", file.display());
        }

        if self.text.is_none() && self.file.is_none() && samples::sample_for(&self.language).is_none() {
            anyhow::bail!("No built-in sample for '{}'; pass text or --file (see --list-languages)", self.language);
        }

        Ok(())
    }

    /// The text to read: explicit argument, file contents, or the built-in
    /// sample for the selected language.
    pub fn resolve_text(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(file) = &self.file {
            return std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()));
        }
        samples::sample_for(&self.language)
            .map(str::to_string)
            .with_context(|| format!("No built-in sample for '{}'", self.language))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            match_mode: self.matching,
            resolver: ResolverPolicy { preferred_vendor: self.preferred_vendor.clone(), ..ResolverPolicy::default() },
            ..EngineConfig::default()
        }
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            word_duration: Duration::from_millis(self.word_duration_ms),
            boundary_stride: self.boundary_stride,
            catalog_delay: self.catalog_delay_ms.map(Duration::from_millis),
            ..SimConfig::default()
        }
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        info!("  Language: {}", self.language);
        info!("  Rate: {}", self.rate);
        info!("  Matching: {:?}", self.matching);
        info!("  Word duration: {}ms", self.word_duration_ms);
        if self.boundary_stride > 1 {
            info!("  Boundary stride: {}", self.boundary_stride);
        }
        if let Some(delay) = self.catalog_delay_ms {
            info!("  Catalog delay: {}ms", delay);
        }
    }
}

/// Parse and validate the rate multiplier (0.1-10.0).
fn parse_rate(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid float", s))?;
    if (0.1..=10.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("rate must be between 0.1 and 10.0, got {}", value))
    }
}
