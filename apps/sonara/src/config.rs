//! # Tracker Configuration
//!
//! Settings for a tracking session, read from an optional TOML file.
//!
//! ```toml
//! target = 20
//! debounce_ms = 1000
//! min_hand_score = 0.5
//! count_hand_absence = false
//!
//! [detector]
//! command = "python3"
//! args = ["hand_detect.py", "--camera", "0"]
//! ```
//!
//! Every key is optional. Command-line flags override file values.

use serde::{Deserialize, Serialize};
use sonara_core::{
    CounterConfig, SonaraError,
    primitives::{DEFAULT_DEBOUNCE_MS, DEFAULT_MIN_HAND_SCORE, DEFAULT_TARGET},
};
use std::path::Path;

/// Maximum size of a configuration file (64 KiB).
const MAX_CONFIG_SIZE: u64 = 64 * 1024;

// =============================================================================
// CONFIG TYPES
// =============================================================================

/// How to start the external hand-landmark detector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    /// Program to run. It must print `READY` and then one JSON frame per line.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Settings for a tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Repetitions that complete a session.
    #[serde(default = "default_target")]
    pub target: u32,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Hands the detector is less sure about are ignored.
    #[serde(default = "default_min_hand_score")]
    pub min_hand_score: f32,
    #[serde(default)]
    pub count_hand_absence: bool,
    #[serde(default)]
    pub detector: DetectorConfig,
}

fn default_target() -> u32 {
    DEFAULT_TARGET
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_min_hand_score() -> f32 {
    DEFAULT_MIN_HAND_SCORE
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            debounce_ms: default_debounce_ms(),
            min_hand_score: default_min_hand_score(),
            count_hand_absence: false,
            detector: DetectorConfig::default(),
        }
    }
}

// =============================================================================
// LOADING AND VALIDATION
// =============================================================================

impl TrackerConfig {
    /// Read and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, SonaraError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            SonaraError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_SIZE {
            return Err(SonaraError::Config(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            SonaraError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SonaraError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| SonaraError::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SonaraError> {
        if self.target == 0 {
            return Err(SonaraError::Config(
                "target must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_hand_score) {
            return Err(SonaraError::Config(format!(
                "min_hand_score must be between 0 and 1, got {}",
                self.min_hand_score
            )));
        }
        let blank_command = self
            .detector
            .command
            .as_deref()
            .is_some_and(|command| command.trim().is_empty());
        if blank_command {
            return Err(SonaraError::Config(
                "detector.command must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply a command-line target, if any, and re-validate.
    pub fn with_target(mut self, target: Option<u32>) -> Result<Self, SonaraError> {
        if let Some(target) = target {
            self.target = target;
        }
        self.validate()?;
        Ok(self)
    }

    #[must_use]
    pub fn counter(&self) -> CounterConfig {
        CounterConfig {
            debounce_ms: self.debounce_ms,
            count_hand_absence: self.count_hand_absence,
        }
    }

    #[must_use]
    pub fn has_detector(&self) -> bool {
        self.detector.command.is_some()
    }
}

// =============================================================================
// TESTS
// =============================================================================
