use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.pacing.advance_threshold) {
            return Err(ConfigError::Validation(format!(
                "pacing.advance_threshold must be within [0, 1], got {}",
                self.pacing.advance_threshold
            )));
        }
        for (name, weight) in [
            ("validation_weight", self.pacing.validation_weight),
            ("question_weight", self.pacing.question_weight),
            ("streak_weight", self.pacing.streak_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::Validation(format!(
                    "pacing.{name} must be within [0, 1], got {weight}"
                )));
            }
        }
        if self.history.window == 0 {
            return Err(ConfigError::Validation(
                "history.window must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ── Disclosure pacing ────────────────────────────────────────────

/// Heuristic knobs for the advance signal. The source material gives no
/// numeric thresholds, so these are configuration, not hard-coded guesses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Minimum advance-signal strength for a one-step advance (default: 0.5)
    #[serde(default = "default_advance_threshold")]
    pub advance_threshold: f32,
    /// Strength contributed by a validating/de-escalating message
    #[serde(default = "default_validation_weight")]
    pub validation_weight: f32,
    /// Strength contributed by a gentle personal question
    #[serde(default = "default_question_weight")]
    pub question_weight: f32,
    /// Maximum strength contributed by the preceding calm streak
    #[serde(default = "default_streak_weight")]
    pub streak_weight: f32,
    /// Consecutive low-pressure turns required before any advance (default: 0)
    #[serde(default)]
    pub required_calm_streak: u32,
    /// Permit the one-step guarded retreat after invalidating messages
    #[serde(default = "default_true")]
    pub allow_retreat: bool,
}

fn default_advance_threshold() -> f32 {
    0.5
}

fn default_validation_weight() -> f32 {
    0.5
}

fn default_question_weight() -> f32 {
    0.3
}

fn default_streak_weight() -> f32 {
    0.2
}

fn default_true() -> bool {
    true
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            advance_threshold: default_advance_threshold(),
            validation_weight: default_validation_weight(),
            question_weight: default_question_weight(),
            streak_weight: default_streak_weight(),
            required_calm_streak: 0,
            allow_retreat: true,
        }
    }
}

// ── Gateway reliability ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Retries per stage after the first attempt (default: 2)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff in milliseconds, doubled per retry (default: 200)
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_backoff_ms() -> u64 {
    200
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
        }
    }
}

// ── History window ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of recent turns passed to each model call (default: 8)
    #[serde(default = "default_history_window")]
    pub window: usize,
}

fn default_history_window() -> usize {
    8
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window: default_history_window(),
        }
    }
}

// ── Model gateway endpoint ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// OpenAI-compatible base URL (default: `https://api.openai.com/v1`)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Temperature for the brain stage — higher for more varied inner life
    #[serde(default = "default_brain_temperature")]
    pub brain_temperature: f64,
    /// Temperature for the reply stage
    #[serde(default = "default_text_temperature")]
    pub text_temperature: f64,
    /// Per-request timeout in seconds (default: 60)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_brain_temperature() -> f64 {
    0.8
}

fn default_text_temperature() -> f64 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            brain_temperature: default_brain_temperature(),
            text_temperature: default_text_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
