use crate::session::SessionId;
use crate::state::OpennessLevel;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `cognisim`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum CogniError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Model gateway ───────────────────────────────────────────────────
    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),

    // ── Cognitive state ─────────────────────────────────────────────────
    #[error("state: {0}")]
    State(#[from] StateError),

    // ── Reply policy ────────────────────────────────────────────────────
    #[error("policy: {0}")]
    Policy(#[from] PolicyError),

    // ── Session ─────────────────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Persona ─────────────────────────────────────────────────────────
    #[error("persona: {0}")]
    Persona(#[from] PersonaError),

    // ── Prompt / Template ───────────────────────────────────────────────
    #[error("prompt: {0}")]
    Prompt(#[from] PromptError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Model gateway errors ───────────────────────────────────────────────────

/// Failures at the text-completion boundary.
///
/// `Timeout` and `RateLimited` are transient and retried by
/// [`crate::gateway::ReliableGateway`]; `Malformed` is handled upstream by the
/// corrective re-ask paths and never retried at this layer.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway {gateway} timed out")]
    Timeout { gateway: String },

    #[error("gateway {gateway} rate-limited (retry after {retry_after_ms}ms)")]
    RateLimited { gateway: String, retry_after_ms: u64 },

    #[error("gateway {gateway} request failed: {message}")]
    Request { gateway: String, message: String },

    #[error("malformed completion output: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Transient failures worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Malformed(_))
    }
}

// ─── Cognitive state errors ─────────────────────────────────────────────────

/// A candidate state produced by the transition stage failed validation.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("openness level moved more than one step: {from} -> {to}")]
    LevelSkip { from: OpennessLevel, to: OpennessLevel },

    #[error("openness regressed more than one step: {from} -> {to}")]
    RegressionTooDeep { from: OpennessLevel, to: OpennessLevel },

    #[error("emotions must be non-empty")]
    EmptyEmotions,

    #[error("duplicate emotion label within one turn: {0}")]
    DuplicateEmotion(String),

    #[error("turn index {got}, expected {expected}")]
    TurnIndex { expected: u64, got: u64 },

    #[error("unexplained mood swing without an advance at {level}")]
    MoodSwing { level: OpennessLevel },

    #[error("brain output is not the expected JSON shape: {0}")]
    MalformedBrainOutput(String),
}

// ─── Reply policy errors ────────────────────────────────────────────────────

/// A candidate reply violated the disclosure policy for the turn's level.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("reply has {counted} sentences, cap for {level} is {max_sentences}")]
    TooLong {
        level: OpennessLevel,
        max_sentences: usize,
        counted: usize,
    },

    #[error("reply asks the counterpart a question: {snippet:?}")]
    ReciprocityQuestion { snippet: String },

    #[error("tone too helpful or energetic for {level}")]
    ToneMismatch { level: OpennessLevel },
}

// ─── Session errors ─────────────────────────────────────────────────────────

/// The turn stage that was in flight when a session-level failure surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TurnStage {
    Transition,
    Synthesis,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown session: {0}")]
    InvalidSession(SessionId),

    #[error("temporarily unavailable during {stage}: {source}")]
    TemporarilyUnavailable {
        stage: TurnStage,
        source: GatewayError,
    },
}

// ─── Persona errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("failed to read persona profile: {0}")]
    Load(String),

    #[error("failed to parse persona profile: {0}")]
    Parse(String),
}

// ─── Prompt / Template errors ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("template render failed: {0}")]
    Render(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, CogniError>;
