// ── Core types ──────────────────────────────────────────────────────────────
pub mod types;

// ── Deterministic scaffolding ───────────────────────────────────────────────
pub mod signal;
pub mod validate;

// ── Orchestrated transition ─────────────────────────────────────────────────
pub mod transition;

pub use signal::{MessageSignals, advance_strength, analyze};
pub use transition::{LevelDecision, TransitionEngine, TransitionOutcome, no_op_fallback};
pub use types::{CognitiveState, OpennessLevel};
pub use validate::validate_candidate;
