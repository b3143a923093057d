// ── Boundary ────────────────────────────────────────────────────────────────
pub mod traits;

// ── Decorator layers ────────────────────────────────────────────────────────
pub mod reliable;

// ── Implementations ─────────────────────────────────────────────────────────
pub mod openai;
pub mod scripted;

pub use openai::OpenAiGateway;
pub use reliable::ReliableGateway;
pub use scripted::ScriptedGateway;
pub use traits::{CompletionRequest, Gateway};
