// ── Session data model ──────────────────────────────────────────────────────
pub mod types;

// ── Registry ────────────────────────────────────────────────────────────────
pub mod store;

// ── Turn pipeline ───────────────────────────────────────────────────────────
pub mod orchestrator;

pub use orchestrator::{Orchestrator, TurnReceipt};
pub use store::{InMemorySessionStore, SessionHandle, SessionStore};
pub use types::{Session, SessionId, Turn};
