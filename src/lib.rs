#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

//! Cognitive-state driven character simulation for dialogue training.
//!
//! A simulated client holds an explicit [`state::CognitiveState`] that only
//! moves along the openness ladder under deterministic pacing rules; the
//! language model behind [`gateway::Gateway`] supplies texture (inner
//! thoughts, emotions, the visible reply) but never decides disclosure.

pub mod config;
pub mod error;
pub mod gateway;
pub mod persona;
pub mod prompt;
pub mod session;
pub mod state;
pub mod synth;

pub use config::Config;
pub use error::{CogniError, Result};
pub use persona::Persona;
pub use session::{Orchestrator, SessionId, TurnReceipt};
pub use state::{CognitiveState, OpennessLevel};
