//! Immutable character profiles.
//!
//! A [`Persona`] is loaded once, shared by reference across sessions, and
//! never mutated by the transition engine or the synthesizer. The guarded
//! topic table drives both the openness descriptor text and the
//! pressure/refusal detection in `state::signal`.

use crate::error::PersonaError;
use crate::state::OpennessLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A topic the character will not discuss until a given openness level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardedTopic {
    /// Human-readable topic name used in descriptors and refusal thoughts.
    pub topic: String,
    /// Lowercase keywords that mark a message as touching this topic.
    pub keywords: Vec<String>,
    /// First level at which the topic may be discussed.
    pub unlocked_at: OpennessLevel,
}

/// Immutable character background referenced by both model-call stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub background: String,
    pub presenting_problem: String,
    #[serde(default)]
    pub speech_style: String,
    #[serde(default)]
    pub guarded_topics: Vec<GuardedTopic>,
}

impl Persona {
    pub fn from_toml_str(raw: &str) -> Result<Self, PersonaError> {
        toml::from_str(raw).map_err(|e| PersonaError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, PersonaError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PersonaError::Load(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Topics still off the table at `level`.
    pub fn undisclosed_at(&self, level: OpennessLevel) -> Vec<&GuardedTopic> {
        self.guarded_topics
            .iter()
            .filter(|topic| topic.unlocked_at > level)
            .collect()
    }

    /// Openness descriptor for a state at `level`: what stays undisclosed and
    /// the reply length bound.
    pub fn describe_openness(&self, level: OpennessLevel) -> String {
        let cap = level.max_sentences();
        let undisclosed = self.undisclosed_at(level);
        if undisclosed.is_empty() {
            format!("open to discuss most topics; replies up to {cap} sentences")
        } else {
            let topics: Vec<&str> = undisclosed
                .iter()
                .map(|topic| topic.topic.as_str())
                .collect();
            format!(
                "will not discuss: {}; replies capped at {cap} sentence{}",
                topics.join(", "),
                if cap == 1 { "" } else { "s" }
            )
        }
    }
}
