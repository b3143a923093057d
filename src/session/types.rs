use crate::persona::Persona;
use crate::state::CognitiveState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Opaque session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One committed exchange: the incoming message, the state it produced, and
/// the visible reply. Immutable once appended; the prior state is the
/// preceding turn's `state` (or the bootstrap state for the first turn).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub turn_index: u64,
    pub incoming_message: String,
    pub state: CognitiveState,
    pub reply: String,
    pub created_at: DateTime<Utc>,
}

/// One conversation: the append-only turn log plus the current state.
///
/// The current state always equals the last turn's state, or the bootstrap
/// state when no turns exist.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub persona: Arc<Persona>,
    pub state: CognitiveState,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(persona: Arc<Persona>) -> Self {
        let descriptor = persona.describe_openness(crate::state::OpennessLevel::Closed);
        Self {
            id: SessionId::new(),
            persona,
            state: CognitiveState::bootstrap(descriptor),
            turns: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The trailing history window handed to each model call.
    pub fn recent_turns(&self, window: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(window);
        &self.turns[start..]
    }

    /// How many of the last `window` turns advanced the openness level.
    pub fn recent_advances(&self, window: usize) -> u32 {
        let start = self.turns.len().saturating_sub(window);
        (start..self.turns.len())
            .filter(|&i| {
                let prior_level = if i == 0 {
                    crate::state::OpennessLevel::Closed
                } else {
                    self.turns[i - 1].state.openness_level
                };
                self.turns[i].state.openness_level > prior_level
            })
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::OpennessLevel;

    fn persona() -> Arc<Persona> {
        Arc::new(Persona {
            name: "Madam Chan".into(),
            background: "bg".into(),
            presenting_problem: "problem".into(),
            speech_style: String::new(),
            guarded_topics: vec![],
        })
    }

    fn push_turn(session: &mut Session, level: OpennessLevel) {
        let index = session.turns.len() as u64 + 1;
        let mut state = session.state.clone();
        state.openness_level = level;
        state.turn_index = index;
        session.turns.push(Turn {
            turn_index: index,
            incoming_message: "msg".into(),
            state: state.clone(),
            reply: "reply".into(),
            created_at: Utc::now(),
        });
        session.state = state;
    }

    #[test]
    fn new_session_bootstraps_closed() {
        let session = Session::new(persona());
        assert_eq!(session.state.openness_level, OpennessLevel::Closed);
        assert_eq!(session.state.turn_index, 0);
        assert!(session.turns.is_empty());
    }

    #[test]
    fn recent_turns_clamps_to_window() {
        let mut session = Session::new(persona());
        for _ in 0..5 {
            push_turn(&mut session, OpennessLevel::Closed);
        }
        assert_eq!(session.recent_turns(3).len(), 3);
        assert_eq!(session.recent_turns(10).len(), 5);
    }

    #[test]
    fn recent_advances_counts_level_increases() {
        let mut session = Session::new(persona());
        push_turn(&mut session, OpennessLevel::Cautious);
        push_turn(&mut session, OpennessLevel::TentativelyOpen);
        assert_eq!(session.recent_advances(2), 2);
        push_turn(&mut session, OpennessLevel::TentativelyOpen);
        assert_eq!(session.recent_advances(2), 1);
        assert_eq!(session.recent_advances(3), 2);
    }

    #[test]
    fn first_turn_advance_is_measured_against_bootstrap() {
        let mut session = Session::new(persona());
        push_turn(&mut session, OpennessLevel::Cautious);
        assert_eq!(session.recent_advances(2), 1);
    }
}
