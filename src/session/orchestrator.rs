//! The turn pipeline: one incoming message in, one committed turn out.
//!
//! Turns for a session are serialized on the session's own lock, and nothing
//! is written to the session until both stages have produced a validated
//! result, so a failed or cancelled turn leaves no partial state behind.

use super::store::{InMemorySessionStore, SessionStore};
use super::types::{Session, SessionId, Turn};
use crate::config::Config;
use crate::error::{CogniError, SessionError, TurnStage};
use crate::gateway::{Gateway, ReliableGateway};
use crate::persona::Persona;
use crate::prompt::PromptEngine;
use crate::state::{CognitiveState, LevelDecision, TransitionEngine};
use crate::synth::{ResponseSynthesizer, SynthesisOutcome, policy};
use chrono::Utc;
use std::sync::Arc;

/// What the caller gets back from one committed turn.
#[derive(Debug, Clone)]
pub struct TurnReceipt {
    pub session_id: SessionId,
    pub turn_index: u64,
    pub reply: String,
    pub state: CognitiveState,
    pub decision: LevelDecision,
}

/// Owns the session registry and both pipeline stages.
pub struct Orchestrator {
    store: InMemorySessionStore,
    transition: TransitionEngine,
    synthesizer: ResponseSynthesizer,
}

impl Orchestrator {
    /// Build the pipeline around a gateway. The gateway is wrapped in the
    /// retry layer here, so callers hand in the bare transport.
    pub fn new(gateway: Arc<dyn Gateway>, config: &Config) -> Result<Self, CogniError> {
        let reliable: Arc<dyn Gateway> =
            Arc::new(ReliableGateway::new(gateway, &config.reliability));
        let prompts = Arc::new(PromptEngine::with_defaults()?);
        Ok(Self {
            store: InMemorySessionStore::new(),
            transition: TransitionEngine::new(Arc::clone(&reliable), Arc::clone(&prompts), config),
            synthesizer: ResponseSynthesizer::new(reliable, prompts, config),
        })
    }

    /// Open a session bootstrapped at the closed posture.
    pub fn create_session(&self, persona: Arc<Persona>) -> SessionId {
        let session = Session::new(persona);
        let id = session.id;
        tracing::info!(session = %id, persona = session.persona.name.as_str(), "Session created");
        self.store.insert(session)
    }

    /// Run one full turn. Holds the session lock from read to commit;
    /// concurrent submissions for the same session queue behind it.
    pub async fn submit_message(
        &self,
        id: SessionId,
        message: &str,
    ) -> Result<TurnReceipt, SessionError> {
        let handle = self
            .store
            .handle(id)
            .ok_or(SessionError::InvalidSession(id))?;
        let mut session = handle.lock().await;

        let outcome = self
            .transition
            .next_state(&session, message)
            .await
            .map_err(|source| SessionError::TemporarilyUnavailable {
                stage: TurnStage::Transition,
                source,
            })?;

        let synthesis = if outcome.fallback {
            // The turn is already a no-op; do not consult the reply oracle.
            SynthesisOutcome {
                reply: policy::canned_deflection(outcome.state.openness_level).to_string(),
                canned: true,
            }
        } else {
            self.synthesizer
                .synthesize(&session, &outcome, message)
                .await
                .map_err(|source| SessionError::TemporarilyUnavailable {
                    stage: TurnStage::Synthesis,
                    source,
                })?
        };

        // Commit point: state and turn log change together or not at all.
        let turn = Turn {
            turn_index: outcome.state.turn_index,
            incoming_message: message.to_string(),
            state: outcome.state.clone(),
            reply: synthesis.reply.clone(),
            created_at: Utc::now(),
        };
        session.state = outcome.state;
        session.turns.push(turn);

        tracing::info!(
            session = %id,
            turn = session.state.turn_index,
            level = %session.state.openness_level,
            decision = %outcome.decision,
            canned = synthesis.canned,
            "Turn committed"
        );

        Ok(TurnReceipt {
            session_id: id,
            turn_index: session.state.turn_index,
            reply: synthesis.reply,
            state: session.state.clone(),
            decision: outcome.decision,
        })
    }

    /// Snapshot of the session's current cognitive state.
    pub async fn state(&self, id: SessionId) -> Result<CognitiveState, SessionError> {
        let handle = self
            .store
            .handle(id)
            .ok_or(SessionError::InvalidSession(id))?;
        let session = handle.lock().await;
        Ok(session.state.clone())
    }

    /// The full committed turn log, for transcript export and review.
    pub async fn export_turns(&self, id: SessionId) -> Result<Vec<Turn>, SessionError> {
        let handle = self
            .store
            .handle(id)
            .ok_or(SessionError::InvalidSession(id))?;
        let session = handle.lock().await;
        Ok(session.turns.clone())
    }

    pub fn end_session(&self, id: SessionId) -> bool {
        self.store.remove(id)
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.store.ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScriptedGateway;

    fn persona() -> Arc<Persona> {
        Arc::new(Persona {
            name: "Madam Chan".into(),
            background: "bg".into(),
            presenting_problem: "problem".into(),
            speech_style: String::new(),
            guarded_topics: vec![],
        })
    }

    #[tokio::test]
    async fn unknown_session_is_rejected_without_model_calls() {
        let orchestrator =
            Orchestrator::new(Arc::new(ScriptedGateway::new()), &Config::default()).unwrap();
        let err = orchestrator
            .submit_message(SessionId::new(), "Hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidSession(_)));
    }

    #[tokio::test]
    async fn one_turn_commits_state_and_log_together() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_reply("I'm fine.");
        let orchestrator = Orchestrator::new(gateway, &Config::default()).unwrap();
        let id = orchestrator.create_session(persona());

        let receipt = orchestrator.submit_message(id, "How are you?").await.unwrap();
        assert_eq!(receipt.turn_index, 1);
        assert_eq!(receipt.reply, "I'm fine.");

        let state = orchestrator.state(id).await.unwrap();
        assert_eq!(state.turn_index, 1);
        let turns = orchestrator.export_turns(id).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].incoming_message, "How are you?");
    }

    #[tokio::test]
    async fn ended_session_becomes_invalid() {
        let orchestrator =
            Orchestrator::new(Arc::new(ScriptedGateway::new()), &Config::default()).unwrap();
        let id = orchestrator.create_session(persona());
        assert!(orchestrator.end_session(id));
        assert!(matches!(
            orchestrator.submit_message(id, "still there?").await,
            Err(SessionError::InvalidSession(_))
        ));
    }
}
