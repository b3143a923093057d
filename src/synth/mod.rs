//! Reply synthesis: turn the committed-to-be state into the character's
//! visible utterance, with policy enforcement and bounded repair.

pub mod policy;

use crate::config::Config;
use crate::error::GatewayError;
use crate::gateway::{CompletionRequest, Gateway};
use crate::prompt::{self, PromptEngine};
use crate::session::Session;
use crate::state::{OpennessLevel, TransitionOutcome};
use std::sync::Arc;

/// The reply that will commit with the turn.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub reply: String,
    /// The oracle failed policy twice and a stock deflection was substituted.
    pub canned: bool,
}

/// Drives the reply stage. Never mutates session state; the orchestrator
/// commits the result.
pub struct ResponseSynthesizer {
    gateway: Arc<dyn Gateway>,
    prompts: Arc<PromptEngine>,
    history_window: usize,
    text_temperature: f64,
}

impl ResponseSynthesizer {
    pub fn new(gateway: Arc<dyn Gateway>, prompts: Arc<PromptEngine>, config: &Config) -> Self {
        Self {
            gateway,
            prompts,
            history_window: config.history.window,
            text_temperature: config.gateway.text_temperature,
        }
    }

    /// Generate a policy-conforming reply for the transitioned state.
    ///
    /// One corrective regeneration is attempted after a violation; if the
    /// second candidate is merely over-long it is truncated, any other
    /// residual violation falls back to the level's canned deflection.
    pub async fn synthesize(
        &self,
        session: &Session,
        outcome: &TransitionOutcome,
        incoming: &str,
    ) -> Result<SynthesisOutcome, GatewayError> {
        let state = &outcome.state;
        let level = state.openness_level;
        let reserved_tone = level < OpennessLevel::ModeratelyOpen || outcome.refusal;

        let history = prompt::render_history(
            session.recent_turns(self.history_window),
            &session.persona.name,
        );
        let system_prompt = prompt::build_reply_prompt(
            &self.prompts,
            &session.persona,
            state,
            &history,
            incoming,
            reserved_tone,
        )
        .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        let request = CompletionRequest::reply(system_prompt.clone(), incoming)
            .with_temperature(self.text_temperature);
        let first = self.gateway.complete(&request).await?;
        let first = first.trim().to_string();

        let violation = match policy::check(&first, level) {
            Ok(()) => {
                return Ok(SynthesisOutcome {
                    reply: first,
                    canned: false,
                });
            }
            Err(violation) => violation,
        };

        tracing::warn!(
            session = %session.id,
            turn = state.turn_index,
            level = %level,
            "Reply rejected, regenerating once: {violation}"
        );
        let corrective = prompt::build_reply_corrective(
            &self.prompts,
            &violation.to_string(),
            level.max_sentences(),
        )
        .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        let retry_request = CompletionRequest::reply(system_prompt, corrective)
            .with_temperature(self.text_temperature);
        let second = self.gateway.complete(&retry_request).await?;
        let second = second.trim().to_string();

        match policy::check(&second, level) {
            Ok(()) => Ok(SynthesisOutcome {
                reply: second,
                canned: false,
            }),
            Err(crate::error::PolicyError::TooLong { .. }) => Ok(SynthesisOutcome {
                reply: policy::truncate_to(&second, level),
                canned: false,
            }),
            Err(violation) => {
                tracing::warn!(
                    session = %session.id,
                    turn = state.turn_index,
                    level = %level,
                    "Reply rejected twice, substituting deflection: {violation}"
                );
                Ok(SynthesisOutcome {
                    reply: policy::canned_deflection(level).to_string(),
                    canned: true,
                })
            }
        }
    }
}
