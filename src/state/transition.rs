//! The Transition Engine: computes the next cognitive state from the prior
//! one plus the incoming message.
//!
//! Pacing is decided here, deterministically, before the model is consulted;
//! the brain oracle only contributes texture (thoughts, emotions, behaviors)
//! and its output is validated before anything commits.

use super::signal::{self, MessageSignals};
use super::types::CognitiveState;
use super::validate::validate_candidate;
use crate::config::{Config, PacingConfig};
use crate::error::{GatewayError, StateError};
use crate::gateway::{CompletionRequest, Gateway};
use crate::prompt::{self, PromptEngine};
use crate::session::Session;
use crate::state::OpennessLevel;
use serde::Deserialize;
use std::sync::Arc;

/// An advance is blocked once the two preceding turns both advanced.
const ADVANCE_COOLDOWN_WINDOW: usize = 2;

/// What the pacing rules decided for this turn's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LevelDecision {
    Advanced,
    Held,
    Refused,
    Retreated,
}

/// The validated result of one transition stage.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub state: CognitiveState,
    pub decision: LevelDecision,
    /// An undisclosed topic was pressured; the reply must deflect.
    pub refusal: bool,
    /// The oracle failed twice and the no-op fallback was committed.
    pub fallback: bool,
}

/// Texture fields contributed by the brain oracle. Untrusted until validated.
#[derive(Debug, Deserialize)]
struct BrainOutput {
    automatic_thoughts: String,
    emotions: Vec<String>,
    #[serde(default)]
    behaviors: Vec<String>,
}

pub struct TransitionEngine {
    gateway: Arc<dyn Gateway>,
    prompts: Arc<PromptEngine>,
    pacing: PacingConfig,
    history_window: usize,
    brain_temperature: f64,
}

impl TransitionEngine {
    pub fn new(gateway: Arc<dyn Gateway>, prompts: Arc<PromptEngine>, config: &Config) -> Self {
        Self {
            gateway,
            prompts,
            pacing: config.pacing.clone(),
            history_window: config.history.window,
            brain_temperature: config.gateway.brain_temperature,
        }
    }

    /// Consecutive low-pressure turns immediately preceding this one,
    /// re-derived from the stored incoming messages. Classified against the
    /// current undisclosed set; topics unlocked since then only make old
    /// turns read as calmer, which is the safe direction.
    fn calm_streak(session: &Session, undisclosed: &[&crate::persona::GuardedTopic]) -> u32 {
        session
            .turns
            .iter()
            .rev()
            .take_while(|turn| signal::analyze(&turn.incoming_message, undisclosed).low_pressure())
            .count() as u32
    }

    fn decide(
        &self,
        prior_level: OpennessLevel,
        signals: &MessageSignals,
        recent_advances: u32,
        calm_streak: u32,
    ) -> (OpennessLevel, LevelDecision) {
        if signals.dismissive
            && self.pacing.allow_retreat
            && let Some(down) = prior_level.step_down()
        {
            return (down, LevelDecision::Retreated);
        }
        if signals.pressured_topic.is_some() {
            return (prior_level, LevelDecision::Refused);
        }
        let strength = signal::advance_strength(signals, calm_streak, &self.pacing);
        if strength >= self.pacing.advance_threshold
            && calm_streak >= self.pacing.required_calm_streak
            && recent_advances < ADVANCE_COOLDOWN_WINDOW as u32
            && let Some(up) = prior_level.step_up()
        {
            return (up, LevelDecision::Advanced);
        }
        (prior_level, LevelDecision::Held)
    }

    /// Compute and validate the next state. Gateway errors (after the retry
    /// layer) bubble up; malformed or invariant-violating oracle output is
    /// recovered via one corrective re-ask, then the no-op fallback.
    pub async fn next_state(
        &self,
        session: &Session,
        incoming: &str,
    ) -> Result<TransitionOutcome, GatewayError> {
        let persona = &session.persona;
        let prior = &session.state;
        let undisclosed = persona.undisclosed_at(prior.openness_level);

        let signals = signal::analyze(incoming, &undisclosed);
        let calm_streak = Self::calm_streak(session, &undisclosed);
        let recent_advances = session.recent_advances(ADVANCE_COOLDOWN_WINDOW);
        let (next_level, decision) = self.decide(
            prior.openness_level,
            &signals,
            recent_advances,
            calm_streak,
        );
        let refusal = signals.pressured_topic.is_some();

        tracing::debug!(
            session = %session.id,
            turn = prior.turn_index + 1,
            prior_level = %prior.openness_level,
            next_level = %next_level,
            decision = %decision,
            calm_streak,
            recent_advances,
            "Level decided"
        );

        let descriptor = persona.describe_openness(next_level);
        let history = prompt::render_history(
            session.recent_turns(self.history_window),
            &persona.name,
        );
        let system_prompt = prompt::build_brain_prompt(
            &self.prompts,
            persona,
            prior,
            &descriptor,
            &next_level.to_string(),
            &history,
            incoming,
            signals.pressured_topic.as_deref(),
        )
        .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        let request = CompletionRequest::brain(system_prompt.clone(), incoming)
            .with_temperature(self.brain_temperature);
        let raw = self.gateway.complete(&request).await?;

        match self.assemble(prior, next_level, &descriptor, &signals, &raw) {
            Ok(state) => {
                return Ok(TransitionOutcome {
                    state,
                    decision,
                    refusal,
                    fallback: false,
                });
            }
            Err(reason) => {
                tracing::warn!(
                    session = %session.id,
                    turn = prior.turn_index + 1,
                    "Brain output rejected, re-asking once: {reason}"
                );
                let corrective = prompt::build_brain_corrective(&self.prompts, &reason.to_string())
                    .map_err(|e| GatewayError::Malformed(e.to_string()))?;
                let retry_request = CompletionRequest::brain(system_prompt, corrective)
                    .with_temperature(self.brain_temperature);
                let retry_raw = self.gateway.complete(&retry_request).await?;

                if let Ok(state) =
                    self.assemble(prior, next_level, &descriptor, &signals, &retry_raw)
                {
                    return Ok(TransitionOutcome {
                        state,
                        decision,
                        refusal,
                        fallback: false,
                    });
                }
            }
        }

        // No-op fallback: posture unchanged, behaviors forced to guarded.
        tracing::warn!(
            session = %session.id,
            turn = prior.turn_index + 1,
            "Brain output rejected twice, committing no-op transition"
        );
        Ok(TransitionOutcome {
            state: no_op_fallback(prior),
            decision: LevelDecision::Held,
            refusal,
            fallback: true,
        })
    }

    fn assemble(
        &self,
        prior: &CognitiveState,
        next_level: OpennessLevel,
        descriptor: &str,
        signals: &MessageSignals,
        raw: &str,
    ) -> Result<CognitiveState, StateError> {
        let oracle = parse_brain_output(raw)?;

        let mut automatic_thoughts = oracle.automatic_thoughts;
        let mut behaviors = oracle.behaviors;
        if let Some(topic) = &signals.pressured_topic {
            // Refusals must be visible in the state even when the oracle
            // glossed over them.
            if !automatic_thoughts.to_lowercase().contains(&topic.to_lowercase()) {
                automatic_thoughts
                    .push_str(&format!(" They keep pushing on {topic}. I'm not going there."));
            }
            if !behaviors.iter().any(|tag| tag == "deflecting") {
                behaviors.insert(0, "deflecting".to_string());
            }
        }

        let candidate = CognitiveState {
            automatic_thoughts,
            emotions: oracle.emotions,
            openness_level: next_level,
            openness_descriptor: descriptor.to_string(),
            behaviors,
            turn_index: prior.turn_index + 1,
        };
        validate_candidate(prior, &candidate)?;
        Ok(candidate)
    }
}

/// A no-op transition: same posture, next turn index, guarded behaviors.
pub fn no_op_fallback(prior: &CognitiveState) -> CognitiveState {
    CognitiveState {
        automatic_thoughts: prior.automatic_thoughts.clone(),
        emotions: prior.emotions.clone(),
        openness_level: prior.openness_level,
        openness_descriptor: prior.openness_descriptor.clone(),
        behaviors: vec!["guarded".to_string()],
        turn_index: prior.turn_index + 1,
    }
}

/// Parse the oracle's JSON, tolerating markdown code fences and prose around
/// the object.
fn parse_brain_output(raw: &str) -> Result<BrainOutput, StateError> {
    let trimmed = raw.trim();
    let candidate = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };
    serde_json::from_str(candidate)
        .map_err(|e| StateError::MalformedBrainOutput(format!("{e}: {}", truncate(raw, 120))))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(max_chars).collect();
        format!("{prefix}…")
    }
}
