//! Invariant validation for candidate cognitive states.
//!
//! The brain oracle is untrusted; every candidate it contributes to passes
//! through here before a turn may commit.

use super::types::{CognitiveState, OpennessLevel};
use crate::error::StateError;

const POSITIVE_EMOTIONS: &[&str] = &[
    "hopeful",
    "relieved",
    "calm",
    "grateful",
    "happy",
    "proud",
    "encouraged",
    "lighter",
    "comforted",
    "reassured",
];

const NEGATIVE_EMOTIONS: &[&str] = &[
    "wary",
    "tired",
    "sad",
    "anxious",
    "ashamed",
    "afraid",
    "scared",
    "angry",
    "hopeless",
    "numb",
    "overwhelmed",
    "guilty",
    "worried",
    "exhausted",
    "despairing",
    "defensive",
    "resentful",
    "embarrassed",
];

fn valence(label: &str) -> i8 {
    let lower = label.to_lowercase();
    if POSITIVE_EMOTIONS.contains(&lower.as_str()) {
        1
    } else if NEGATIVE_EMOTIONS.contains(&lower.as_str()) {
        -1
    } else {
        0
    }
}

fn predominant_valence(emotions: &[String]) -> i8 {
    let total: i32 = emotions.iter().map(|label| i32::from(valence(label))).sum();
    total.signum() as i8
}

/// Check a candidate state against the prior committed state.
///
/// Covers: one-step level moves in either direction, non-empty deduplicated
/// emotions, the turn counter, and the emotional trajectory (no unexplained
/// swing from a negative to a positive posture without an advance).
pub fn validate_candidate(
    prior: &CognitiveState,
    candidate: &CognitiveState,
) -> Result<(), StateError> {
    let distance = OpennessLevel::distance(prior.openness_level, candidate.openness_level);
    if distance > 1 {
        return Err(StateError::LevelSkip {
            from: prior.openness_level,
            to: candidate.openness_level,
        });
    }
    if distance < -1 {
        return Err(StateError::RegressionTooDeep {
            from: prior.openness_level,
            to: candidate.openness_level,
        });
    }

    if candidate.emotions.is_empty() {
        return Err(StateError::EmptyEmotions);
    }
    let mut seen: Vec<String> = Vec::with_capacity(candidate.emotions.len());
    for label in &candidate.emotions {
        let lower = label.to_lowercase();
        if seen.contains(&lower) {
            return Err(StateError::DuplicateEmotion(label.clone()));
        }
        seen.push(lower);
    }

    let expected = prior.turn_index + 1;
    if candidate.turn_index != expected {
        return Err(StateError::TurnIndex {
            expected,
            got: candidate.turn_index,
        });
    }

    let advanced = distance > 0;
    if !advanced
        && predominant_valence(&prior.emotions) < 0
        && predominant_valence(&candidate.emotions) > 0
    {
        return Err(StateError::MoodSwing {
            level: candidate.openness_level,
        });
    }

    Ok(())
}
