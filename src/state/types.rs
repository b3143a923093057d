use serde::{Deserialize, Serialize};

/// Ordinal disclosure scale. The ladder only ever moves one step at a time;
/// `SignificantlyOpen` is stable (no terminal state).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OpennessLevel {
    Closed,
    Cautious,
    TentativelyOpen,
    ModeratelyOpen,
    SignificantlyOpen,
}

impl OpennessLevel {
    pub fn step_up(self) -> Option<Self> {
        match self {
            Self::Closed => Some(Self::Cautious),
            Self::Cautious => Some(Self::TentativelyOpen),
            Self::TentativelyOpen => Some(Self::ModeratelyOpen),
            Self::ModeratelyOpen => Some(Self::SignificantlyOpen),
            Self::SignificantlyOpen => None,
        }
    }

    pub fn step_down(self) -> Option<Self> {
        match self {
            Self::Closed => None,
            Self::Cautious => Some(Self::Closed),
            Self::TentativelyOpen => Some(Self::Cautious),
            Self::ModeratelyOpen => Some(Self::TentativelyOpen),
            Self::SignificantlyOpen => Some(Self::ModeratelyOpen),
        }
    }

    /// Hard sentence ceiling for replies at this level. Bracketed nonverbal
    /// cues do not count toward the ceiling.
    pub fn max_sentences(self) -> usize {
        match self {
            Self::Closed => 1,
            Self::Cautious => 3,
            Self::TentativelyOpen => 5,
            Self::ModeratelyOpen => 7,
            Self::SignificantlyOpen => 9,
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Signed ordinal distance `to - from`.
    pub fn distance(from: Self, to: Self) -> i8 {
        to.ordinal() as i8 - from.ordinal() as i8
    }
}

/// The versioned record of a character's emotional/disclosure state.
///
/// Owned exclusively by one session and replaced, never mutated in place,
/// each turn. The texture fields (`automatic_thoughts`, `emotions`,
/// `behaviors`) come from the untrusted brain oracle; `openness_level`,
/// `openness_descriptor` and `turn_index` are decided by the scaffolding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CognitiveState {
    /// The character's immediate internal reaction; may carry a
    /// chain-of-thought narrative.
    pub automatic_thoughts: String,
    /// Ordered emotion labels; non-empty, no duplicates within a turn.
    pub emotions: Vec<String>,
    pub openness_level: OpennessLevel,
    /// What remains undisclosed at this level, and the reply length bound.
    pub openness_descriptor: String,
    /// Tone/affect tags for rendering (e.g. "deflecting", "minimal-answers").
    pub behaviors: Vec<String>,
    /// Equals the number of committed turns.
    pub turn_index: u64,
}

impl CognitiveState {
    /// Seeded initial state for a fresh session: fully closed, wary, with the
    /// caller-supplied descriptor of what is off the table.
    pub fn bootstrap(descriptor: impl Into<String>) -> Self {
        Self {
            automatic_thoughts: "I don't know this person. Why should I tell them anything?"
                .to_string(),
            emotions: vec!["wary".to_string(), "tired".to_string()],
            openness_level: OpennessLevel::Closed,
            openness_descriptor: descriptor.into(),
            behaviors: vec!["guarded".to_string(), "minimal-answers".to_string()],
            turn_index: 0,
        }
    }

    /// Same disclosure posture, ignoring turn bookkeeping. Used by the no-op
    /// fallback idempotence checks.
    pub fn same_posture(&self, other: &Self) -> bool {
        self.openness_level == other.openness_level
            && self.openness_descriptor == other.openness_descriptor
            && self.automatic_thoughts == other.automatic_thoughts
            && self.emotions == other.emotions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn ladder_steps_are_symmetric() {
        for level in OpennessLevel::iter() {
            if let Some(up) = level.step_up() {
                assert_eq!(up.step_down(), Some(level));
            }
        }
        assert_eq!(OpennessLevel::Closed.step_down(), None);
        assert_eq!(OpennessLevel::SignificantlyOpen.step_up(), None);
    }

    #[test]
    fn sentence_ceiling_is_monotone() {
        let caps: Vec<usize> = OpennessLevel::iter()
            .map(OpennessLevel::max_sentences)
            .collect();
        assert_eq!(caps[0], 1);
        assert!(caps.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn distance_is_signed() {
        assert_eq!(
            OpennessLevel::distance(OpennessLevel::Closed, OpennessLevel::Cautious),
            1
        );
        assert_eq!(
            OpennessLevel::distance(OpennessLevel::ModeratelyOpen, OpennessLevel::Cautious),
            -2
        );
    }

    #[test]
    fn level_serde_round_trip() {
        let json = serde_json::to_string(&OpennessLevel::TentativelyOpen).unwrap();
        assert_eq!(json, "\"tentatively_open\"");
        let back: OpennessLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OpennessLevel::TentativelyOpen);
    }

    #[test]
    fn bootstrap_state_is_closed_at_turn_zero() {
        let state = CognitiveState::bootstrap("will not discuss: family; 1 sentence cap");
        assert_eq!(state.openness_level, OpennessLevel::Closed);
        assert_eq!(state.turn_index, 0);
        assert!(!state.emotions.is_empty());
        assert!(state.behaviors.iter().any(|b| b == "guarded"));
    }

    #[test]
    fn same_posture_ignores_turn_index() {
        let a = CognitiveState::bootstrap("desc");
        let mut b = a.clone();
        b.turn_index = 7;
        b.behaviors = vec!["guarded".to_string()];
        assert!(a.same_posture(&b));
    }
}
