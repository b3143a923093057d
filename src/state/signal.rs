//! Deterministic classification of the counterpart's incoming message.
//!
//! The transition engine never trusts the model oracle with pacing decisions;
//! everything that moves the openness ladder is computed here from the raw
//! message text and the persona's guarded-topic table.

use crate::config::PacingConfig;
use crate::persona::GuardedTopic;

const VALIDATING_PHRASES: &[&str] = &[
    "that sounds",
    "that must",
    "i hear you",
    "i understand",
    "i can see",
    "thank you for sharing",
    "thank you for telling me",
    "take your time",
    "no pressure",
    "no rush",
    "not here to judge",
    "whenever you're ready",
    "whenever you are ready",
    "that makes sense",
    "it's okay",
    "it is okay",
    "i appreciate",
];

const DISMISSIVE_PHRASES: &[&str] = &[
    "get over it",
    "not a big deal",
    "no big deal",
    "you're overreacting",
    "you are overreacting",
    "stop being",
    "being dramatic",
    "calm down",
    "it can't be that bad",
    "everyone has problems",
    "just move on",
    "you're wasting",
    "honestly, whatever",
];

const DEMAND_PHRASES: &[&str] = &[
    "tell me",
    "talk about",
    "i need to know",
    "you have to",
    "you need to",
    "you must",
    "explain",
    "in detail",
    "what happened",
    "why won't you",
    "why wont you",
    "open up about",
];

const PERSONAL_KEYWORDS: &[&str] = &[
    "you", "your", "feel", "feeling", "cope", "coping", "sleep", "eating", "health", "home",
    "family", "work", "yourself",
];

/// What the incoming message does, as far as pacing is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSignals {
    /// The counterpart asked the character something about themselves.
    pub personal_question: bool,
    /// The counterpart validated or de-escalated.
    pub validating: bool,
    /// The counterpart was dismissive or invalidating.
    pub dismissive: bool,
    /// An undisclosed topic was pushed on directly; carries the topic name.
    pub pressured_topic: Option<String>,
}

impl MessageSignals {
    /// Low-pressure, non-judgmental turn: counts toward the calm streak.
    pub fn low_pressure(&self) -> bool {
        !self.dismissive && self.pressured_topic.is_none()
    }
}

fn contains_any(haystack: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| haystack.contains(phrase))
}

/// Classify one incoming message against the topics still undisclosed at the
/// character's current level.
pub fn analyze(message: &str, undisclosed: &[&GuardedTopic]) -> MessageSignals {
    let lower = message.to_lowercase();
    let is_question = lower.contains('?');
    let demanding = contains_any(&lower, DEMAND_PHRASES);

    // A guarded topic is "pressured" when its keywords appear in a direct ask,
    // not merely mentioned in passing.
    let pressured_topic = undisclosed
        .iter()
        .find(|topic| {
            (is_question || demanding)
                && topic
                    .keywords
                    .iter()
                    .any(|keyword| lower.contains(keyword.as_str()))
        })
        .map(|topic| topic.topic.clone());

    MessageSignals {
        personal_question: is_question && contains_any(&lower, PERSONAL_KEYWORDS),
        validating: contains_any(&lower, VALIDATING_PHRASES),
        dismissive: contains_any(&lower, DISMISSIVE_PHRASES),
        pressured_topic,
    }
}

/// Advance-signal strength in `[0.0, 1.0]`.
///
/// Zero whenever the message pressures or dismisses; otherwise a weighted sum
/// of validation, gentle personal questioning, and the preceding calm streak.
pub fn advance_strength(signals: &MessageSignals, calm_streak: u32, pacing: &PacingConfig) -> f32 {
    if !signals.low_pressure() {
        return 0.0;
    }
    let mut strength = 0.0;
    if signals.validating {
        strength += pacing.validation_weight;
    }
    if signals.personal_question {
        strength += pacing.question_weight;
    }
    let streak_fraction = if pacing.required_calm_streak == 0 {
        if calm_streak > 0 { 1.0 } else { 0.0 }
    } else {
        calm_streak.min(pacing.required_calm_streak) as f32 / pacing.required_calm_streak as f32
    };
    strength += pacing.streak_weight * streak_fraction;
    strength.min(1.0)
}
