//! Disclosure policy for visible replies.
//!
//! The reply model is an untrusted oracle; every candidate reply is checked
//! here against the turn's openness level before it can commit. Bracketed
//! nonverbal cues such as `[looks away]` are part of the character's voice and
//! never count toward the sentence cap.

use crate::error::PolicyError;
use crate::state::OpennessLevel;

const RECIPROCITY_PHRASES: &[&str] = &[
    "how about you",
    "what about you",
    "and you?",
    "what do you think",
    "don't you think",
    "do you know what i mean",
];

const HELPFUL_TONE_PHRASES: &[&str] = &[
    "you should",
    "have you tried",
    "i suggest",
    "here's what",
    "here is what",
    "let me help",
    "you could try",
    "my advice",
    "if i were you",
];

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Drop bracketed cue segments, keeping everything at bracket depth zero.
fn strip_cues(reply: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(reply.len());
    for c in reply.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Split on terminator runs, so "What?! No." is two sentences and a trailing
/// unterminated fragment still counts as one.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut in_run = false;
    for c in text.chars() {
        if is_terminator(c) {
            current.push(c);
            in_run = true;
        } else {
            if in_run {
                let sentence = current.trim().to_string();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                current.clear();
                in_run = false;
            }
            current.push(c);
        }
    }
    let tail = current.trim().to_string();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

pub fn count_sentences(reply: &str) -> usize {
    split_sentences(&strip_cues(reply)).len()
}

fn words(sentence: &str) -> impl Iterator<Item = String> {
    sentence
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// A question aimed back at the counterpart. Rhetorical self-directed
/// questions ("Why do I even bother?") are allowed.
fn reciprocity_snippet(sentences: &[String]) -> Option<String> {
    for sentence in sentences {
        let lower = sentence.to_lowercase();
        if RECIPROCITY_PHRASES.iter().any(|p| lower.contains(p)) {
            return Some(sentence.clone());
        }
        if sentence.ends_with('?') && words(sentence).any(|w| w == "you" || w == "your") {
            return Some(sentence.clone());
        }
    }
    None
}

fn tone_mismatch(stripped: &str, level: OpennessLevel) -> bool {
    if level >= OpennessLevel::ModeratelyOpen {
        return false;
    }
    let lower = stripped.to_lowercase();
    stripped.contains('!') || HELPFUL_TONE_PHRASES.iter().any(|p| lower.contains(p))
}

/// Check one candidate reply against the level's disclosure policy.
///
/// Length is checked last: a `TooLong` error means the reply is otherwise
/// clean and safe to repair by truncation.
pub fn check(reply: &str, level: OpennessLevel) -> Result<(), PolicyError> {
    let stripped = strip_cues(reply);
    let sentences = split_sentences(&stripped);

    if let Some(snippet) = reciprocity_snippet(&sentences) {
        return Err(PolicyError::ReciprocityQuestion { snippet });
    }
    if tone_mismatch(&stripped, level) {
        return Err(PolicyError::ToneMismatch { level });
    }
    let max_sentences = level.max_sentences();
    if sentences.len() > max_sentences {
        return Err(PolicyError::TooLong {
            level,
            max_sentences,
            counted: sentences.len(),
        });
    }
    Ok(())
}

/// Cut an over-long reply at the level's sentence cap. Cues inside the kept
/// prefix survive; anything after the cut is dropped with the overflow.
pub fn truncate_to(reply: &str, level: OpennessLevel) -> String {
    let max_sentences = level.max_sentences();
    let mut depth = 0usize;
    let mut completed = 0usize;
    let mut in_run = false;
    let mut cut = reply.len();

    for (i, c) in reply.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 && is_terminator(c) {
            in_run = true;
            cut = i + c.len_utf8();
        } else if in_run {
            in_run = false;
            completed += 1;
            if completed == max_sentences {
                return reply[..cut].trim_end().to_string();
            }
        }
    }
    reply.trim_end().to_string()
}

/// Level-appropriate stock deflection, used when the reply oracle fails policy
/// twice or the turn fell back to a no-op transition. Each passes [`check`]
/// for its own level.
pub fn canned_deflection(level: OpennessLevel) -> &'static str {
    match level {
        OpennessLevel::Closed => "[looks away] I'm fine.",
        OpennessLevel::Cautious => "It's been a long week. I don't really want to get into it.",
        OpennessLevel::TentativelyOpen => {
            "I'm not sure what to say to that. Things are just complicated right now."
        }
        OpennessLevel::ModeratelyOpen => {
            "I don't really know how to answer that. There's a lot going on at home, and I'm tired."
        }
        OpennessLevel::SignificantlyOpen => {
            "I need a moment with that one. It's hard to put into words, even now."
        }
    }
}
