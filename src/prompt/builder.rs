use super::engine::PromptEngine;
use crate::error::PromptError;
use crate::persona::Persona;
use crate::session::Turn;
use crate::state::CognitiveState;
use tera::Context;

const BRAIN_TEMPLATE: &str = "\
You are the inner voice of {{ persona_name }}.
Background: {{ background }}
Presenting problem: {{ presenting_problem }}

Current cognitive state:
{{ state_json }}

{% if history %}Conversation so far:
{{ history }}

{% endif %}\
The social worker says: {{ incoming }}

Openness is now \"{{ level }}\" — {{ descriptor }}.
{% if pressured_topic %}They are pressing on {{ pressured_topic }}, which {{ persona_name }} is not ready to discuss; the thoughts must reflect refusing to go there.
{% endif %}\
Respond with only a JSON object of the shape
{\"automatic_thoughts\": \"...\", \"emotions\": [\"...\"], \"behaviors\": [\"...\"]}
capturing {{ persona_name }}'s immediate private reaction. Emotion labels are
distinct lowercase words consistent with the previous state; behavior tags
describe tone and affect (e.g. \"deflecting\", \"minimal-answers\").";

const REPLY_TEMPLATE: &str = "\
You are {{ persona_name }} speaking to a social worker.
Background: {{ background }}
{% if speech_style %}Speech style: {{ speech_style }}
{% endif %}\
Current cognitive state:
{{ state_json }}

{% if history %}Conversation so far:
{{ history }}

{% endif %}\
The social worker says: {{ incoming }}

Reply in character, and only as {{ persona_name }}. Use at most
{{ max_sentences }} sentence{% if max_sentences != 1 %}s{% endif %}. Never ask
the social worker a question. {% if reserved_tone %}Stay flat and guarded; no
advice, no solutions, no enthusiasm. {% endif %}You may include bracketed
nonverbal cues such as [looks away]; they do not count as sentences.";

const BRAIN_CORRECTIVE_TEMPLATE: &str = "\
Your previous output was rejected: {{ reason }}.
Respond again with only the JSON object, nothing else, keeping the emotional
trajectory consistent with the previous state.";

const REPLY_CORRECTIVE_TEMPLATE: &str = "\
Your previous reply was rejected: {{ reason }}.
Rewrite it within {{ max_sentences }} sentence{% if max_sentences != 1 %}s{% endif %},
with no question directed at the social worker and a tone that fits the
current openness level.";

pub(super) const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("brain", BRAIN_TEMPLATE),
    ("reply", REPLY_TEMPLATE),
    ("brain_corrective", BRAIN_CORRECTIVE_TEMPLATE),
    ("reply_corrective", REPLY_CORRECTIVE_TEMPLATE),
];

/// Flatten a window of committed turns into transcript lines.
pub fn render_history(turns: &[Turn], persona_name: &str) -> String {
    turns
        .iter()
        .flat_map(|turn| {
            [
                format!("Worker: {}", turn.incoming_message),
                format!("{persona_name}: {}", turn.reply),
            ]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn state_json(state: &CognitiveState) -> Result<String, PromptError> {
    serde_json::to_string_pretty(state).map_err(|e| PromptError::Render(e.to_string()))
}

/// Prompt for the brain stage: produce thoughts/emotions/behaviors for the
/// already-decided openness level.
pub fn build_brain_prompt(
    engine: &PromptEngine,
    persona: &Persona,
    prior: &CognitiveState,
    next_level_descriptor: &str,
    next_level: &str,
    history: &str,
    incoming: &str,
    pressured_topic: Option<&str>,
) -> Result<String, PromptError> {
    let mut ctx = Context::new();
    ctx.insert("persona_name", &persona.name);
    ctx.insert("background", &persona.background);
    ctx.insert("presenting_problem", &persona.presenting_problem);
    ctx.insert("state_json", &state_json(prior)?);
    ctx.insert("history", history);
    ctx.insert("incoming", incoming);
    ctx.insert("level", next_level);
    ctx.insert("descriptor", next_level_descriptor);
    ctx.insert("pressured_topic", &pressured_topic.unwrap_or_default());
    engine.render("brain", &ctx)
}

/// Prompt for the reply stage: render the visible reply for the updated state.
pub fn build_reply_prompt(
    engine: &PromptEngine,
    persona: &Persona,
    state: &CognitiveState,
    history: &str,
    incoming: &str,
    reserved_tone: bool,
) -> Result<String, PromptError> {
    let mut ctx = Context::new();
    ctx.insert("persona_name", &persona.name);
    ctx.insert("background", &persona.background);
    ctx.insert("speech_style", &persona.speech_style);
    ctx.insert("state_json", &state_json(state)?);
    ctx.insert("history", history);
    ctx.insert("incoming", incoming);
    ctx.insert("max_sentences", &state.openness_level.max_sentences());
    ctx.insert("reserved_tone", &reserved_tone);
    engine.render("reply", &ctx)
}

pub fn build_brain_corrective(engine: &PromptEngine, reason: &str) -> Result<String, PromptError> {
    let mut ctx = Context::new();
    ctx.insert("reason", reason);
    engine.render("brain_corrective", &ctx)
}

pub fn build_reply_corrective(
    engine: &PromptEngine,
    reason: &str,
    max_sentences: usize,
) -> Result<String, PromptError> {
    let mut ctx = Context::new();
    ctx.insert("reason", reason);
    ctx.insert("max_sentences", &max_sentences);
    engine.render("reply_corrective", &ctx)
}
