pub mod builder;
pub mod engine;

pub use builder::{
    build_brain_corrective, build_brain_prompt, build_reply_corrective, build_reply_prompt,
    render_history,
};
pub use engine::PromptEngine;
