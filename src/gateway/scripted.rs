//! Canned-output gateway for tests and offline demo runs.

use super::traits::{CompletionRequest, Gateway};
use crate::error::GatewayError;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

const DEFAULT_BRAIN_OUTPUT: &str = r#"{"automatic_thoughts":"I don't know what they want from me yet.","emotions":["wary","tired"],"behaviors":["guarded","minimal-answers"]}"#;
const DEFAULT_REPLY_OUTPUT: &str = "I'm fine.";

/// Pops scripted outputs per stage; falls back to a safe default when the
/// queue runs dry, so long randomized runs stay deterministic.
pub struct ScriptedGateway {
    brain_outputs: Mutex<VecDeque<String>>,
    reply_outputs: Mutex<VecDeque<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            brain_outputs: Mutex::new(VecDeque::new()),
            reply_outputs: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_brain(&self, output: impl Into<String>) {
        self.brain_outputs
            .lock()
            .expect("scripted gateway lock poisoned")
            .push_back(output.into());
    }

    pub fn push_reply(&self, output: impl Into<String>) {
        self.reply_outputs
            .lock()
            .expect("scripted gateway lock poisoned")
            .push_back(output.into());
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl Gateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>> {
        Box::pin(async move {
            let (queue, fallback) = if request.expects_json {
                (&self.brain_outputs, DEFAULT_BRAIN_OUTPUT)
            } else {
                (&self.reply_outputs, DEFAULT_REPLY_OUTPUT)
            };
            let next = queue
                .lock()
                .map_err(|_| GatewayError::Request {
                    gateway: "scripted".into(),
                    message: "lock poisoned".into(),
                })?
                .pop_front();
            Ok(next.unwrap_or_else(|| fallback.to_string()))
        })
    }
}
