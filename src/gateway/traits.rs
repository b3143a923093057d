use crate::error::GatewayError;
use std::future::Future;
use std::pin::Pin;

/// One text-completion call. The core builds the full prompt; the gateway is
/// an opaque oracle and is never trusted with pacing decisions.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Stage label for logging ("brain" or "reply").
    pub label: &'static str,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f64,
    /// The caller will parse the output as a JSON object.
    pub expects_json: bool,
}

impl CompletionRequest {
    pub fn brain(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            label: "brain",
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: 0.8,
            expects_json: true,
        }
    }

    pub fn reply(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            label: "reply",
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: 0.7,
            expects_json: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Abstract text-completion capability.
///
/// Retry/backoff policy lives in [`super::ReliableGateway`], not in
/// implementations.
pub trait Gateway: Send + Sync {
    /// Gateway identifier (e.g. "openai", "scripted").
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brain_requests_expect_json() {
        let request = CompletionRequest::brain("system", "user");
        assert_eq!(request.label, "brain");
        assert!(request.expects_json);
    }

    #[test]
    fn reply_requests_are_plain_text() {
        let request = CompletionRequest::reply("system", "user").with_temperature(0.2);
        assert_eq!(request.label, "reply");
        assert!(!request.expects_json);
        assert!((request.temperature - 0.2).abs() < f64::EPSILON);
    }
}
