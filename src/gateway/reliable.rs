use super::traits::{CompletionRequest, Gateway};
use crate::config::ReliabilityConfig;
use crate::error::GatewayError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

const MAX_BACKOFF_MS: u64 = 10_000;

/// Gateway wrapper with bounded retry + exponential backoff.
///
/// Only transient failures (timeout, rate limit) are retried; malformed
/// output goes straight back to the caller, which owns the corrective re-ask.
pub struct ReliableGateway {
    inner: Arc<dyn Gateway>,
    max_retries: u32,
    base_backoff_ms: u64,
}

impl ReliableGateway {
    pub fn new(inner: Arc<dyn Gateway>, config: &ReliabilityConfig) -> Self {
        Self {
            inner,
            max_retries: config.max_retries,
            base_backoff_ms: config.base_backoff_ms.max(10),
        }
    }
}

impl Gateway for ReliableGateway {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>> {
        Box::pin(async move {
            let mut backoff_ms = self.base_backoff_ms;
            let mut attempt = 0;

            loop {
                match self.inner.complete(request).await {
                    Ok(text) => {
                        if attempt > 0 {
                            tracing::info!(
                                gateway = self.inner.name(),
                                stage = request.label,
                                attempt,
                                "Gateway recovered after retries"
                            );
                        }
                        return Ok(text);
                    }
                    Err(e) if !e.is_retryable() || attempt == self.max_retries => {
                        return Err(e);
                    }
                    Err(e) => {
                        // Honor a rate-limit hint when it exceeds our backoff.
                        if let GatewayError::RateLimited { retry_after_ms, .. } = &e {
                            backoff_ms = backoff_ms.max(*retry_after_ms);
                        }
                        tracing::warn!(
                            gateway = self.inner.name(),
                            stage = request.label,
                            attempt = attempt + 1,
                            max_retries = self.max_retries,
                            backoff_ms,
                            "Gateway call failed, retrying: {e}"
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        backoff_ms = backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
                        attempt += 1;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockGateway {
        calls: Arc<AtomicUsize>,
        fail_until_attempt: usize,
        error: fn() -> GatewayError,
    }

    impl Gateway for MockGateway {
        fn name(&self) -> &str {
            "mock"
        }

        fn complete<'a>(
            &'a self,
            _request: &'a CompletionRequest,
        ) -> Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>> {
            Box::pin(async move {
                let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt <= self.fail_until_attempt {
                    return Err((self.error)());
                }
                Ok("ok".to_string())
            })
        }
    }

    fn timeout_error() -> GatewayError {
        GatewayError::Timeout {
            gateway: "mock".into(),
        }
    }

    fn reliability(max_retries: u32) -> ReliabilityConfig {
        ReliabilityConfig {
            max_retries,
            base_backoff_ms: 1,
        }
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gateway = ReliableGateway::new(
            Arc::new(MockGateway {
                calls: Arc::clone(&calls),
                fail_until_attempt: 0,
                error: timeout_error,
            }),
            &reliability(2),
        );
        let request = CompletionRequest::reply("sys", "hello");
        assert_eq!(gateway.complete(&request).await.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_recovers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gateway = ReliableGateway::new(
            Arc::new(MockGateway {
                calls: Arc::clone(&calls),
                fail_until_attempt: 2,
                error: timeout_error,
            }),
            &reliability(2),
        );
        let request = CompletionRequest::reply("sys", "hello");
        assert_eq!(gateway.complete(&request).await.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gateway = ReliableGateway::new(
            Arc::new(MockGateway {
                calls: Arc::clone(&calls),
                fail_until_attempt: usize::MAX,
                error: timeout_error,
            }),
            &reliability(2),
        );
        let request = CompletionRequest::reply("sys", "hello");
        let err = gateway.complete(&request).await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout { .. }));
        // Two retries per stage means three attempts total.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn malformed_output_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gateway = ReliableGateway::new(
            Arc::new(MockGateway {
                calls: Arc::clone(&calls),
                fail_until_attempt: usize::MAX,
                error: || GatewayError::Malformed("not json".into()),
            }),
            &reliability(3),
        );
        let request = CompletionRequest::brain("sys", "hello");
        let err = gateway.complete(&request).await.unwrap_err();
        assert!(matches!(err, GatewayError::Malformed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
