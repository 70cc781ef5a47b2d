//! Retrying client: decorator adding bounded retry with exponential backoff.
//!
//! Only [`ProviderError::Network`] failures are retried; an API that answered
//! (any status) or returned an unreadable body is not asked again.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::ProviderError;
use crate::registry::Provider;
use crate::traits::CompletionClient;

/// Upper bound on a single backoff sleep.
pub const MAX_DELAY: Duration = Duration::from_secs(300);

/// Wraps a [`CompletionClient`] and retries network failures.
///
/// Makes at most `max_attempts` calls in total. Before retry `k` (1-based)
/// it sleeps `backoff_base^(k-1)` seconds: 1s, 2s, 4s, … with the default
/// base of 2.0. Each wait is capped at [`MAX_DELAY`].
pub struct RetryingClient {
    inner: Box<dyn CompletionClient>,
    max_attempts: u32,
    backoff_base: f64,
}

impl std::fmt::Debug for RetryingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingClient")
            .field("provider", &self.inner.provider())
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base", &self.backoff_base)
            .finish()
    }
}

impl RetryingClient {
    /// Wrap `inner` with the default policy (3 attempts, base 2.0).
    pub fn new(inner: Box<dyn CompletionClient>) -> Self {
        Self {
            inner,
            max_attempts: 3,
            backoff_base: 2.0,
        }
    }

    /// Set the total number of calls (clamped to at least one).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff_base(mut self, backoff_base: f64) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Delay before retry number `retry` (1-based).
    fn delay_before(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.backoff_base.powi(exponent);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_DELAY)
            .min(MAX_DELAY)
    }
}

#[async_trait]
impl CompletionClient for RetryingClient {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, ProviderError> {
        let mut attempt = 1;
        loop {
            match self.inner.complete(prompt, model).await {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_before(attempt);
                    warn!(
                        provider = %self.inner.provider(),
                        model = model,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Network error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn provider(&self) -> Provider {
        self.inner.provider()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// Replays scripted results and counts calls.
    struct ScriptedClient {
        script: Mutex<VecDeque<Result<String, ProviderError>>>,
        calls: Arc<AtomicU32>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<String, ProviderError>>) -> (Self, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            let client = Self {
                script: Mutex::new(script.into()),
                calls: Arc::clone(&calls),
            };
            (client, calls)
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, _prompt: &str, _model: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("fallthrough".to_string()))
        }

        fn provider(&self) -> Provider {
            Provider::DeepSeek
        }
    }

    fn network() -> Result<String, ProviderError> {
        Err(ProviderError::network(Provider::DeepSeek, "connection reset"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_try() {
        let (inner, calls) = ScriptedClient::new(vec![Ok("hi".into())]);
        let client = RetryingClient::new(Box::new(inner));

        assert_eq!(client.complete("p", "m").await.unwrap(), "hi");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_network_errors_with_backoff() {
        let (inner, calls) = ScriptedClient::new(vec![network(), network(), Ok("finally".into())]);
        let client = RetryingClient::new(Box::new(inner));

        let start = Instant::now();
        assert_eq!(client.complete("p", "m").await.unwrap(), "finally");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s before the first retry, 2s before the second
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhausted_returns_last_network_error() {
        let (inner, calls) = ScriptedClient::new(vec![network(), network(), network(), Ok("never".into())]);
        let client = RetryingClient::new(Box::new(inner));

        let err = client.complete("p", "m").await.unwrap_err();
        assert!(matches!(err, ProviderError::Network { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_not_retried() {
        let (inner, calls) = ScriptedClient::new(vec![
            Err(ProviderError::http(Provider::DeepSeek, 503, "unavailable")),
            Ok("never".into()),
        ]);
        let client = RetryingClient::new(Box::new(inner));

        let err = client.complete("p", "m").await.unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 503, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parse_error_not_retried() {
        let (inner, calls) = ScriptedClient::new(vec![Err(ProviderError::parse(Provider::DeepSeek, "bad"))]);
        let client = RetryingClient::new(Box::new(inner));

        assert!(client.complete("p", "m").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_policy() {
        let (inner, calls) = ScriptedClient::new(vec![network(), network(), network(), network()]);
        let client = RetryingClient::new(Box::new(inner))
            .with_max_attempts(4)
            .with_backoff_base(3.0);

        let start = Instant::now();
        assert!(client.complete("p", "m").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 1 + 3 + 9 seconds
        assert_eq!(start.elapsed(), Duration::from_secs(13));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_never_sleeps() {
        let (inner, calls) = ScriptedClient::new(vec![network()]);
        let client = RetryingClient::new(Box::new(inner)).with_max_attempts(0);

        let start = Instant::now();
        assert!(client.complete("p", "m").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_delay_schedule() {
        let (inner, _) = ScriptedClient::new(vec![]);
        let client = RetryingClient::new(Box::new(inner));
        assert_eq!(client.delay_before(1), Duration::from_secs(1));
        assert_eq!(client.delay_before(2), Duration::from_secs(2));
        assert_eq!(client.delay_before(3), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_is_capped() {
        let (inner, _) = ScriptedClient::new(vec![]);
        let client = RetryingClient::new(Box::new(inner)).with_backoff_base(1e20);
        assert_eq!(client.delay_before(1), Duration::from_secs(1));
        assert_eq!(client.delay_before(2), MAX_DELAY);
        assert_eq!(client.delay_before(u32::MAX), MAX_DELAY);

        let (inner, _) = ScriptedClient::new(vec![]);
        let client = RetryingClient::new(Box::new(inner)).with_backoff_base(f64::INFINITY);
        assert_eq!(client.delay_before(3), MAX_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_backoff_base_returns_network_error() {
        let (inner, calls) = ScriptedClient::new(vec![network(), network(), network()]);
        let client = RetryingClient::new(Box::new(inner)).with_backoff_base(1e20);

        let start = Instant::now();
        let handle = tokio::spawn(async move { client.complete("p", "m").await });
        let result = handle.await.expect("retry task must not panic");
        assert!(matches!(result, Err(ProviderError::Network { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(1) + MAX_DELAY);
    }

    #[test]
    fn test_reports_inner_provider() {
        let (inner, _) = ScriptedClient::new(vec![]);
        assert_eq!(RetryingClient::new(Box::new(inner)).provider(), Provider::DeepSeek);
    }
}
