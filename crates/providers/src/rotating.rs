//! Rotating completion client — credential failover with retry and backoff.
//!
//! Wraps the shared `CredentialPool` and a per-key backend factory. Each
//! attempt takes the next credential, builds a fresh backend for it, and
//! issues one completion call under a per-attempt timeout. Quota signals get
//! a short backoff before rotating; other transient failures a longer one.
//! After `pool_size` attempts the exhaustion is returned as a value — the
//! reasoning loop turns it into user-visible text.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use alfred_core::error::ProviderError;
use alfred_core::provider::{CompletionBackend, CompletionRequest, CompletionResponse};

use crate::gemini::GeminiBackend;
use crate::pool::CredentialPool;

/// Builds a backend bound to one credential.
pub type BackendFactory = Arc<dyn Fn(&str) -> Arc<dyn CompletionBackend> + Send + Sync>;

const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(1);
const TRANSIENT_BACKOFF: Duration = Duration::from_secs(2);
const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);

/// A completion client that rotates through the credential pool on failure.
pub struct RotatingClient {
    pool: Arc<CredentialPool>,
    factory: BackendFactory,
    attempt_timeout: Duration,
}

impl RotatingClient {
    pub fn new(pool: Arc<CredentialPool>, factory: BackendFactory) -> Self {
        Self { pool, factory, attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT }
    }

    /// Convenience constructor for the Gemini backend: one `GeminiBackend`
    /// per credential, all targeting the same model.
    pub fn gemini(pool: Arc<CredentialPool>, model: impl Into<String>) -> Self {
        let model = model.into();
        let factory: BackendFactory =
            Arc::new(move |key: &str| Arc::new(GeminiBackend::new(key, model.clone())) as Arc<dyn CompletionBackend>);
        Self::new(pool, factory)
    }

    /// Override the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

#[async_trait]
impl CompletionBackend for RotatingClient {
    fn name(&self) -> &str {
        "rotating"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let attempts = self.pool.len();
        if attempts == 0 {
            return Err(ProviderError::NotConfigured("credential pool is empty".into()));
        }

        let mut last_error = ProviderError::NotConfigured("no attempt made".into());

        for attempt in 1..=attempts {
            let Some(key) = self.pool.next_key() else {
                return Err(ProviderError::NotConfigured("credential pool is empty".into()));
            };
            let backend = (self.factory)(key);

            debug!(attempt, total = attempts, backend = backend.name(), "Trying credential");

            match tokio::time::timeout(self.attempt_timeout, backend.complete(request.clone())).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => {
                    let backoff = if e.is_rate_limit() {
                        warn!(attempt, error = %e, "Rate limit hit, rotating to next credential");
                        RATE_LIMIT_BACKOFF
                    } else {
                        warn!(attempt, error = %e, "Provider call failed, rotating credential");
                        TRANSIENT_BACKOFF
                    };
                    last_error = e;
                    if attempt < attempts {
                        tokio::time::sleep(backoff).await;
                    }
                }
                Err(_) => {
                    warn!(attempt, timeout_secs = self.attempt_timeout.as_secs(), "Attempt timed out, rotating credential");
                    last_error = ProviderError::Timeout(format!(
                        "attempt timed out after {}s",
                        self.attempt_timeout.as_secs()
                    ));
                    if attempt < attempts {
                        tokio::time::sleep(TRANSIENT_BACKOFF).await;
                    }
                }
            }
        }

        Err(ProviderError::CredentialsExhausted(format!(
            "all {attempts} credentials failed; last error: {last_error}"
        )))
    }
}
