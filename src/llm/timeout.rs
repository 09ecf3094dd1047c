//! Deadline wrapper around another provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};

/// Fails a completion with `LlmError::Timeout` once `timeout` elapses.
pub struct TimeoutProvider {
    inner: Arc<dyn LlmProvider>,
    provider: String,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, provider: &str, timeout: Duration) -> Self {
        Self {
            inner,
            provider: provider.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl LlmProvider for TimeoutProvider {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    provider = %self.provider,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "LLM call timed out"
                );
                Err(LlmError::Timeout {
                    provider: self.provider.clone(),
                    timeout: self.timeout,
                })
            }
        }
    }
}
