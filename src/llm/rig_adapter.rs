//! Bridges rig's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionError, CompletionModel, Message};
use rig::http_client;
use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};

/// Wraps any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    provider: &'static str,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str, provider: &'static str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            provider,
        }
    }

    fn request_failed(&self, reason: impl Into<String>) -> LlmError {
        LlmError::RequestFailed {
            provider: self.provider.to_string(),
            reason: reason.into(),
        }
    }

    fn map_error(&self, err: CompletionError) -> LlmError {
        let kind = match &err {
            CompletionError::HttpError(
                http_client::Error::InvalidStatusCode(status)
                | http_client::Error::InvalidStatusCodeWithMessage(status, _),
            ) => classify_status(status.as_u16()),
            CompletionError::ProviderError(body) | CompletionError::ResponseError(body) => {
                classify_body(body)
            }
            _ => FailureKind::Other,
        };
        let provider = self.provider.to_string();
        match kind {
            FailureKind::RateLimited => LlmError::RateLimited { provider },
            FailureKind::Auth => LlmError::AuthFailed { provider },
            FailureKind::Other => self.request_failed(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    RateLimited,
    Auth,
    Other,
}

fn classify_status(status: u16) -> FailureKind {
    match status {
        429 => FailureKind::RateLimited,
        401 | 403 => FailureKind::Auth,
        _ => FailureKind::Other,
    }
}

/// Classify a provider error payload by its `error.type` / `error.code`.
///
/// OpenAI: `{"error": {"type": ..., "code": "rate_limit_exceeded"}}`.
/// Anthropic: `{"type": "error", "error": {"type": "rate_limit_error"}}`.
fn classify_body(body: &str) -> FailureKind {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return FailureKind::Other;
    };
    let error = value.get("error").unwrap_or(&value);
    ["code", "type"]
        .iter()
        .filter_map(|key| error.get(*key).and_then(serde_json::Value::as_str))
        .map(|code| match code {
            "rate_limit_exceeded" | "rate_limit_error" => FailureKind::RateLimited,
            "invalid_api_key" | "authentication_error" | "permission_error" => FailureKind::Auth,
            _ => FailureKind::Other,
        })
        .find(|kind| *kind != FailureKind::Other)
        .unwrap_or(FailureKind::Other)
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // rig takes system text as the preamble and the last user turn as the prompt.
        let mut preamble = Vec::new();
        let mut history = Vec::new();
        for msg in &request.messages {
            match msg.role {
                Role::System => preamble.push(msg.content.clone()),
                Role::User => history.push(Message::user(msg.content.clone())),
                Role::Assistant => history.push(Message::assistant(msg.content.clone())),
            }
        }
        if request.messages.last().map(|m| m.role) != Some(Role::User) {
            return Err(self.request_failed("request must end with a user message"));
        }
        let prompt = history
            .pop()
            .ok_or_else(|| self.request_failed("request must end with a user message"))?;

        let mut builder = self.model.completion_request(prompt);
        if !preamble.is_empty() {
            builder = builder.preamble(preamble.join("\n\n"));
        }
        if !history.is_empty() {
            builder = builder.messages(history);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = builder.send().await.map_err(|e| self.map_error(e))?;

        let content: String = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if content.trim().is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.provider.to_string(),
                reason: "response contained no text".to_string(),
            });
        }

        let input_tokens = u32::try_from(response.usage.input_tokens).unwrap_or(u32::MAX);
        let output_tokens = u32::try_from(response.usage.output_tokens).unwrap_or(u32::MAX);
        let finish_reason = match request.max_tokens {
            Some(max) if output_tokens >= max => FinishReason::Length,
            _ => FinishReason::Stop,
        };

        debug!(
            model = %self.model_name,
            input_tokens,
            output_tokens,
            "LLM completion finished"
        );

        Ok(CompletionResponse {
            content,
            input_tokens,
            output_tokens,
            finish_reason,
        })
    }
}
