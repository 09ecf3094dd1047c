//! One prompt/response round trip with the LLM, shared by every LLM step.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::PromptConfig;
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, FinishReason, LlmProvider};

/// A step's value plus the messages it exchanged with the LLM.
#[derive(Debug, Clone)]
pub struct StepOutput<T> {
    pub value: T,
    pub exchange: Vec<ChatMessage>,
}

impl<T> StepOutput<T> {
    /// Output of a step that did not call the LLM.
    pub fn bare(value: T) -> Self {
        Self {
            value,
            exchange: Vec::new(),
        }
    }
}

/// Sends system + user prompts with the configured sampling options.
#[derive(Clone)]
pub struct LlmExchange {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmExchange {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &PromptConfig) -> Self {
        Self {
            llm,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Returns the raw answer and the user/assistant pair for the transcript.
    pub async fn ask(
        &self,
        system_prompt: String,
        user_prompt: String,
    ) -> Result<StepOutput<String>, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt.clone()),
        ])
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let response = self.llm.complete(request).await?;
        debug!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "LLM answered"
        );
        if response.finish_reason == FinishReason::Length {
            warn!(
                model = self.llm.model_name(),
                max_tokens = self.max_tokens,
                "LLM answer hit the token limit and may be cut off"
            );
        }

        Ok(StepOutput {
            exchange: vec![
                ChatMessage::user(user_prompt),
                ChatMessage::assistant(response.content.clone()),
            ],
            value: response.content,
        })
    }
}
