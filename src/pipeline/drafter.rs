//! Response drafter — produces a reply for human review. Nothing is sent.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::PromptConfig;
use crate::error::PipelineError;
use crate::llm::LlmProvider;
use crate::pipeline::exchange::{LlmExchange, StepOutput};
use crate::pipeline::prompts;
use crate::pipeline::types::{Category, DraftResponse, EmailMessage};

#[async_trait]
pub trait ResponseDrafter: Send + Sync {
    async fn draft(
        &self,
        email: &EmailMessage,
        category: Category,
    ) -> Result<StepOutput<DraftResponse>, PipelineError>;
}

pub struct LlmResponseDrafter {
    exchange: LlmExchange,
    config: PromptConfig,
}

impl LlmResponseDrafter {
    pub fn new(llm: Arc<dyn LlmProvider>, config: PromptConfig) -> Self {
        Self {
            exchange: LlmExchange::new(llm, &config),
            config,
        }
    }
}

#[async_trait]
impl ResponseDrafter for LlmResponseDrafter {
    async fn draft(
        &self,
        email: &EmailMessage,
        category: Category,
    ) -> Result<StepOutput<DraftResponse>, PipelineError> {
        let answer = self
            .exchange
            .ask(
                prompts::draft_system_prompt(&self.config),
                prompts::draft_user_prompt(email, category),
            )
            .await?;

        let text = strip_code_fence(&answer.value);
        if text.is_empty() {
            return Err(PipelineError::Drafting("LLM returned an empty draft".into()));
        }

        Ok(StepOutput {
            value: DraftResponse {
                text: text.to_string(),
                category,
            },
            exchange: answer.exchange,
        })
    }
}

/// Drop a surrounding markdown fence, if the model added one.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Skip an info string such as ```text
    match inner.split_once('\n') {
        Some((info, body)) if !info.contains(' ') => body.trim(),
        _ => inner.trim(),
    }
}
