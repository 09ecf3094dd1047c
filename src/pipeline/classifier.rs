//! Spam and category classifiers.
//!
//! Both are traits so the workflow can run against canned classifiers in
//! tests; the LLM-backed implementations share one `LlmExchange`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::PromptConfig;
use crate::error::PipelineError;
use crate::llm::LlmProvider;
use crate::pipeline::exchange::{LlmExchange, StepOutput};
use crate::pipeline::parse::{parse_category, parse_spam_verdict};
use crate::pipeline::prompts;
use crate::pipeline::rules::RulesEngine;
use crate::pipeline::types::{Category, EmailMessage, SpamVerdict};

/// Decides whether an email is spam.
#[async_trait]
pub trait SpamClassifier: Send + Sync {
    async fn classify(&self, email: &EmailMessage)
    -> Result<StepOutput<SpamVerdict>, PipelineError>;
}

/// Assigns a category to a legitimate email.
#[async_trait]
pub trait CategoryClassifier: Send + Sync {
    async fn categorize(&self, email: &EmailMessage)
    -> Result<StepOutput<Category>, PipelineError>;
}

/// Rules first, then the LLM.
pub struct LlmSpamClassifier {
    exchange: LlmExchange,
    config: PromptConfig,
    rules: RulesEngine,
}

impl LlmSpamClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, config: PromptConfig, rules: RulesEngine) -> Self {
        Self {
            exchange: LlmExchange::new(llm, &config),
            config,
            rules,
        }
    }
}

#[async_trait]
impl SpamClassifier for LlmSpamClassifier {
    async fn classify(
        &self,
        email: &EmailMessage,
    ) -> Result<StepOutput<SpamVerdict>, PipelineError> {
        if let Some(verdict) = self.rules.evaluate(email) {
            debug!(sender = %email.sender, "Rules engine matched, skipping LLM classification");
            return Ok(StepOutput::bare(verdict));
        }

        let answer = self
            .exchange
            .ask(
                prompts::spam_system_prompt(&self.config),
                prompts::spam_user_prompt(email),
            )
            .await?;

        let verdict = parse_spam_verdict(&answer.value).map_err(|e| {
            warn!(raw_response = %answer.value, error = %e, "Failed to parse spam verdict");
            PipelineError::Classification(e)
        })?;

        Ok(StepOutput {
            value: verdict,
            exchange: answer.exchange,
        })
    }
}

pub struct LlmCategoryClassifier {
    exchange: LlmExchange,
    config: PromptConfig,
}

impl LlmCategoryClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, config: PromptConfig) -> Self {
        Self {
            exchange: LlmExchange::new(llm, &config),
            config,
        }
    }
}

#[async_trait]
impl CategoryClassifier for LlmCategoryClassifier {
    async fn categorize(
        &self,
        email: &EmailMessage,
    ) -> Result<StepOutput<Category>, PipelineError> {
        let answer = self
            .exchange
            .ask(
                prompts::category_system_prompt(&self.config),
                prompts::category_user_prompt(email),
            )
            .await?;

        let category = parse_category(&answer.value).map_err(|e| {
            warn!(raw_response = %answer.value, error = %e, "Failed to parse category");
            PipelineError::Categorization(e)
        })?;

        Ok(StepOutput {
            value: category,
            exchange: answer.exchange,
        })
    }
}
