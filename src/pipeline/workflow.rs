//! Workflow controller — drives one email through the triage pipeline.
//!
//! **Core invariant: exactly one notification per run, and nothing is sent.**
//!
//! Flow:
//! 1. Spam classifier (rules, then LLM) → `Classified`
//! 2. Spam → notify with the verdict → `Notified`
//! 3. Legitimate → categorize → draft → notify with the draft → `Notified`
//!
//! Any failure aborts the run. Nothing is retried or persisted.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, info_span, Instrument};

use crate::config::TriageConfig;
use crate::error::PipelineError;
use crate::llm::LlmProvider;
use crate::pipeline::classifier::{
    CategoryClassifier, LlmCategoryClassifier, LlmSpamClassifier, SpamClassifier,
};
use crate::pipeline::drafter::{LlmResponseDrafter, ResponseDrafter};
use crate::pipeline::notifier::Notifier;
use crate::pipeline::rules::RulesEngine;
use crate::pipeline::types::{Branch, EmailMessage, RunOutcome, WorkflowState};

/// The static triage pipeline.
pub struct Workflow {
    spam: Arc<dyn SpamClassifier>,
    category: Arc<dyn CategoryClassifier>,
    drafter: Arc<dyn ResponseDrafter>,
    notifier: Arc<dyn Notifier>,
}

impl Workflow {
    pub fn new(
        spam: Arc<dyn SpamClassifier>,
        category: Arc<dyn CategoryClassifier>,
        drafter: Arc<dyn ResponseDrafter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            spam,
            category,
            drafter,
            notifier,
        }
    }

    /// Wire the LLM-backed steps from configuration.
    ///
    /// Fails if a trusted-sender pattern is not a valid regex.
    pub fn from_config(
        config: &TriageConfig,
        llm: Arc<dyn LlmProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, regex::Error> {
        let mut rules = if config.rules_enabled {
            RulesEngine::default_rules()
        } else {
            RulesEngine::empty()
        };
        for pattern in &config.trusted_senders {
            rules.add_trusted_sender(pattern)?;
        }
        debug!(
            rules = rules.rule_count(),
            trusted_senders = config.trusted_senders.len(),
            "Spam rules loaded"
        );

        Ok(Self::new(
            Arc::new(LlmSpamClassifier::new(
                Arc::clone(&llm),
                config.prompts.clone(),
                rules,
            )),
            Arc::new(LlmCategoryClassifier::new(
                Arc::clone(&llm),
                config.prompts.clone(),
            )),
            Arc::new(LlmResponseDrafter::new(llm, config.prompts.clone())),
            notifier,
        ))
    }

    /// Run one email end-to-end.
    pub async fn run(&self, email: EmailMessage) -> Result<RunOutcome, PipelineError> {
        let state = WorkflowState::new(email);
        let span = info_span!("triage", run_id = %state.run_id());
        self.drive(state).instrument(span).await
    }

    /// Run several emails independently, in order.
    ///
    /// A failed run is logged and reported in its slot; it does not stop
    /// the remaining runs.
    pub async fn run_batch(
        &self,
        emails: Vec<EmailMessage>,
    ) -> Vec<Result<RunOutcome, PipelineError>> {
        let count = emails.len();
        info!(count, "Processing email batch");

        let mut results = Vec::with_capacity(count);
        for email in emails {
            let sender = email.sender.clone();
            let result = self.run(email).await;
            if let Err(ref e) = result {
                error!(sender = %sender, error = %e, "Run failed");
            }
            results.push(result);
        }

        info!(
            succeeded = results.iter().filter(|r| r.is_ok()).count(),
            total = count,
            "Batch processing complete"
        );
        results
    }

    async fn drive(&self, mut state: WorkflowState) -> Result<RunOutcome, PipelineError> {
        info!(
            sender = %state.email().sender,
            subject = %state.email().subject,
            "Processing email"
        );

        let classified = self.spam.classify(state.email()).await?;
        state.extend_transcript(classified.exchange);
        state.record_verdict(classified.value)?;

        let branch = if let Some(verdict) = state.verdict().filter(|v| v.is_spam) {
            info!(reason = %verdict.reason, source = ?verdict.source, "Email classified as spam");
            Branch::Spam
        } else {
            let categorized = self.category.categorize(state.email()).await?;
            state.extend_transcript(categorized.exchange);
            state.record_category(categorized.value)?;
            info!(category = %categorized.value, "Email categorized");

            let drafted = self
                .drafter
                .draft(state.email(), categorized.value)
                .await?;
            state.extend_transcript(drafted.exchange);
            state.record_draft(drafted.value)?;
            Branch::Legitimate
        };

        let notification = state.notification()?;
        debug!(
            kind = notification.label(),
            sender = %notification.email().sender,
            "Notifying reviewer"
        );
        self.notifier.notify(&notification).await?;
        state.mark_notified()?;

        let finished_at = Utc::now();
        info!(
            branch = ?branch,
            llm_messages = state.transcript().len(),
            elapsed_ms = (finished_at - state.started_at()).num_milliseconds(),
            "Run complete"
        );

        Ok(RunOutcome {
            branch,
            state,
            finished_at,
        })
    }
}
