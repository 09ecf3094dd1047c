//! End-to-end runs of the triage workflow against a scripted LLM.
//!
//! The LLM-backed classifiers and drafter are real; only the provider is
//! stubbed, answering from a fixed queue of canned responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mail_triage::config::{PromptConfig, TriageConfig};
use mail_triage::error::{LlmError, PipelineError};
use mail_triage::llm::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};
use mail_triage::pipeline::{
    Branch, Category, ConsoleNotifier, LlmCategoryClassifier, LlmResponseDrafter,
    LlmSpamClassifier, Notification, Notifier, RulesEngine, Stage, VerdictSource, Workflow,
};
use mail_triage::pipeline::types::EmailMessage;

/// Answers each call with the next canned response and records requests.
struct ScriptedLlm {
    responses: Mutex<VecDeque<&'static str>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    fn new(responses: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().copied().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(content) => Ok(CompletionResponse {
                content: content.to_string(),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
            }),
            None => Err(LlmError::RequestFailed {
                provider: "scripted".into(),
                reason: "script exhausted".into(),
            }),
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), PipelineError> {
        self.seen.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

fn build(
    llm: Arc<ScriptedLlm>,
    rules: RulesEngine,
    notifier: Arc<dyn Notifier>,
) -> Workflow {
    let prompts = PromptConfig::default();
    Workflow::new(
        Arc::new(LlmSpamClassifier::new(llm.clone(), prompts.clone(), rules)),
        Arc::new(LlmCategoryClassifier::new(llm.clone(), prompts.clone())),
        Arc::new(LlmResponseDrafter::new(llm, prompts)),
        notifier,
    )
}

fn spam_email() -> EmailMessage {
    EmailMessage::new("a@b.com", "Buy now!!!", "Click this link for free money")
}

fn complaint_email() -> EmailMessage {
    EmailMessage::new("x@y.com", "Order issue", "My order arrived damaged")
}

#[tokio::test]
async fn spam_email_gets_single_spam_notification() {
    let llm = ScriptedLlm::new(&[r#"{"is_spam": true, "reason": "promises free money"}"#]);
    let notifier = Arc::new(RecordingNotifier::default());
    let workflow = build(llm.clone(), RulesEngine::empty(), notifier.clone());

    let outcome = workflow.run(spam_email()).await.unwrap();

    assert_eq!(outcome.branch, Branch::Spam);
    assert!(outcome.state.category().is_none());
    assert!(outcome.state.draft().is_none());
    assert_eq!(llm.calls(), 1);

    let seen = notifier.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    match &seen[0] {
        Notification::Spam { verdict, .. } => {
            assert_eq!(verdict.reason, "promises free money");
            assert_eq!(verdict.source, VerdictSource::Llm);
        }
        other => panic!("Expected Spam, got {:?}", other),
    }
}

#[tokio::test]
async fn complaint_gets_draft_referencing_category() {
    let llm = ScriptedLlm::new(&[
        r#"{"is_spam": false, "reason": "customer reporting a problem"}"#,
        r#"{"category": "complaint"}"#,
        "Dear customer, we are sorry your order arrived damaged. A replacement is on its way.",
    ]);
    let notifier = Arc::new(RecordingNotifier::default());
    let workflow = build(llm.clone(), RulesEngine::default_rules(), notifier.clone());

    let outcome = workflow.run(complaint_email()).await.unwrap();

    assert_eq!(outcome.branch, Branch::Legitimate);
    assert_eq!(outcome.state.stage(), Stage::Notified);
    assert_eq!(outcome.state.category(), Some(Category::Complaint));
    assert_eq!(llm.calls(), 3);

    // The drafting prompt carries the category.
    let requests = llm.requests.lock().unwrap();
    assert!(requests[2].messages[1].content.contains("categorized as: complaint"));

    // Three user/assistant pairs.
    let transcript = outcome.state.transcript();
    assert_eq!(transcript.len(), 6);
    assert_eq!(transcript[5].role, Role::Assistant);

    let seen = notifier.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    match &seen[0] {
        Notification::Draft { category, draft, .. } => {
            assert_eq!(*category, Category::Complaint);
            assert!(draft.text.contains("arrived damaged"));
        }
        other => panic!("Expected Draft, got {:?}", other),
    }
}

#[tokio::test]
async fn same_script_takes_same_branch() {
    let script = [
        r#"{"is_spam": false, "reason": "ok"}"#,
        r#"{"category": "inquiry"}"#,
        "Thanks for reaching out.",
    ];
    let mut branches = Vec::new();
    for _ in 0..3 {
        let llm = ScriptedLlm::new(&script);
        let workflow = build(llm, RulesEngine::empty(), Arc::new(RecordingNotifier::default()));
        branches.push(workflow.run(complaint_email()).await.unwrap().branch);
    }
    assert!(branches.iter().all(|b| *b == Branch::Legitimate));
}

#[tokio::test]
async fn rules_catch_spam_without_llm_call() {
    let llm = ScriptedLlm::new(&[]);
    let notifier = Arc::new(RecordingNotifier::default());
    let workflow = build(llm.clone(), RulesEngine::default_rules(), notifier.clone());

    let outcome = workflow
        .run(EmailMessage::new(
            "winner@lottery-intl.com",
            "YOU HAVE WON $5,000,000!!!",
            "To claim your prize, please send us your bank details and a processing fee of $100.",
        ))
        .await
        .unwrap();

    assert_eq!(outcome.branch, Branch::Spam);
    assert_eq!(llm.calls(), 0);
    assert!(outcome.state.transcript().is_empty());
    assert_eq!(notifier.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_classification_aborts_run() {
    let llm = ScriptedLlm::new(&["Not spam, I think."]);
    let notifier = Arc::new(RecordingNotifier::default());
    let workflow = build(llm.clone(), RulesEngine::empty(), notifier.clone());

    let err = workflow.run(complaint_email()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Classification(_)));
    assert_eq!(llm.calls(), 1);
    assert!(notifier.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn llm_failure_mid_run_aborts_without_notification() {
    // Script runs out before drafting.
    let llm = ScriptedLlm::new(&[
        r#"{"is_spam": false, "reason": "ok"}"#,
        r#"{"category": "request"}"#,
    ]);
    let notifier = Arc::new(RecordingNotifier::default());
    let workflow = build(llm, RulesEngine::empty(), notifier.clone());

    let err = workflow.run(complaint_email()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Llm(LlmError::RequestFailed { .. })));
    assert!(notifier.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn batch_isolates_failures() {
    let llm = ScriptedLlm::new(&[
        r#"{"is_spam": true, "reason": "scam"}"#,
        "garbage",
        r#"{"is_spam": true, "reason": "scam again"}"#,
    ]);
    let notifier = Arc::new(RecordingNotifier::default());
    let workflow = build(llm, RulesEngine::empty(), notifier.clone());

    let results = workflow
        .run_batch(vec![spam_email(), complaint_email(), spam_email()])
        .await;

    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());
    assert_eq!(notifier.seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn console_notifier_prints_draft_for_reviewer() {
    let llm = ScriptedLlm::new(&[
        r#"{"is_spam": false, "reason": "ok"}"#,
        r#"{"category": "thank you"}"#,
        "You're most welcome.",
    ]);
    let notifier = Arc::new(ConsoleNotifier::new(Vec::new(), "Mr. Hugg"));
    let workflow = build(llm, RulesEngine::empty(), notifier.clone());

    workflow
        .run(EmailMessage::new("fan@example.com", "Thanks!", "Thank you for the help."))
        .await
        .unwrap();
    drop(workflow);

    let notifier = Arc::try_unwrap(notifier).ok().expect("sole owner");
    let printed = String::from_utf8(notifier.into_inner()).unwrap();
    assert!(printed.contains("Mr. Hugg, you've received an email from fan@example.com."));
    assert!(printed.contains("Category: thank you"));
    assert!(printed.contains("You're most welcome."));
}

#[test]
fn workflow_builds_from_config() {
    let config = TriageConfig::from_lookup(|key| match key {
        "OPENAI_API_KEY" => Some("sk-test".to_string()),
        "MAIL_TRIAGE_TRUSTED_SENDERS" => Some("(unclosed".to_string()),
        _ => None,
    })
    .unwrap();
    let llm: Arc<dyn LlmProvider> = ScriptedLlm::new(&[]);
    let result = Workflow::from_config(&config, llm, Arc::new(RecordingNotifier::default()));
    assert!(result.is_err());
}
