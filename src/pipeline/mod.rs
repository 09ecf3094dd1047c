//! Email triage pipeline.
//!
//! Every email flows through:
//! 1. `SpamClassifier::classify()` — rules engine, then LLM
//! 2. spam → `Notifier::notify()` with the verdict
//! 3. legitimate → `CategoryClassifier::categorize()` → `ResponseDrafter::draft()`
//!    → `Notifier::notify()` with the draft
//!
//! **No auto-reply path exists.** Drafts are only ever shown to the reviewer.

pub mod classifier;
pub mod drafter;
pub mod exchange;
pub mod notifier;
pub mod parse;
pub mod prompts;
pub mod rules;
pub mod types;
pub mod workflow;

pub use classifier::{CategoryClassifier, LlmCategoryClassifier, LlmSpamClassifier, SpamClassifier};
pub use drafter::{LlmResponseDrafter, ResponseDrafter};
pub use exchange::StepOutput;
pub use notifier::{ConsoleNotifier, Notifier};
pub use rules::RulesEngine;
pub use types::{
    Branch, Category, DraftResponse, EmailMessage, Notification, RunOutcome, SpamVerdict, Stage,
    VerdictSource, WorkflowState,
};
pub use workflow::Workflow;
