//! Shared types for the triage workflow.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::llm::ChatMessage;

// ── Email ───────────────────────────────────────────────────────────

/// A single inbound email. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub sender: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

// ── Spam verdict ────────────────────────────────────────────────────

/// What produced a spam verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    /// A pre-LLM rule matched.
    Rules,
    Llm,
}

/// Spam/legitimate decision plus justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpamVerdict {
    pub is_spam: bool,
    pub reason: String,
    pub source: VerdictSource,
}

// ── Category ────────────────────────────────────────────────────────

/// Intent label for legitimate mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Inquiry,
    Complaint,
    ThankYou,
    Request,
    Information,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Inquiry,
        Category::Complaint,
        Category::ThankYou,
        Category::Request,
        Category::Information,
        Category::Other,
    ];

    /// Machine label, as used in LLM answers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inquiry => "inquiry",
            Self::Complaint => "complaint",
            Self::ThankYou => "thank_you",
            Self::Request => "request",
            Self::Information => "information",
            Self::Other => "other",
        }
    }

    /// Parse a label leniently: case-insensitive, spaces and hyphens as `_`.
    ///
    /// Returns `None` for labels outside the set.
    pub fn from_label(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        Self::ALL.into_iter().find(|c| c.label() == normalized)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().replace('_', " "))
    }
}

// ── Draft ───────────────────────────────────────────────────────────

/// A human-reviewable reply. Never sent automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftResponse {
    pub text: String,
    pub category: Category,
}

// ── Workflow state ──────────────────────────────────────────────────

/// Position of a run in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intake,
    Classified,
    Categorized,
    Drafted,
    Notified,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Intake => "intake",
            Self::Classified => "classified",
            Self::Categorized => "categorized",
            Self::Drafted => "drafted",
            Self::Notified => "notified",
        };
        f.write_str(s)
    }
}

/// Which side of the spam fork a run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Spam,
    Legitimate,
}

/// Mutable record threaded through one run.
///
/// Fields are only written through the transition methods, which enforce
/// stage order and keep category/draft absent on the spam branch.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    email: EmailMessage,
    stage: Stage,
    verdict: Option<SpamVerdict>,
    category: Option<Category>,
    draft: Option<DraftResponse>,
    transcript: Vec<ChatMessage>,
}

impl WorkflowState {
    pub fn new(email: EmailMessage) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            email,
            stage: Stage::Intake,
            verdict: None,
            category: None,
            draft: None,
            transcript: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn email(&self) -> &EmailMessage {
        &self.email
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn verdict(&self) -> Option<&SpamVerdict> {
        self.verdict.as_ref()
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn draft(&self) -> Option<&DraftResponse> {
        self.draft.as_ref()
    }

    /// Every prompt/response exchanged with the LLM during this run.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// The branch, once classified.
    pub fn branch(&self) -> Option<Branch> {
        self.verdict.as_ref().map(|v| {
            if v.is_spam {
                Branch::Spam
            } else {
                Branch::Legitimate
            }
        })
    }

    pub fn extend_transcript(&mut self, messages: impl IntoIterator<Item = ChatMessage>) {
        self.transcript.extend(messages);
    }

    pub fn record_verdict(&mut self, verdict: SpamVerdict) -> Result<(), PipelineError> {
        self.expect_stage(Stage::Intake, Stage::Classified)?;
        self.verdict = Some(verdict);
        self.stage = Stage::Classified;
        Ok(())
    }

    pub fn record_category(&mut self, category: Category) -> Result<(), PipelineError> {
        self.expect_stage(Stage::Classified, Stage::Categorized)?;
        self.expect_branch(Branch::Legitimate, Stage::Categorized)?;
        self.category = Some(category);
        self.stage = Stage::Categorized;
        Ok(())
    }

    pub fn record_draft(&mut self, draft: DraftResponse) -> Result<(), PipelineError> {
        self.expect_stage(Stage::Categorized, Stage::Drafted)?;
        if self.category != Some(draft.category) {
            return Err(self.invalid(Stage::Drafted));
        }
        self.draft = Some(draft);
        self.stage = Stage::Drafted;
        Ok(())
    }

    /// Terminal transition. Allowed from `Classified` on the spam branch
    /// and from `Drafted` on the legitimate branch.
    pub fn mark_notified(&mut self) -> Result<(), PipelineError> {
        let ready = match self.branch() {
            Some(Branch::Spam) => self.stage == Stage::Classified,
            Some(Branch::Legitimate) => self.stage == Stage::Drafted,
            None => false,
        };
        if !ready {
            return Err(self.invalid(Stage::Notified));
        }
        self.stage = Stage::Notified;
        Ok(())
    }

    /// The notification this state is ready to emit.
    pub fn notification(&self) -> Result<Notification, PipelineError> {
        match (self.stage, self.verdict.as_ref(), self.category, self.draft.as_ref()) {
            (Stage::Classified, Some(verdict), None, None) if verdict.is_spam => {
                Ok(Notification::Spam {
                    email: self.email.clone(),
                    verdict: verdict.clone(),
                })
            }
            (Stage::Drafted, Some(verdict), Some(category), Some(draft)) if !verdict.is_spam => {
                Ok(Notification::Draft {
                    email: self.email.clone(),
                    category,
                    draft: draft.clone(),
                })
            }
            _ => Err(self.invalid(Stage::Notified)),
        }
    }

    fn expect_stage(&self, expected: Stage, target: Stage) -> Result<(), PipelineError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(self.invalid(target))
        }
    }

    fn expect_branch(&self, expected: Branch, target: Stage) -> Result<(), PipelineError> {
        if self.branch() == Some(expected) {
            Ok(())
        } else {
            Err(self.invalid(target))
        }
    }

    fn invalid(&self, target: Stage) -> PipelineError {
        PipelineError::InvalidTransition {
            from: self.stage.to_string(),
            to: target.to_string(),
        }
    }
}

// ── Notification ────────────────────────────────────────────────────

/// The terminal output of a run, surfaced to the reviewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Spam {
        email: EmailMessage,
        verdict: SpamVerdict,
    },
    Draft {
        email: EmailMessage,
        category: Category,
        draft: DraftResponse,
    },
}

impl Notification {
    pub fn email(&self) -> &EmailMessage {
        match self {
            Self::Spam { email, .. } | Self::Draft { email, .. } => email,
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Spam { .. } => "spam",
            Self::Draft { .. } => "draft",
        }
    }
}

// ── Outcome ─────────────────────────────────────────────────────────

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub branch: Branch,
    pub state: WorkflowState,
    pub finished_at: DateTime<Utc>,
}
