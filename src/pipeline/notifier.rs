//! Notifier — surfaces the outcome of a run to the human reviewer.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::PipelineError;
use crate::pipeline::types::Notification;

const RULE_WIDTH: usize = 50;

/// Terminal action of every run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), PipelineError>;
}

/// Writes a human-readable report to a writer (stdout by default).
pub struct ConsoleNotifier<W = tokio::io::Stdout> {
    out: Mutex<W>,
    reviewer: String,
}

impl ConsoleNotifier<tokio::io::Stdout> {
    pub fn stdout(reviewer: &str) -> Self {
        Self::new(tokio::io::stdout(), reviewer)
    }
}

impl<W> ConsoleNotifier<W> {
    pub fn new(out: W, reviewer: &str) -> Self {
        Self {
            out: Mutex::new(out),
            reviewer: reviewer.to_string(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W> Notifier for ConsoleNotifier<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn notify(&self, notification: &Notification) -> Result<(), PipelineError> {
        let report = render(notification, &self.reviewer);
        let mut out = self.out.lock().await;
        out.write_all(report.as_bytes())
            .await
            .map_err(|e| PipelineError::Notification(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| PipelineError::Notification(e.to_string()))
    }
}

/// Render a notification as reviewer-facing text.
pub fn render(notification: &Notification, reviewer: &str) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    match notification {
        Notification::Spam { email, verdict } => format!(
            "\n{heavy}\n\
             {reviewer}, an email from {sender} was marked as spam.\n\
             Subject: {subject}\n\
             Reason: {reason}\n\
             It has not been answered.\n\
             {heavy}\n",
            sender = email.sender,
            subject = email.subject,
            reason = verdict.reason,
        ),
        Notification::Draft {
            email,
            category,
            draft,
        } => format!(
            "\n{heavy}\n\
             {reviewer}, you've received an email from {sender}.\n\
             Subject: {subject}\n\
             Category: {category}\n\n\
             A draft response is ready for your review:\n\
             {light}\n\
             {text}\n\
             {heavy}\n",
            sender = email.sender,
            subject = email.subject,
            text = draft.text,
        ),
    }
}
