//! Email intake — turns a file or stdin into an `EmailMessage`.
//!
//! Two input shapes are accepted:
//! - a JSON object `{"sender": ..., "subject": ..., "body": ...}`
//! - a raw RFC 5322 message (`.eml`), parsed with mail-parser
//!
//! Pure parsing lives in `parse_email`; the async readers only do I/O.

use std::path::Path;

use mail_parser::MessageParser;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::IntakeError;
use crate::pipeline::types::EmailMessage;

/// Subject used when the email has none.
pub const NO_SUBJECT: &str = "(no subject)";

#[derive(Debug, Deserialize)]
struct JsonEmail {
    #[serde(default, alias = "from")]
    sender: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default, alias = "content")]
    body: Option<String>,
}

/// Read and parse an email file.
pub async fn read_email_file(path: &Path) -> Result<EmailMessage, IntakeError> {
    let raw = tokio::fs::read(path).await.map_err(|source| IntakeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = raw.len(), "Read email file");
    parse_email(&raw)
}

/// Read and parse one email from stdin.
pub async fn read_email_stdin() -> Result<EmailMessage, IntakeError> {
    let mut raw = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut raw)
        .await
        .map_err(IntakeError::Stdin)?;
    parse_email(&raw)
}

/// Parse raw bytes as JSON or RFC 5322.
pub fn parse_email(raw: &[u8]) -> Result<EmailMessage, IntakeError> {
    let trimmed = raw.trim_ascii();
    if trimmed.is_empty() {
        return Err(IntakeError::Empty);
    }

    // Bytes stay undecoded here; mail-parser applies the declared charset.
    if trimmed.starts_with(b"{") {
        parse_json_email(trimmed)
    } else {
        parse_rfc5322_email(trimmed)
    }
}

fn parse_json_email(raw: &[u8]) -> Result<EmailMessage, IntakeError> {
    let parsed: JsonEmail =
        serde_json::from_slice(raw).map_err(|e| IntakeError::Unparsable(e.to_string()))?;
    build(parsed.sender, parsed.subject, parsed.body)
}

fn parse_rfc5322_email(raw: &[u8]) -> Result<EmailMessage, IntakeError> {
    let parsed = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| IntakeError::Unparsable("not an RFC 5322 message".into()))?;

    let sender = parsed
        .from()
        .and_then(|addr| addr.first())
        .and_then(|a| a.address())
        .map(|s| s.to_string());
    let subject = parsed.subject().map(|s| s.to_string());
    let body = if let Some(text) = parsed.body_text(0) {
        Some(text.to_string())
    } else {
        parsed.body_html(0).map(|html| strip_html(html.as_ref()))
    };

    build(sender, subject, body)
}

fn build(
    sender: Option<String>,
    subject: Option<String>,
    body: Option<String>,
) -> Result<EmailMessage, IntakeError> {
    let sender = sender
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(IntakeError::MissingField("sender"))?;
    let body = body
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .ok_or(IntakeError::MissingField("body"))?;
    let subject = subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NO_SUBJECT.to_string());

    Ok(EmailMessage {
        sender,
        subject,
        body,
    })
}

/// Drop tags from an HTML body and normalize whitespace.
pub fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                result.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}
