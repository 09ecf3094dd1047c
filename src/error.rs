//! Error types for mail-triage.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration-related errors. All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited")]
    RateLimited { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },
}

/// Errors reading or parsing an inbound email.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read stdin: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("Input is empty")]
    Empty,

    #[error("Unparsable email: {0}")]
    Unparsable(String),

    #[error("Email is missing {0}")]
    MissingField(&'static str),
}

/// Workflow step failures. Any of these aborts the current run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Spam classification failed: {0}")]
    Classification(String),

    #[error("Categorization failed: {0}")]
    Categorization(String),

    #[error("Drafting failed: {0}")]
    Drafting(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Invalid workflow transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}
