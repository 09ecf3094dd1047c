//! mail-triage — LLM-assisted email screening with human review.

pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
pub mod pipeline;
