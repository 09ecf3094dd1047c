//! Parsing of structured LLM answers.
//!
//! Models are asked for a bare JSON object but often wrap it in markdown or
//! prose, so the object is located first and then deserialized.

use serde::Deserialize;
use tracing::warn;

use crate::pipeline::types::{Category, SpamVerdict, VerdictSource};

#[derive(Debug, Deserialize)]
struct SpamAnswer {
    is_spam: Option<bool>,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct CategoryAnswer {
    category: Option<String>,
}

/// Parse a spam classification answer.
///
/// `is_spam` is required. An empty reason gets a default.
pub fn parse_spam_verdict(raw: &str) -> Result<SpamVerdict, String> {
    let json_str = extract_json_object(raw).ok_or("no JSON object in response")?;
    let answer: SpamAnswer =
        serde_json::from_str(json_str).map_err(|e| format!("JSON parse error: {e}"))?;
    let is_spam = answer.is_spam.ok_or("response is missing 'is_spam'")?;
    let reason = answer.reason.trim();

    Ok(SpamVerdict {
        is_spam,
        reason: if reason.is_empty() {
            if is_spam {
                "Flagged as spam (no reason given)".into()
            } else {
                "Looks legitimate (no reason given)".into()
            }
        } else {
            reason.to_string()
        },
        source: VerdictSource::Llm,
    })
}

/// Parse a categorization answer.
///
/// A missing `category` field is an error; an unrecognized label maps to
/// `Category::Other`.
pub fn parse_category(raw: &str) -> Result<Category, String> {
    let json_str = extract_json_object(raw).ok_or("no JSON object in response")?;
    let answer: CategoryAnswer =
        serde_json::from_str(json_str).map_err(|e| format!("JSON parse error: {e}"))?;
    let label = answer
        .category
        .filter(|c| !c.trim().is_empty())
        .ok_or("response is missing 'category'")?;

    Ok(Category::from_label(&label).unwrap_or_else(|| {
        warn!(label = %label, "Unrecognized category label, using 'other'");
        Category::Other
    }))
}

/// Locate a JSON object in LLM output (handles markdown wrapping).
pub fn extract_json_object(text: &str) -> Option<&str> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let after = &trimmed[start + fence.len()..];
            if let Some(end) = after.find("```") {
                let inner = after[..end].trim();
                if inner.starts_with('{') {
                    return Some(inner);
                }
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => Some(&trimmed[start..=end]),
        _ => None,
    }
}
