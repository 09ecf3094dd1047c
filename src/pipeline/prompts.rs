//! Prompt construction for the three LLM steps.

use crate::config::PromptConfig;
use crate::pipeline::types::{Category, EmailMessage};

/// Body characters embedded in a prompt.
const MAX_BODY_CHARS: usize = 4000;

/// Render the email block shared by every prompt.
pub fn email_block(email: &EmailMessage) -> String {
    let body: String = email.body.chars().take(MAX_BODY_CHARS).collect();
    let truncated = if email.body.chars().count() > MAX_BODY_CHARS {
        "\n[body truncated]"
    } else {
        ""
    };
    format!(
        "Email:\nFrom: {}\nSubject: {}\nBody:\n{}{}",
        email.sender, email.subject, body, truncated
    )
}

pub fn spam_system_prompt(config: &PromptConfig) -> String {
    format!(
        "You are {persona}, screening incoming email. Decide whether the email is spam \
         (unsolicited, fraudulent, phishing, or bulk marketing) or legitimate.\n\n\
         Respond with ONLY a JSON object:\n\
         {{\"is_spam\": true|false, \"reason\": \"one sentence explaining the decision\"}}",
        persona = config.persona
    )
}

pub fn spam_user_prompt(email: &EmailMessage) -> String {
    format!("Analyze this email and determine if it is spam.\n\n{}", email_block(email))
}

pub fn category_system_prompt(config: &PromptConfig) -> String {
    let labels: Vec<&str> = Category::ALL.iter().map(Category::label).collect();
    format!(
        "You are {persona}, sorting legitimate email. Assign exactly one category.\n\n\
         Categories: {labels}\n\n\
         Respond with ONLY a JSON object:\n\
         {{\"category\": \"<one of the categories>\"}}",
        persona = config.persona,
        labels = labels.join(", ")
    )
}

pub fn category_user_prompt(email: &EmailMessage) -> String {
    format!("Categorize this email.\n\n{}", email_block(email))
}

pub fn draft_system_prompt(config: &PromptConfig) -> String {
    format!(
        "You are {persona}. Draft brief, polite, professional preliminary replies that \
         {reviewer} can review and personalize before sending.\n\n\
         Rules:\n\
         - Reply with the draft text only, no preamble or commentary\n\
         - Do not promise anything {reviewer} has not agreed to\n\
         - Sign off on behalf of {reviewer}",
        persona = config.persona,
        reviewer = config.reviewer
    )
}

pub fn draft_user_prompt(email: &EmailMessage, category: Category) -> String {
    format!(
        "Draft a response to this email.\n\n{}\n\nThis email has been categorized as: {}",
        email_block(email),
        category
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> EmailMessage {
        EmailMessage::new(
            "john.smith@example.com",
            "Question about your services",
            "Could we schedule a call next week?",
        )
    }

    #[test]
    fn email_block_embeds_all_fields() {
        let block = email_block(&email());
        assert!(block.contains("From: john.smith@example.com"));
        assert!(block.contains("Subject: Question about your services"));
        assert!(block.contains("schedule a call"));
        assert!(!block.contains("truncated"));
    }

    #[test]
    fn email_block_truncates_long_bodies() {
        let long = EmailMessage::new("a@b.com", "long", "y".repeat(MAX_BODY_CHARS * 2));
        let block = email_block(&long);
        assert!(block.contains("[body truncated]"));
        assert!(block.len() < MAX_BODY_CHARS + 200);
    }

    #[test]
    fn spam_prompt_requests_json_verdict() {
        let prompt = spam_system_prompt(&PromptConfig::default());
        assert!(prompt.contains("\"is_spam\""));
        assert!(prompt.contains("Alfred"));
    }

    #[test]
    fn category_prompt_lists_every_label() {
        let prompt = category_system_prompt(&PromptConfig::default());
        for category in Category::ALL {
            assert!(prompt.contains(category.label()));
        }
    }

    #[test]
    fn draft_prompts_mention_reviewer_and_category() {
        let config = PromptConfig {
            reviewer: "Bertie".into(),
            ..PromptConfig::default()
        };
        assert!(draft_system_prompt(&config).contains("Bertie"));
        let user = draft_user_prompt(&email(), Category::ThankYou);
        assert!(user.contains("categorized as: thank you"));
    }
}
