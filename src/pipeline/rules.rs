//! Pre-LLM rules engine for obvious spam.
//!
//! Runs before the LLM classifier to short-circuit blatant cases:
//! - lottery/prize announcements
//! - requests for bank details or an upfront "processing fee"
//! - "free money" / "click here" lures
//! - sender domains commonly used by bulk scam senders
//!
//! A match produces a spam `SpamVerdict` with `VerdictSource::Rules` and the
//! LLM call is skipped. No match means the LLM decides. Rules only ever
//! flag spam; they never declare mail legitimate.

use regex::Regex;
use tracing::debug;

use crate::pipeline::types::{EmailMessage, SpamVerdict, VerdictSource};

/// Which field a rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    Sender,
    Subject,
    Body,
}

/// A single spam rule with a compiled regex.
#[derive(Debug, Clone)]
pub struct SpamRule {
    pub regex: Regex,
    pub field: RuleField,
    /// Why this rule triggers; becomes the verdict reason.
    pub reason: String,
}

impl SpamRule {
    pub fn new(pattern: &str, field: RuleField, reason: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            field,
            reason: reason.into(),
        })
    }

    fn matches(&self, email: &EmailMessage) -> bool {
        let value = match self.field {
            RuleField::Sender => &email.sender,
            RuleField::Subject => &email.subject,
            RuleField::Body => &email.body,
        };
        self.regex.is_match(value)
    }
}

/// Built-in rules: (pattern, field, reason).
const DEFAULT_RULES: &[(&str, RuleField, &str)] = &[
    (
        r"(?i)\b(you('ve| have)? (won|been selected)|claim your (prize|winnings|reward))\b",
        RuleField::Subject,
        "prize/lottery announcement",
    ),
    (
        r"(?i)\b(you('ve| have)? won|claim your (prize|winnings|reward)|winner of our)\b",
        RuleField::Body,
        "prize/lottery announcement",
    ),
    (
        r"(?i)\b(send|provide|confirm) (us )?your (bank|account|credit card) (details|information|number)",
        RuleField::Body,
        "requests banking details",
    ),
    (
        r"(?i)\bprocessing fee\b",
        RuleField::Body,
        "asks for an upfront fee",
    ),
    (
        r"(?i)\b(free money|risk[- ]free (cash|income)|make \$?\d[\d,]* (a|per) (day|week))\b",
        RuleField::Body,
        "easy-money lure",
    ),
    (
        r"(?i)@[\w.-]*(lottery|prize|winner)[\w-]*\.",
        RuleField::Sender,
        "lottery-style sender domain",
    ),
];

/// Pre-LLM rules engine for spam.
pub struct RulesEngine {
    rules: Vec<SpamRule>,
    /// Senders that always go to the LLM (bypass every rule).
    trusted_senders: Vec<Regex>,
}

impl RulesEngine {
    /// Create a rules engine with the built-in spam patterns.
    pub fn default_rules() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .filter_map(|(pattern, field, reason)| SpamRule::new(pattern, *field, reason).ok())
            .collect();
        Self {
            rules,
            trusted_senders: Vec::new(),
        }
    }

    /// Create an empty rules engine.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            trusted_senders: Vec::new(),
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Add a sender pattern that bypasses all rules.
    pub fn add_trusted_sender(&mut self, pattern: &str) -> Result<(), regex::Error> {
        self.trusted_senders.push(Regex::new(pattern)?);
        Ok(())
    }

    /// Evaluate an email against all rules.
    ///
    /// Returns `Some(SpamVerdict)` if a rule matches (short-circuits the LLM).
    pub fn evaluate(&self, email: &EmailMessage) -> Option<SpamVerdict> {
        if self.trusted_senders.iter().any(|r| r.is_match(&email.sender)) {
            debug!(sender = %email.sender, "Trusted sender, bypassing spam rules");
            return None;
        }

        let rule = self.rules.iter().find(|rule| rule.matches(email))?;
        debug!(
            sender = %email.sender,
            field = ?rule.field,
            reason = %rule.reason,
            "Email matched spam rule"
        );
        Some(SpamVerdict {
            is_spam: true,
            reason: format!("Matched spam rule: {}", rule.reason),
            source: VerdictSource::Rules,
        })
    }
}
