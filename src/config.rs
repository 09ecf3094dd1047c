//! Configuration types, read from the environment.
//!
//! `main` loads an optional `.env` file first, so every value here may also
//! come from that file.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Default assistant persona used in prompts.
pub const DEFAULT_PERSONA: &str = "Alfred, a discreet butler";

/// Default name of the person who reviews drafts.
pub const DEFAULT_REVIEWER: &str = "Mr. Hugg";

/// Default LLM call timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Prompt and model tuning shared by every LLM-backed step.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Who the assistant speaks as.
    pub persona: String,
    /// Who reviews and personalizes drafts before sending.
    pub reviewer: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            reviewer: DEFAULT_REVIEWER.to_string(),
            temperature: 0.0,
            max_tokens: 1024,
        }
    }
}

/// Top-level configuration for one process.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub llm: LlmConfig,
    pub prompts: PromptConfig,
    /// Run the pre-LLM spam rules.
    pub rules_enabled: bool,
    /// Sender regexes that bypass the rules engine.
    pub trusted_senders: Vec<String>,
}

impl TriageConfig {
    /// Build configuration from environment variables.
    ///
    /// A missing API key for the selected backend is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend: LlmBackend = match lookup("MAIL_TRIAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => LlmBackend::OpenAi,
        };

        let key_var = backend.api_key_var();
        let api_key = lookup(key_var)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = lookup("MAIL_TRIAGE_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| backend.default_model().to_string());

        let timeout_secs: u64 =
            parse_or(&lookup, "MAIL_TRIAGE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAIL_TRIAGE_TIMEOUT_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let defaults = PromptConfig::default();
        let temperature: f32 =
            parse_or(&lookup, "MAIL_TRIAGE_TEMPERATURE", defaults.temperature)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: "MAIL_TRIAGE_TEMPERATURE".to_string(),
                message: format!("{temperature} is outside 0.0..=2.0"),
            });
        }
        let max_tokens: u32 = parse_or(&lookup, "MAIL_TRIAGE_MAX_TOKENS", defaults.max_tokens)?;

        let prompts = PromptConfig {
            persona: lookup("MAIL_TRIAGE_PERSONA").unwrap_or(defaults.persona),
            reviewer: lookup("MAIL_TRIAGE_REVIEWER").unwrap_or(defaults.reviewer),
            temperature,
            max_tokens,
        };

        let rules_enabled = match lookup("MAIL_TRIAGE_RULES") {
            None => true,
            Some(v) => match v.trim().to_lowercase().as_str() {
                "on" | "true" | "1" | "yes" => true,
                "off" | "false" | "0" | "no" => false,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: "MAIL_TRIAGE_RULES".to_string(),
                        message: format!("expected on/off, got '{other}'"),
                    });
                }
            },
        };

        let trusted_senders: Vec<String> = lookup("MAIL_TRIAGE_TRUSTED_SENDERS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key: SecretString::from(api_key),
                model,
                timeout: Duration::from_secs(timeout_secs),
            },
            prompts,
            rules_enabled,
            trusted_senders,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<TriageConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TriageConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_openai() {
        let config = from_pairs(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.llm.backend, LlmBackend::OpenAi);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key.expose_secret(), "sk-test");
        assert_eq!(config.llm.timeout, Duration::from_secs(60));
        assert_eq!(config.prompts.persona, DEFAULT_PERSONA);
        assert_eq!(config.prompts.reviewer, DEFAULT_REVIEWER);
        assert!(config.rules_enabled);
        assert!(config.trusted_senders.is_empty());
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = from_pairs(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "OPENAI_API_KEY"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let err = from_pairs(&[("OPENAI_API_KEY", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn anthropic_backend_uses_its_own_key() {
        let err = from_pairs(&[
            ("MAIL_TRIAGE_BACKEND", "anthropic"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "ANTHROPIC_API_KEY"));

        let config = from_pairs(&[
            ("MAIL_TRIAGE_BACKEND", "anthropic"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
        ])
        .unwrap();
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn overrides_are_applied() {
        let config = from_pairs(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MAIL_TRIAGE_MODEL", "gpt-4o"),
            ("MAIL_TRIAGE_TEMPERATURE", "0.3"),
            ("MAIL_TRIAGE_MAX_TOKENS", "256"),
            ("MAIL_TRIAGE_TIMEOUT_SECS", "15"),
            ("MAIL_TRIAGE_PERSONA", "Jeeves"),
            ("MAIL_TRIAGE_REVIEWER", "Bertie"),
            ("MAIL_TRIAGE_RULES", "off"),
            ("MAIL_TRIAGE_TRUSTED_SENDERS", "@partner\\.io$, ^ceo@"),
        ])
        .unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert!((config.prompts.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.prompts.max_tokens, 256);
        assert_eq!(config.llm.timeout, Duration::from_secs(15));
        assert_eq!(config.prompts.persona, "Jeeves");
        assert_eq!(config.prompts.reviewer, "Bertie");
        assert!(!config.rules_enabled);
        assert_eq!(config.trusted_senders, vec!["@partner\\.io$", "^ceo@"]);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = from_pairs(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MAIL_TRIAGE_MAX_TOKENS", "lots"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MAIL_TRIAGE_MAX_TOKENS"));

        let err = from_pairs(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MAIL_TRIAGE_TEMPERATURE", "3.5"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = from_pairs(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MAIL_TRIAGE_TIMEOUT_SECS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn unknown_rules_toggle_is_rejected() {
        let err = from_pairs(&[("OPENAI_API_KEY", "sk-test"), ("MAIL_TRIAGE_RULES", "maybe")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
