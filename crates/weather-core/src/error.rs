//! Configuration error types shared by the SDK crates.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = [
            ConfigError::NotFound("config.toml".into()),
            ConfigError::Invalid("base_url".into()),
            ConfigError::ParseError("line 1".into()),
            ConfigError::MissingSetting("api_key".into()),
        ];

        for err in &errors {
            assert!(!err.user_message().is_empty());
        }
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ConfigError::MissingSetting("api_key".into());
        assert_eq!(err.to_string(), "Missing required setting: api_key");
    }
}
