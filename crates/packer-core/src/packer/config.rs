//! Packer configuration surface.

use crate::budget::types::PackError;
use serde::{Deserialize, Serialize};

use super::text::TextFormat;

/// Default separator between text items (a blank line).
pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// Options shared by the message and text packers.
///
/// `text_format` and `separator` only affect the text packer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackerConfig {
    /// Token ceiling; `None` means unlimited
    pub max_tokens: Option<i64>,
    /// Model identifier used to pick an exact token counter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Layout of the text packer output
    pub text_format: TextFormat,
    /// Separator between text items (default: blank line)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

impl PackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, PackError> {
        serde_json::from_str(json).map_err(|e| PackError::Config(e.to_string()))
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(i64::try_from(max_tokens).unwrap_or(i64::MAX));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_format(mut self, text_format: TextFormat) -> Self {
        self.text_format = text_format;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// The ceiling as an unsigned count, rejecting negative values.
    pub fn validated_max_tokens(&self) -> Result<Option<usize>, PackError> {
        match self.max_tokens {
            None => Ok(None),
            Some(max) => usize::try_from(max)
                .map(Some)
                .map_err(|_| PackError::InvalidBudget(max)),
        }
    }

    pub fn separator(&self) -> &str {
        self.separator.as_deref().unwrap_or(DEFAULT_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unlimited_raw_blank_line() {
        let config = PackerConfig::default();
        assert_eq!(config.validated_max_tokens().unwrap(), None);
        assert_eq!(config.text_format, TextFormat::Raw);
        assert_eq!(config.separator(), "\n\n");
    }

    #[test]
    fn negative_ceiling_is_rejected() {
        let config = PackerConfig {
            max_tokens: Some(-5),
            ..Default::default()
        };
        let err = config.validated_max_tokens().unwrap_err();
        assert!(matches!(err, PackError::InvalidBudget(-5)));
    }

    #[test]
    fn non_integer_ceiling_is_a_config_error() {
        let err = PackerConfig::from_json(r#"{"max_tokens": 12.5}"#).unwrap_err();
        assert!(matches!(err, PackError::Config(_)), "got {err:?}");
    }

    #[test]
    fn parses_json_with_defaults() {
        let config =
            PackerConfig::from_json(r#"{"max_tokens": 300, "text_format": "markdown"}"#).unwrap();
        assert_eq!(config.validated_max_tokens().unwrap(), Some(300));
        assert_eq!(config.text_format, TextFormat::Markdown);
        assert_eq!(config.separator(), DEFAULT_SEPARATOR);
        assert_eq!(config.model, None);
    }

    #[test]
    fn builder_setters() {
        let config = PackerConfig::new()
            .with_max_tokens(100)
            .with_model("gpt-4o")
            .with_format(TextFormat::Xml)
            .with_separator(" | ");
        assert_eq!(config.max_tokens, Some(100));
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.separator(), " | ");
    }

    #[test]
    fn empty_separator_is_kept() {
        let config = PackerConfig::new().with_separator("");
        assert_eq!(config.separator(), "");
    }
}
