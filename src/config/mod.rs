//! Configuration loading and management

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::error::{BazaarResult, ConfigError};
use crate::core::query::DEFAULT_LIMIT;
use crate::core::validation::messages::Locale;

/// Paging defaults applied by repositories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PaginationConfig {
    /// Page size when the client sends none (or garbage)
    #[serde(default = "default_limit")]
    #[validate(range(min = 1))]
    pub default_limit: usize,

    /// Upper bound on the page size; unbounded when absent
    #[serde(default)]
    #[validate(range(min = 1))]
    pub max_limit: Option<usize>,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
        }
    }
}

/// What to do with a rule name that has no built-in or registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRulePolicy {
    /// Fail the request as an internal fault (misconfigured form)
    #[default]
    Reject,
    /// Skip the rule with a warning
    Ignore,
}

/// Validation pipeline settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationConfig {
    /// Language of the default error messages
    #[serde(default)]
    pub locale: Locale,

    #[serde(default)]
    pub unknown_rules: UnknownRulePolicy,
}

/// Complete configuration
///
/// ```yaml
/// pagination:
///   default_limit: 10
///   max_limit: 100
/// validation:
///   locale: pt-BR
///   unknown_rules: reject
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, Validate)]
pub struct BazaarConfig {
    #[serde(default)]
    #[validate(nested)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

impl BazaarConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> BazaarResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, Some(path))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> BazaarResult<Self> {
        Self::parse(yaml, None)
    }

    fn parse(yaml: &str, file: Option<&str>) -> BazaarResult<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: file.map(str::to_string),
            message: e.to_string(),
        })?;

        config.validate().map_err(|e| ConfigError::InvalidValue {
            field: "pagination".to_string(),
            message: e.to_string(),
        })?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::BazaarError;

    #[test]
    fn test_default_config() {
        let config = BazaarConfig::default();
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, None);
        assert_eq!(config.validation.locale, Locale::En);
        assert_eq!(config.validation.unknown_rules, UnknownRulePolicy::Reject);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
pagination:
  default_limit: 25
  max_limit: 100
validation:
  locale: pt-BR
  unknown_rules: ignore
"#;
        let config = BazaarConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.pagination.default_limit, 25);
        assert_eq!(config.pagination.max_limit, Some(100));
        assert_eq!(config.validation.locale, Locale::PtBr);
        assert_eq!(config.validation.unknown_rules, UnknownRulePolicy::Ignore);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = BazaarConfig::from_yaml_str("pagination:\n  max_limit: 50\n").unwrap();
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.validation, ValidationConfig::default());
    }

    #[test]
    fn test_zero_default_limit_is_rejected() {
        let err = BazaarConfig::from_yaml_str("pagination:\n  default_limit: 0\n").unwrap_err();
        assert!(matches!(
            err,
            BazaarError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let err = BazaarConfig::from_yaml_str("validation:\n  locale: klingon\n").unwrap_err();
        assert!(matches!(
            err,
            BazaarError::Config(ConfigError::ParseError { file: None, .. })
        ));
    }
}
