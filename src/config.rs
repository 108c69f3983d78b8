//! Validator settings loaded from YAML.
//!
//! ```yaml
//! tag_key: validation
//! max_depth: 32
//! ```
//!
//! Both keys are optional. Unknown keys are rejected.

use crate::error::ConfigError;
use crate::validator::{DEFAULT_MAX_DEPTH, DEFAULT_TAG_KEY};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Annotation key read from each field.
    pub tag_key: String,
    /// Deepest record nesting walked before giving up.
    pub max_depth: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            tag_key: DEFAULT_TAG_KEY.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ValidatorConfig {
    /// Parses and checks a YAML configuration. Blank input yields the defaults.
    pub fn from_yaml(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_saphyr::from_str(input).map_err(|e| ConfigError::Yaml {
            message: e.to_string(),
        })?;
        config.check()?;
        Ok(config)
    }

    /// Rejects settings no validator can run with.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.tag_key.is_empty() {
            return Err(ConfigError::Invalid {
                field: "tag_key",
                reason: "must not be empty".to_string(),
            });
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_default() {
        assert_eq!(ValidatorConfig::from_yaml("  \n").unwrap(), ValidatorConfig::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ValidatorConfig::from_yaml("tag_key: check\n").unwrap();
        assert_eq!(config.tag_key, "check");
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ValidatorConfig::from_yaml("tag: check\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn zero_depth_is_rejected() {
        let err = ValidatorConfig::from_yaml("max_depth: 0\n").unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                field: "max_depth",
                reason: "must be at least 1".to_string(),
            }
        );
    }
}
