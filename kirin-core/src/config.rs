//! Configuration types

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How newly added conditions join the existing condition tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    #[default]
    And,
    Or,
}

impl CombineMode {
    pub fn use_and(&self) -> bool {
        matches!(self, CombineMode::And)
    }
}

/// Engine configuration.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KirinConfig {
    /// How many valid node types an INVALID_NODE_TYPE suggestion lists.
    pub node_type_sample: usize,
    /// Connective used when merging ADD constraints.
    pub combine: CombineMode,
    /// Report aliases declared more than once as DUPLICATE_ALIAS.
    pub report_duplicate_aliases: bool,
    /// Drop repeated constraints during text extraction.
    pub dedupe_constraints: bool,
}

impl Default for KirinConfig {
    fn default() -> Self {
        Self {
            node_type_sample: 10,
            combine: CombineMode::And,
            report_duplicate_aliases: true,
            dedupe_constraints: true,
        }
    }
}

impl KirinConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: KirinConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_type_sample == 0 {
            return Err(ConfigError::InvalidValue {
                field: "node_type_sample".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = KirinConfig::from_toml_str("").unwrap();
        assert_eq!(config, KirinConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = KirinConfig::from_toml_str("combine = \"or\"\nnode_type_sample = 3\n").unwrap();
        assert_eq!(config.combine, CombineMode::Or);
        assert_eq!(config.node_type_sample, 3);
        assert!(config.report_duplicate_aliases);
    }

    #[test]
    fn test_zero_sample_rejected() {
        let err = KirinConfig::from_toml_str("node_type_sample = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = KirinConfig::from_toml_str("colour = \"blue\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = KirinConfig::from_file("/nonexistent/kirin.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/kirin.toml"));
    }
}
