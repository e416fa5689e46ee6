//! # Engine Configuration
//!
//! Host-tunable limits and policies. Every key is optional in the JSON form;
//! missing keys take the defaults below.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default ceiling on the number of elements in one tree
pub const DEFAULT_MAX_NODES: usize = 500;

/// Default ceiling on visibility condition nesting
pub const DEFAULT_MAX_CONDITION_DEPTH: usize = 16;

/// How catalog/registry drift is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryMode {
    /// Drift is fatal when the registry is verified
    #[default]
    Strict,
    /// Missing renderers fall back to a placeholder and are reported as warnings
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    pub max_nodes: usize,
    pub max_condition_depth: usize,
    pub registry_mode: RegistryMode,
    /// Reject props the component schema does not declare. When false they are dropped.
    pub reject_unknown_props: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            max_condition_depth: DEFAULT_MAX_CONDITION_DEPTH,
            registry_mode: RegistryMode::Strict,
            reject_unknown_props: true,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration document
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)
            .map_err(|e| Error::Config(format!("invalid configuration: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    /// Read and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("[JRENDER] Loading configuration from {}", path.display());
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    fn check(&self) -> Result<()> {
        if self.max_nodes == 0 {
            return Err(Error::Config("maxNodes must be at least 1".to_string()));
        }
        if self.max_condition_depth == 0 {
            return Err(Error::Config("maxConditionDepth must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = EngineConfig::from_json_str(r#"{"registryMode": "lenient"}"#).unwrap();
        assert_eq!(config.max_nodes, 500);
        assert_eq!(config.max_condition_depth, 16);
        assert_eq!(config.registry_mode, RegistryMode::Lenient);
        assert!(config.reject_unknown_props);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"maxNodes": 0}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"registryMode": "loose"}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"maxNode": 10}"#),
            Err(Error::Config(_))
        ));
    }
}
