//! Migrator configuration

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use statemig_schema::SchemaVersion;

use crate::error::ConfigError;

/// Tunables for a [`StateUpgrader`](crate::StateUpgrader)
///
/// Every field has a default, so an empty document is a valid config:
///
/// ```rust
/// use statemig_core::MigratorConfig;
///
/// let config = MigratorConfig::from_toml_str("parallel_threshold = 8").unwrap();
/// assert_eq!(config.parallel_threshold, 8);
/// assert_eq!(config.target_version, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigratorConfig {
    /// Version to upgrade to; `None` means the upgrader's current version
    pub target_version: Option<SchemaVersion>,
    /// Batch size from which upgrades run on the rayon pool
    pub parallel_threshold: usize,
}

impl MigratorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With an explicit target version
    #[inline]
    #[must_use]
    pub fn with_target_version(mut self, version: SchemaVersion) -> Self {
        self.target_version = Some(version);
        self
    }

    /// With parallel batch threshold
    #[inline]
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Parse TOML
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidToml`] on malformed input or unknown keys.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Parse YAML
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidYaml`] on malformed input or unknown keys.
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Parse JSON
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidJson`] on malformed input or unknown keys.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse in the given format
    ///
    /// # Errors
    /// Returns the parse error of the chosen format.
    pub fn parse(input: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Toml => Self::from_toml_str(input),
            ConfigFormat::Yaml => Self::from_yaml_str(input),
            ConfigFormat::Json => Self::from_json_str(input),
        }
    }
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            target_version: None,
            parallel_threshold: 64,
        }
    }
}

/// Serialization format of a config document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from a file extension (without the dot)
    ///
    /// # Errors
    /// Returns [`ConfigError::UnsupportedFormat`] for unknown extensions.
    pub fn from_extension(extension: &str) -> Result<Self, ConfigError> {
        extension.parse()
    }
}

impl FromStr for ConfigFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MigratorConfig::default();
        assert_eq!(config.target_version, None);
        assert_eq!(config.parallel_threshold, 64);
    }

    #[test]
    fn builder_methods() {
        let config = MigratorConfig::new()
            .with_target_version(SchemaVersion::new(1))
            .with_parallel_threshold(2);
        assert_eq!(config.target_version, Some(SchemaVersion::new(1)));
        assert_eq!(config.parallel_threshold, 2);
    }

    #[test]
    fn parses_all_formats() {
        let toml = MigratorConfig::from_toml_str("target_version = 1\nparallel_threshold = 4").unwrap();
        let yaml = MigratorConfig::from_yaml_str("target_version: 1\nparallel_threshold: 4").unwrap();
        let json = MigratorConfig::from_json_str(r#"{"target_version":1,"parallel_threshold":4}"#)
            .unwrap();
        assert_eq!(toml, yaml);
        assert_eq!(yaml, json);
        assert_eq!(toml.target_version, Some(SchemaVersion::new(1)));
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(MigratorConfig::from_toml_str("").unwrap(), MigratorConfig::default());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            MigratorConfig::from_toml_str("threads = 3"),
            Err(ConfigError::InvalidToml(_))
        ));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("yml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_extension("TOML").unwrap(), ConfigFormat::Toml);
        assert!(matches!(
            ConfigFormat::from_extension("ini"),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"
        ));
        let config = MigratorConfig::parse("{}", ConfigFormat::Json).unwrap();
        assert_eq!(config, MigratorConfig::default());
    }
}
