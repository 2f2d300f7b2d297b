//! Configuration schema (repocompat.toml)

use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::version::Version;

/// Default descriptor file name searched for by `scan`
pub const DEFAULT_DESCRIPTOR_FILE: &str = "repository.toml";

/// The tool whose compatibility is being checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Tool name used in diagnostics
    #[serde(default = "default_tool_name")]
    pub name: String,

    /// Version to check when none is given on the command line
    #[serde(default)]
    pub version: Option<Version>,
}

fn default_tool_name() -> String {
    "newt".to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            name: default_tool_name(),
            version: None,
        }
    }
}

/// How verdicts turn into pass/fail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Treat `warn` verdicts as failures
    #[serde(default)]
    pub deny_warnings: bool,

    /// Descriptor file name looked for when scanning a directory
    #[serde(default = "default_descriptor_file")]
    pub descriptor_file: String,
}

fn default_descriptor_file() -> String {
    DEFAULT_DESCRIPTOR_FILE.to_string()
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            deny_warnings: false,
            descriptor_file: default_descriptor_file(),
        }
    }
}

/// Allowlist rules for repositories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowlistRules {
    /// Never check these repositories (glob patterns)
    #[serde(default)]
    pub skip_repos: Vec<String>,
}

impl AllowlistRules {
    /// Check if a repository should be skipped
    pub fn is_repo_skipped(&self, repo: &str) -> bool {
        self.skip_repos.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, repo)
            } else {
                pattern == repo
            }
        })
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub check: CheckConfig,

    #[serde(default)]
    pub allowlist: AllowlistRules,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(path.display().to_string(), e.to_string()))?;

        Ok(())
    }
}

/// Simple glob matching (single `*` wildcard)
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" || pattern == "**" {
        return true;
    }

    if let Some(star_pos) = pattern.find('*') {
        let prefix = &pattern[..star_pos];
        let suffix = &pattern[star_pos + 1..];

        text.len() >= prefix.len() + suffix.len()
            && text.starts_with(prefix)
            && text.ends_with(suffix)
    } else {
        pattern == text
    }
}

/// Config and descriptor loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {0}: {1}")]
    IoError(String, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.tool.name, "newt");
        assert_eq!(config.tool.version, None);
        assert!(!config.check.deny_warnings);
        assert_eq!(config.check.descriptor_file, DEFAULT_DESCRIPTOR_FILE);
    }

    #[test]
    fn parse_full_config() {
        let config = Config::from_toml(
            r#"
            [tool]
            name = "newt"
            version = "1.9.0"

            [check]
            deny_warnings = true

            [allowlist]
            skip_repos = ["vendor-*"]
            "#,
        )
        .unwrap();

        assert_eq!(config.tool.version, Some(Version::new(1, 9, 0)));
        assert!(config.check.deny_warnings);
        assert_eq!(config.check.descriptor_file, DEFAULT_DESCRIPTOR_FILE);
        assert!(config.allowlist.is_repo_skipped("vendor-nordic"));
        assert!(!config.allowlist.is_repo_skipped("apache-mynewt-core"));
    }

    #[test]
    fn bad_tool_version_is_parse_error() {
        let err = Config::from_toml("[tool]\nversion = \"1.x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut config = Config::default();
        config.tool.version = Some(Version::new(1, 2, 3));
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repocompat.toml");

        let mut config = Config::default();
        config.tool.version = Some(Version::new(1, 9, 0));
        config.check.deny_warnings = true;
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn glob_matching() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("vendor-*", "vendor-nordic"));
        assert!(glob_match("*-core", "apache-mynewt-core"));
        assert!(!glob_match("vendor-*", "apache-mynewt-core"));
        assert!(!glob_match("ab*ba", "aba"));
    }
}
