//! Repository descriptors (repository.toml)
//!
//! A descriptor names a repository and carries its raw compatibility map.
//! The map stays string-keyed here; building typed tables is the engine's job.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use crate::config::ConfigError;
use crate::version::Version;

/// Tool-version → verdict-name entries for one repository version
pub type RawCompatTable = HashMap<String, String>;

/// Repository-version → raw table
pub type RawCompatMap = HashMap<String, RawCompatTable>;

/// The `[repo]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSection {
    /// Repository name
    pub name: String,

    /// Repository version currently installed
    #[serde(default)]
    pub version: Option<Version>,

    /// Compatibility map keyed by repository version
    #[serde(default, rename = "newt_compatibility", alias = "compatibility")]
    pub compatibility: RawCompatMap,
}

/// A repository descriptor file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoDescriptor {
    pub repo: RepoSection,
}

impl RepoDescriptor {
    /// Load a descriptor from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Parse a descriptor from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.repo.name
    }

    pub fn version(&self) -> Option<Version> {
        self.repo.version
    }

    pub fn compatibility(&self) -> &RawCompatMap {
        &self.repo.compatibility
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const CORE: &str = r#"
        [repo]
        name = "apache-mynewt-core"
        version = "1.6.0"

        [repo.newt_compatibility."1.6.0"]
        "1.9.0" = "good"
        "1.8.0" = "warn"

        [repo.newt_compatibility."1.5.0"]
        "1.7.0" = "good"
    "#;

    #[test]
    fn parse_descriptor() {
        let desc = RepoDescriptor::from_toml(CORE).unwrap();
        assert_eq!(desc.name(), "apache-mynewt-core");
        assert_eq!(desc.version(), Some(Version::new(1, 6, 0)));

        let map = desc.compatibility();
        assert_eq!(map.len(), 2);

        let expected: RawCompatTable = [
            ("1.9.0".to_string(), "good".to_string()),
            ("1.8.0".to_string(), "warn".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(map["1.6.0"], expected);
    }

    #[test]
    fn compatibility_is_optional() {
        let desc = RepoDescriptor::from_toml("[repo]\nname = \"blinky\"\n").unwrap();
        assert!(desc.compatibility().is_empty());
        assert_eq!(desc.version(), None);
    }

    #[test]
    fn non_string_verdict_rejected() {
        let err = RepoDescriptor::from_toml(
            "[repo]\nname = \"x\"\n[repo.newt_compatibility.\"1.0.0\"]\n\"1.0.0\" = 3\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CORE.as_bytes()).unwrap();

        let desc = RepoDescriptor::from_file(file.path()).unwrap();
        assert_eq!(desc.name(), "apache-mynewt-core");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RepoDescriptor::from_file(Path::new("/nonexistent/repository.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(..)));
    }
}
