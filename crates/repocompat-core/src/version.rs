//! Dotted `major.minor.patch` versions
//!
//! Both tool versions and repository versions use this type. Ordering is
//! lexicographic over the three components.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

/// A three-component version number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    /// Major version (breaking changes)
    pub major: u64,

    /// Minor version
    pub minor: u64,

    /// Patch version
    pub patch: u64,
}

impl Version {
    /// Sentinel greater than or equal to every parseable version
    pub const MAX: Version = Version {
        major: u64::MAX,
        minor: u64::MAX,
        patch: u64::MAX,
    };

    /// Create a version from its components
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// Parse a dotted version string such as `1.9.0`
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let caps = version_regex()
            .captures(s.trim())
            .ok_or_else(|| VersionError::Parse(s.to_string()))?;

        let component = |idx: usize| -> Result<u64, VersionError> {
            caps[idx]
                .parse::<u64>()
                .map_err(|_| VersionError::Parse(s.to_string()))
        };

        Ok(Self {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("version regex is valid"))
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version string: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dotted_triple() {
        let v: Version = "1.9.0".parse().unwrap();
        assert_eq!(v, Version::new(1, 9, 0));
        assert_eq!(v.to_string(), "1.9.0");
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!(Version::parse(" 2.0.1 ").unwrap(), Version::new(2, 0, 1));
    }

    #[test]
    fn leading_zeros_collapse() {
        assert_eq!(Version::parse("01.0.00").unwrap(), Version::new(1, 0, 0));
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "1", "1.2", "1.2.3.4", "1.x.0", "a.b.c", "-1.0.0", "1..0"] {
            assert_eq!(
                Version::parse(bad),
                Err(VersionError::Parse(bad.to_string())),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn rejects_overflow() {
        assert!(Version::parse("99999999999999999999.0.0").is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = Version::new(1, 10, 0);
        let b = Version::new(2, 0, 0);
        let c = Version::new(1, 9, 99);
        assert!(c < a);
        assert!(a < b);
        assert!(b < Version::MAX);
    }

    #[test]
    fn serde_as_string() {
        let v = Version::new(1, 6, 0);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"1.6.0\"");

        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);

        assert!(serde_json::from_str::<Version>("\"nope\"").is_err());
    }
}
