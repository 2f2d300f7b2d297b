//! Compatibility verdicts
//!
//! The names are part of the descriptor format. NEVER rename them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Verdict for a tool version against a repository version
///
/// Ordered by severity; `Good` is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Tool and repository work together
    #[default]
    Good,

    /// Tool works, but the user should be told about a known issue
    Warn,

    /// Tool must not be used with this repository
    Error,
}

impl Verdict {
    /// All verdicts in severity order
    pub const ALL: [Verdict; 3] = [Verdict::Good, Verdict::Warn, Verdict::Error];

    /// Canonical name used in descriptors
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn is_good(&self) -> bool {
        *self == Self::Good
    }
}

impl FromStr for Verdict {
    type Err = VerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| VerdictError::Invalid(s.to_string()))
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict coercion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerdictError {
    #[error("Invalid compatibility code: {0}")]
    Invalid(String),
}
