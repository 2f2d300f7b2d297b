//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};
use crate::verdict::Verdict;

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Compatibility verdicts
    /// Tool version carries a `warn` verdict for this repository version
    CompatWarn,

    /// Tool version carries an `error` verdict for this repository version
    CompatError,

    /// Repository version has no table in a non-empty compatibility map
    RepoVersionUnlisted,

    // Descriptor problems
    /// Repository descriptor could not be read or parsed
    DescriptorInvalid,

    /// Compatibility map in a descriptor is malformed
    CompatMapInvalid,

    /// Descriptor declares compatibility data but not which repository version is installed
    RepoVersionMissing,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompatWarn => "COMPAT_WARN",
            Self::CompatError => "COMPAT_ERROR",
            Self::RepoVersionUnlisted => "REPO_VERSION_UNLISTED",
            Self::DescriptorInvalid => "DESCRIPTOR_INVALID",
            Self::CompatMapInvalid => "COMPAT_MAP_INVALID",
            Self::RepoVersionMissing => "REPO_VERSION_MISSING",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - blocking issue
    Error,
}

impl From<Verdict> for Severity {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Good => Self::Info,
            Verdict::Warn => Self::Warn,
            Verdict::Error => Self::Error,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location of the descriptor a diagnostic came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to the scan root
    pub file: String,
}

impl Location {
    /// Create a new location with just a file path
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into() }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Repository the diagnostic is about
    pub repo: Option<String>,

    /// Descriptor location (best-effort)
    pub location: Option<Location>,

    /// Tool version that was checked
    pub tool_version: Option<String>,

    /// Repository version that was checked
    pub repo_version: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            repo: None,
            location: None,
            tool_version: None,
            repo_version: None,
        }
    }

    /// Set the repository name
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the tool/repository versions involved
    pub fn with_versions(mut self, tool: impl ToString, repo: impl ToString) -> Self {
        self.tool_version = Some(tool.to_string());
        self.repo_version = Some(repo.to_string());
        self
    }
}
