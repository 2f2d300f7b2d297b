//! RepoCompat Core
//!
//! Core domain model with stable, versioned types.
//! Never rename diagnostic codes or verdict names - they are part of the public API.

pub mod version;
pub mod verdict;
pub mod diagnostic;
pub mod report;
pub mod config;
pub mod descriptor;

pub use version::{Version, VersionError};
pub use verdict::{Verdict, VerdictError};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use report::{Report, ReportSummary, ReportVersion};
pub use config::{Config, ConfigError, ToolConfig, CheckConfig, AllowlistRules, DEFAULT_DESCRIPTOR_FILE};
pub use descriptor::{RepoDescriptor, RepoSection, RawCompatMap, RawCompatTable};
