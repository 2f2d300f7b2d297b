//! Compatibility map construction errors

use repocompat_core::{Version, VersionError, VerdictError};

/// Errors raised while building tables and maps
///
/// Construction is fail-fast: the first error aborts and nothing is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompatError {
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    #[error(transparent)]
    InvalidVerdict(#[from] VerdictError),

    #[error("Compatibility table contains invalid repo version \"{key}\"")]
    InvalidRepoVersion {
        key: String,
        #[source]
        source: VersionError,
    },

    #[error("Compatibility table contains duplicate version specifier: {0}")]
    DuplicateRepoVersion(Version),

    #[error("Compatibility table contains duplicate tool version: {0}")]
    DuplicateThreshold(Version),
}
