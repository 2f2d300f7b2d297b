//! Per-repository compatibility maps
//!
//! A map holds one [`CompatTable`] per repository version declared in a
//! descriptor. It is built once and only read afterwards.

use repocompat_core::{Diagnostic, DiagnosticCode, RepoDescriptor, Severity, Verdict, Version};
use std::collections::HashMap;
use crate::error::CompatError;
use crate::table::{CompatTable, Evaluation};

/// Repository version → compatibility table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatMap {
    tables: HashMap<Version, CompatTable>,
}

impl CompatMap {
    /// Build a map from nested repo-version → (tool-version → verdict) pairs
    ///
    /// All-or-nothing: any malformed key, duplicate repository version or bad
    /// table entry fails the whole map.
    pub fn from_raw<I, K, T, TK, TV>(raw: I) -> Result<Self, CompatError>
    where
        I: IntoIterator<Item = (K, T)>,
        K: AsRef<str>,
        T: IntoIterator<Item = (TK, TV)>,
        TK: AsRef<str>,
        TV: AsRef<str>,
    {
        let mut tables = HashMap::new();

        for (key, entries) in raw {
            let key = key.as_ref();
            let repo_version: Version = key.parse().map_err(|source| {
                CompatError::InvalidRepoVersion {
                    key: key.to_string(),
                    source,
                }
            })?;

            if tables.contains_key(&repo_version) {
                return Err(CompatError::DuplicateRepoVersion(repo_version));
            }

            let table = CompatTable::from_str_map(entries)?;
            tables.insert(repo_version, table);
        }

        tracing::debug!(repo_versions = tables.len(), "built compatibility map");
        Ok(Self { tables })
    }

    /// Build the map declared by a repository descriptor
    pub fn from_descriptor(descriptor: &RepoDescriptor) -> Result<Self, CompatError> {
        Self::from_raw(descriptor.compatibility())
    }

    pub fn table(&self, repo_version: Version) -> Option<&CompatTable> {
        self.tables.get(&repo_version)
    }

    /// Repository versions in ascending order
    pub fn repo_versions(&self) -> Vec<Version> {
        let mut versions: Vec<_> = self.tables.keys().copied().collect();
        versions.sort();
        versions
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Check a tool version against one version of a repository
    ///
    /// A repository without compatibility data is assumed compatible. A
    /// repository version missing from a non-empty map is a warning.
    pub fn check(
        &self,
        repo: &str,
        repo_version: Version,
        tool_name: &str,
        tool_version: Version,
    ) -> RepoCheck {
        let lookup = if self.is_empty() {
            MapLookup::NoData
        } else {
            match self.table(repo_version) {
                Some(table) => MapLookup::Matched(table.evaluate(tool_version)),
                None => MapLookup::Unlisted,
            }
        };

        tracing::debug!(repo, %repo_version, %tool_version, ?lookup, "checked repository");

        RepoCheck {
            repo: repo.to_string(),
            repo_version,
            tool_name: tool_name.to_string(),
            tool_version,
            lookup,
        }
    }
}

/// How a repository version was resolved in its map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapLookup {
    /// The repository declares no compatibility data
    NoData,

    /// The map has tables, but none for this repository version
    Unlisted,

    /// The table for this repository version was evaluated
    Matched(Evaluation),
}

/// Outcome of checking a tool version against a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCheck {
    pub repo: String,
    pub repo_version: Version,
    pub tool_name: String,
    pub tool_version: Version,
    pub lookup: MapLookup,
}

impl RepoCheck {
    pub fn verdict(&self) -> Verdict {
        match self.lookup {
            MapLookup::NoData => Verdict::Good,
            MapLookup::Unlisted => Verdict::Warn,
            MapLookup::Matched(eval) => eval.verdict,
        }
    }

    pub fn is_good(&self) -> bool {
        self.verdict().is_good()
    }

    /// Message to show the user; empty for good results
    pub fn message(&self) -> String {
        match self.lookup {
            MapLookup::NoData => String::new(),
            MapLookup::Unlisted => format!(
                "Version {} of the {} repo is missing from its compatibility map",
                self.repo_version, self.repo
            ),
            MapLookup::Matched(eval) if eval.is_good() => String::new(),
            MapLookup::Matched(eval) => {
                let mut msg = format!(
                    "This version of {} ({}) is incompatible with your version of the {} repo ({})",
                    self.tool_name, self.tool_version, self.repo, self.repo_version
                );
                if let Some(remediation) = eval.remediation {
                    msg.push_str("; ");
                    msg.push_str(&remediation.message_for(&self.tool_name));
                }
                msg
            }
        }
    }

    /// Diagnostic for a non-good result
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        let code = match self.lookup {
            MapLookup::NoData => return None,
            MapLookup::Unlisted => DiagnosticCode::RepoVersionUnlisted,
            MapLookup::Matched(eval) => match eval.verdict {
                Verdict::Good => return None,
                Verdict::Warn => DiagnosticCode::CompatWarn,
                Verdict::Error => DiagnosticCode::CompatError,
            },
        };

        Some(
            Diagnostic::new(code, Severity::from(self.verdict()), self.message())
                .with_repo(&self.repo)
                .with_versions(self.tool_version, self.repo_version),
        )
    }
}
