//! Compatibility table matching
//!
//! A table maps tool-version thresholds to verdicts for one repository
//! version. An entry applies from its threshold up to (not including) the
//! next higher threshold. Entries are kept sorted ascending by threshold.

use repocompat_core::{Verdict, Version};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use crate::error::CompatError;

/// One row of a compatibility table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatEntry {
    /// Lowest tool version this verdict applies to
    pub threshold: Version,

    pub verdict: Verdict,
}

impl CompatEntry {
    pub fn new(threshold: Version, verdict: Verdict) -> Self {
        Self { threshold, verdict }
    }

    /// Parse an entry from its descriptor strings
    pub fn parse(version: &str, verdict: &str) -> Result<Self, CompatError> {
        Ok(Self {
            threshold: version.parse()?,
            verdict: verdict.parse()?,
        })
    }
}

/// What the user should do about a non-good verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "version", rename_all = "snake_case")]
pub enum Remediation {
    /// The tool is older than the nearest good range; move to this version
    UpgradeTool(Version),

    /// The tool is newer than the good range; the repositories are behind
    UpgradeRepos,
}

impl Remediation {
    /// Render the message naming the tool
    pub fn message_for(&self, tool_name: &str) -> String {
        match self {
            Self::UpgradeTool(target) => {
                format!("Please upgrade your {tool_name} tool to version {target}")
            }
            Self::UpgradeRepos => {
                format!("Please upgrade your repos with \"{tool_name} upgrade\"")
            }
        }
    }
}

impl std::fmt::Display for Remediation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpgradeTool(target) => write!(f, "Please upgrade your tool to version {target}"),
            Self::UpgradeRepos => write!(f, "Please upgrade your repos"),
        }
    }
}

/// Result of matching a tool version against a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub verdict: Verdict,

    /// `None` for good verdicts, and for non-good verdicts no good range explains
    pub remediation: Option<Remediation>,
}

impl Evaluation {
    pub fn is_good(&self) -> bool {
        self.verdict.is_good()
    }

    /// Remediation text, empty when there is none
    pub fn message(&self) -> String {
        self.remediation
            .map(|r| r.to_string())
            .unwrap_or_default()
    }
}

/// Version bounds of one good range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoodRangeBounds {
    /// First tool version inside the range
    pub min: Version,

    /// First tool version past the range (`Version::MAX` if unbounded)
    pub max: Version,

    /// Newest threshold inside the range
    pub target: Version,
}

/// Tool-version thresholds and verdicts for one repository version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompatTable {
    /// Sorted in ascending order by threshold
    entries: Vec<CompatEntry>,
}

impl CompatTable {
    /// Build a table from typed entries
    ///
    /// Entries are sorted by threshold. Two entries with the same threshold are
    /// rejected since their relative order would be arbitrary.
    pub fn new(mut entries: Vec<CompatEntry>) -> Result<Self, CompatError> {
        entries.sort_by_key(|e| e.threshold);

        if let Some(pair) = entries.windows(2).find(|w| w[0].threshold == w[1].threshold) {
            return Err(CompatError::DuplicateThreshold(pair[0].threshold));
        }

        Ok(Self { entries })
    }

    /// Build a table from version-string → verdict-name pairs
    ///
    /// Stops at the first entry that fails to parse.
    pub fn from_str_map<I, K, V>(map: I) -> Result<Self, CompatError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let entries = map
            .into_iter()
            .map(|(version, verdict)| CompatEntry::parse(version.as_ref(), verdict.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let table = Self::new(entries)?;
        tracing::debug!(entries = table.len(), "built compatibility table");
        Ok(table)
    }

    pub fn entries(&self) -> &[CompatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry with the highest threshold not above `tool`
    pub fn governing_index(&self, tool: Version) -> Option<usize> {
        self.entries
            .partition_point(|e| e.threshold <= tool)
            .checked_sub(1)
    }

    pub fn governing_entry(&self, tool: Version) -> Option<&CompatEntry> {
        self.governing_index(tool).map(|idx| &self.entries[idx])
    }

    /// Maximal runs of consecutive `good` entries, as half-open index ranges
    pub fn good_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = None;

        for (i, entry) in self.entries.iter().enumerate() {
            match (start, entry.verdict.is_good()) {
                (None, true) => start = Some(i),
                (Some(s), false) => {
                    ranges.push(s..i);
                    start = None;
                }
                _ => {}
            }
        }

        if let Some(s) = start {
            ranges.push(s..self.entries.len());
        }

        ranges
    }

    /// Version bounds of a range returned by [`good_ranges`](Self::good_ranges)
    ///
    /// `None` for an empty range or one that runs past the end of the table.
    pub fn range_bounds(&self, range: &Range<usize>) -> Option<GoodRangeBounds> {
        if range.is_empty() || range.end > self.entries.len() {
            return None;
        }

        let max = self
            .entries
            .get(range.end)
            .map(|e| e.threshold)
            .unwrap_or(Version::MAX);

        Some(GoodRangeBounds {
            min: self.entries[range.start].threshold,
            max,
            target: self.entries[range.end - 1].threshold,
        })
    }

    /// Match a tool version against the table
    ///
    /// A tool older than every threshold gets `Error`. For any non-good
    /// verdict, the good ranges are walked in order and the first one the tool
    /// falls below or above decides the remediation.
    pub fn evaluate(&self, tool: Version) -> Evaluation {
        let verdict = match self.governing_entry(tool) {
            None => Verdict::Error,
            Some(entry) if entry.verdict.is_good() => return Evaluation::default(),
            Some(entry) => entry.verdict,
        };

        let ranges = self.good_ranges();
        for bounds in ranges.iter().filter_map(|range| self.range_bounds(range)) {

            if tool < bounds.min {
                tracing::trace!(%tool, recommended = %bounds.target, "tool below good range");
                return Evaluation {
                    verdict,
                    remediation: Some(Remediation::UpgradeTool(bounds.target)),
                };
            }

            if tool >= bounds.max {
                tracing::trace!(%tool, max = %bounds.max, "tool above good range");
                return Evaluation {
                    verdict,
                    remediation: Some(Remediation::UpgradeRepos),
                };
            }
        }

        // No good range to point at. Kept silent rather than failing.
        Evaluation {
            verdict,
            remediation: None,
        }
    }

    /// Verdict and remediation message for a tool version
    ///
    /// The message is empty for `good` and when no remediation is known.
    pub fn check_tool_version(&self, tool: Version) -> (Verdict, String) {
        let evaluation = self.evaluate(tool);
        (evaluation.verdict, evaluation.message())
    }
}
