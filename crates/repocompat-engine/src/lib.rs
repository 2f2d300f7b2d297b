//! RepoCompat engine - version compatibility resolution
//!
//! This crate implements the matching logic:
//! - Compatibility tables (threshold → verdict, range matching)
//! - Compatibility maps (one table per repository version)
//! - Per-repository checks and their diagnostics

pub mod error;
pub mod table;
pub mod map;

pub use error::CompatError;
pub use table::{CompatEntry, CompatTable, Evaluation, GoodRangeBounds, Remediation};
pub use map::{CompatMap, MapLookup, RepoCheck};
