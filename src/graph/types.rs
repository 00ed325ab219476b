//
//  types.rs
//  Blast
//
//  Created by hak (tharun)
//

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::identity::FileIdentity;

/// Rounds of reverse-edge expansion used for impact scoring.
pub const DEFAULT_AFFECTED_DEPTH: usize = 2;

/// Graph size summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub file_count: usize,
    pub edge_count: usize,
}

/// A one-hop `(changed file, direct dependent)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalPath {
    pub source: FileIdentity,
    pub dependent: FileIdentity,
}

/// Outcome of one change-impact analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    pub changed_files: BTreeSet<FileIdentity>,
    /// Includes the changed files themselves.
    pub affected_files: BTreeSet<FileIdentity>,
    pub impact_score: f64,
    pub critical_paths: Vec<CriticalPath>,
}

impl ImpactResult {
    /// Affected files that were not part of the change set.
    pub fn downstream(&self) -> impl Iterator<Item = &FileIdentity> {
        self.affected_files
            .iter()
            .filter(|f| !self.changed_files.contains(*f))
    }
}
