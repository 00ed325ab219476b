//
//  builder.rs
//  Blast
//
//  Created by hak (tharun)
//

use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ignore::IgnorePolicy;
use crate::graph::{DependencyGraph, FileIdentity};
use crate::parser::SupportedLanguage;

/// Counters for one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files whose imports were extracted.
    pub files_scanned: usize,
    /// Files skipped because no content could be read.
    pub files_unreadable: usize,
    /// Resolved imports merged into the graph, duplicates included.
    pub imports_resolved: usize,
}

/// Resolved imports of one file, produced off-graph.
#[derive(Debug, Clone)]
pub(crate) struct FileScan {
    pub source: FileIdentity,
    /// `None` when the file could not be read.
    pub targets: Option<Vec<FileIdentity>>,
}

/// Collect every scannable file below `start`.
///
/// Ignored directories are pruned before the walker descends into them.
/// Output is sorted by path so repeated runs produce the same graph.
pub(crate) fn collect_files(
    start: &Path,
    root: &Path,
    policy: &IgnorePolicy,
    respect_gitignore: bool,
) -> Vec<PathBuf> {
    let prune_policy = policy.clone();
    let prune_root = root.to_path_buf();

    WalkBuilder::new(start)
        .hidden(true)
        .git_ignore(respect_gitignore)
        .git_global(respect_gitignore)
        .git_exclude(respect_gitignore)
        .require_git(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            let id = FileIdentity::from_path(entry.path(), Some(&prune_root));
            let keep = !prune_policy.is_ignored(id.as_str(), is_dir);
            if !keep && is_dir {
                debug!(dir = %id, "pruned ignored directory");
            }
            keep
        })
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| SupportedLanguage::from_path(entry.path()).is_some())
        .map(|entry| entry.into_path())
        .collect()
}

/// Run `scan` over `files`, on the rayon pool when `parallel` is set.
///
/// Results keep the order of `files` either way.
pub(crate) fn scan_files<F>(files: &[PathBuf], parallel: bool, scan: F) -> Vec<FileScan>
where
    F: Fn(&Path) -> Option<FileScan> + Sync + Send,
{
    if parallel {
        files.par_iter().filter_map(|path| scan(path)).collect()
    } else {
        files.iter().filter_map(|path| scan(path)).collect()
    }
}

/// Merge scan results into the graph. This is the only step that mutates it.
pub(crate) fn merge_scans(graph: &mut DependencyGraph, scans: Vec<FileScan>) -> ScanStats {
    let mut stats = ScanStats::default();
    for scan in scans {
        match scan.targets {
            Some(targets) => {
                stats.files_scanned += 1;
                stats.imports_resolved += targets.len();
                for target in targets {
                    graph.add_dependency(scan.source.clone(), target);
                }
            }
            None => stats.files_unreadable += 1,
        }
    }
    stats
}
