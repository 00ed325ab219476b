//
//  mod.rs
//  Blast
//
//  Created by hak (tharun)
//

//! Populates a [`DependencyGraph`] from a project tree or a set of files,
//! and answers change-impact questions against it.

pub mod builder;
pub mod ignore;

pub use builder::ScanStats;
pub use ignore::IgnorePolicy;

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::{BlastError, Result};
use crate::graph::{clean_path, DependencyGraph, FileIdentity, ImpactResult};
use crate::parser::{read_source, ImportExtractor};
use crate::resolver::{PathResolver, RemoteSource};
use builder::FileScan;

/// Drives import extraction and resolution into the graph.
pub struct DependencyAnalyzer {
    graph: DependencyGraph,
    config: AnalysisConfig,
    project_root: Option<PathBuf>,
    /// The root as the caller spelled it, when that differs from the canonical form.
    root_alias: Option<PathBuf>,
    extractor: ImportExtractor,
    ignore: IgnorePolicy,
    resolver: Option<PathResolver>,
    remote: Option<(RemoteSource, bool)>,
}

impl DependencyAnalyzer {
    /// Fails only when an ignore pattern is invalid.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let ignore = IgnorePolicy::new(&config.ignore)?;
        Ok(Self {
            graph: DependencyGraph::new(),
            config,
            project_root: None,
            root_alias: None,
            extractor: ImportExtractor::new(),
            ignore,
            resolver: None,
            remote: None,
        })
    }

    /// Set the directory all identities are relative to.
    ///
    /// The root is canonicalized; anything that is not an existing
    /// directory is rejected. Absolute paths spelled through the original
    /// (e.g. symlinked) root still normalize against it.
    pub fn set_project_root(&mut self, root: &Path) -> Result<()> {
        if !root.is_dir() {
            return Err(BlastError::InvalidProjectRoot(root.to_path_buf()));
        }
        let canonical = root
            .canonicalize()
            .map_err(|_| BlastError::InvalidProjectRoot(root.to_path_buf()))?;
        let given = if root.is_absolute() {
            clean_path(root)
        } else {
            let cwd = std::env::current_dir()
                .map_err(|_| BlastError::InvalidProjectRoot(root.to_path_buf()))?;
            clean_path(&cwd.join(root))
        };
        info!(root = %canonical.display(), "project root set");
        self.root_alias = (given != canonical).then_some(given);
        self.project_root = Some(canonical);
        self.rebuild_resolver();
        Ok(())
    }

    /// Enable the remote fallback for resolution and content reads.
    pub fn set_remote(&mut self, remote: RemoteSource, verify: bool) {
        info!(repo = %remote.repo_key, git_ref = %remote.git_ref, verify, "remote fallback enabled");
        self.remote = Some((remote, verify));
        self.rebuild_resolver();
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut DependencyGraph {
        &mut self.graph
    }

    /// Root-relative, forward-slash identity for `path`.
    ///
    /// Without a project root this only unifies separators.
    pub fn normalize_path(&self, path: &Path) -> FileIdentity {
        match &self.project_root {
            Some(root) => {
                if let (Some(alias), true) = (&self.root_alias, path.is_absolute()) {
                    if let Ok(rel) = clean_path(path).strip_prefix(alias) {
                        return FileIdentity::from_path(rel, None);
                    }
                }
                FileIdentity::from_path(path, Some(root))
            }
            None => FileIdentity::new(path.to_string_lossy().into_owned()),
        }
    }

    /// On-disk location of `path`; relative paths are taken from the root.
    pub fn locate(&self, path: &Path) -> PathBuf {
        match &self.project_root {
            Some(root) if !path.is_absolute() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    // ─── Scanning ───────────────────────────────────────────────

    /// Scan one file and add its resolved imports to the graph.
    ///
    /// Returns the number of resolved imports.
    pub fn analyze_file(&mut self, path: &Path) -> usize {
        match self.scan_file(path) {
            Some(scan) => builder::merge_scans(&mut self.graph, vec![scan]).imports_resolved,
            None => 0,
        }
    }

    /// Scan only the given files, e.g. the changed files of a push.
    pub fn analyze_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> ScanStats {
        let files: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        self.scan_and_merge(&files)
    }

    /// Walk the tree below `start` (or the project root) and scan every
    /// file that survives the ignore policy.
    ///
    /// A `start` given without a project root becomes the project root.
    pub fn analyze_project(&mut self, start: Option<&Path>) -> Result<ScanStats> {
        if self.project_root.is_none() {
            match start {
                Some(dir) => self.set_project_root(dir)?,
                None => return Err(BlastError::ProjectRootNotSet),
            }
        }
        let root = self
            .project_root
            .clone()
            .ok_or(BlastError::ProjectRootNotSet)?;
        let start = match start {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => root.join(dir),
            None => root.clone(),
        };

        let files =
            builder::collect_files(&start, &root, &self.ignore, self.config.respect_gitignore);
        info!(start = %start.display(), files = files.len(), "scanning project");
        let stats = self.scan_and_merge(&files);
        let graph_stats = self.graph.stats();
        info!(
            scanned = stats.files_scanned,
            unreadable = stats.files_unreadable,
            files = graph_stats.file_count,
            edges = graph_stats.edge_count,
            "project scan complete"
        );
        Ok(stats)
    }

    /// Impact of `changed` on the current graph at the configured depth.
    pub fn analyze_changes<P: AsRef<Path>>(&self, changed: &[P]) -> ImpactResult {
        let mut normalized: Vec<FileIdentity> = Vec::with_capacity(changed.len());
        for path in changed {
            let id = self.normalize_path(path.as_ref());
            if !normalized.contains(&id) {
                normalized.push(id);
            }
        }
        let depth = self.config.default_depth;
        ImpactResult {
            changed_files: normalized.iter().cloned().collect(),
            affected_files: self.graph.find_affected_files(&normalized, depth),
            impact_score: self.graph.impact_score_within(&normalized, depth),
            critical_paths: self.graph.find_critical_paths(&normalized),
        }
    }

    // ─── Internal Helpers ───────────────────────────────────────

    fn rebuild_resolver(&mut self) {
        self.resolver = self.project_root.as_ref().map(|root| {
            let resolver = PathResolver::new(root.clone());
            match &self.remote {
                Some((remote, verify)) => resolver.with_remote(remote.clone(), *verify),
                None => resolver,
            }
        });
    }

    fn scan_and_merge(&mut self, files: &[PathBuf]) -> ScanStats {
        let scans = builder::scan_files(files, self.config.parallel, |path| self.scan_file(path));
        builder::merge_scans(&mut self.graph, scans)
    }

    /// Extract and resolve one file without touching the graph.
    fn scan_file(&self, path: &Path) -> Option<FileScan> {
        let source = self.normalize_path(path);
        if self.ignore.is_ignored(source.as_str(), false) {
            debug!(file = %source, "skipping ignored file");
            return None;
        }
        let ext = source.extension()?;
        if !self.extractor.supports(&ext) {
            return None;
        }
        let Some(resolver) = &self.resolver else {
            warn!(file = %source, "project root not set, imports cannot be resolved");
            return None;
        };

        let Some(content) = self.read_content(path, &source) else {
            return Some(FileScan {
                source,
                targets: None,
            });
        };

        let mut targets = Vec::new();
        for specifier in self.extractor.extract(&content, &ext) {
            match resolver.resolve(Path::new(source.as_str()), &specifier) {
                Some(target) if self.ignore.is_ignored(target.as_str(), false) => {
                    debug!(file = %source, %target, "dropping import of ignored file");
                }
                Some(target) => targets.push(target),
                None => debug!(file = %source, specifier, "unresolved import"),
            }
        }
        Some(FileScan {
            source,
            targets: Some(targets),
        })
    }

    /// Local content first, then the remote copy.
    fn read_content(&self, path: &Path, id: &FileIdentity) -> Option<String> {
        match read_source(&self.locate(path)) {
            Ok(content) => Some(content),
            Err(e) => {
                if let Some((remote, _)) = &self.remote {
                    if let Some(content) = remote.fetch(id) {
                        return Some(content);
                    }
                }
                warn!(file = %id, error = %e, "could not read file, treating as having no imports");
                None
            }
        }
    }
}
