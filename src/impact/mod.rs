//
//  mod.rs
//  Blast
//
//  Created by hak (tharun)
//

//! "Which pages use this file" queries and per-file narrative reports.

pub mod narrative;
pub mod test_cases;

pub use narrative::{ChatCompletionNarrator, NarrativeGenerator, StubNarrator};
pub use test_cases::{extract_test_cases, TestCase};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{error, info};

use crate::analyzer::{DependencyAnalyzer, ScanStats};
use crate::error::Result;
use crate::graph::FileIdentity;
use crate::parser::read_source;

/// Referencing pages listed by name in the narrative context.
const CONTEXT_PAGE_LIMIT: usize = 5;

/// Narrative and test suggestions for one analyzed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub referencing_pages: Vec<FileIdentity>,
    pub assessment: String,
    pub impact_analysis: String,
    pub test_cases: Vec<TestCase>,
}

/// Outcome for one file of a batch: a full report or the reason it failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileAnalysis {
    Report(FileReport),
    Failed { path: String, error: String },
}

impl FileAnalysis {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Wraps a [`DependencyAnalyzer`] with page queries and a narrator.
pub struct ChangeImpactAnalyzer {
    analyzer: DependencyAnalyzer,
    narrator: Box<dyn NarrativeGenerator>,
}

impl ChangeImpactAnalyzer {
    pub fn new(analyzer: DependencyAnalyzer, narrator: Box<dyn NarrativeGenerator>) -> Self {
        Self { analyzer, narrator }
    }

    pub fn analyzer(&self) -> &DependencyAnalyzer {
        &self.analyzer
    }

    pub fn narrator(&self) -> &dyn NarrativeGenerator {
        self.narrator.as_ref()
    }

    /// Depth used when callers have no preference.
    pub fn default_pages_depth(&self) -> usize {
        self.analyzer.config().pages_depth
    }

    pub fn build_dependency_graph(&mut self, start: Option<&Path>) -> Result<ScanStats> {
        self.analyzer.analyze_project(start)
    }

    /// Files that reach `path` through at most `depth` reverse edges.
    ///
    /// The file itself is never part of the answer, even inside a cycle.
    pub fn find_pages_using_file(&self, path: &Path, depth: usize) -> BTreeSet<FileIdentity> {
        let id = self.analyzer.normalize_path(path);
        self.analyzer.graph().find_dependents_within(&id, depth)
    }

    /// [`find_pages_using_file`](Self::find_pages_using_file) for each path,
    /// keyed by the path as given.
    pub fn find_pages_using_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        depth: usize,
    ) -> BTreeMap<String, BTreeSet<FileIdentity>> {
        paths
            .iter()
            .map(|p| {
                let p = p.as_ref();
                (display_key(p), self.find_pages_using_file(p, depth))
            })
            .collect()
    }

    /// Describe one file to the narrator and package the answer.
    ///
    /// Never fails: read or narrator errors become [`FileAnalysis::Failed`].
    pub fn analyze_code_and_generate_tests(&self, path: &Path) -> FileAnalysis {
        let key = display_key(path);
        match self.report_for(path, &key) {
            Ok(report) => FileAnalysis::Report(report),
            Err(e) => {
                error!(file = %key, error = %e, "file analysis failed");
                FileAnalysis::Failed {
                    path: key,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Analyze every path independently; failures do not stop the batch.
    pub fn batch_analyze_and_generate_tests<P: AsRef<Path>>(
        &self,
        paths: &[P],
    ) -> BTreeMap<String, FileAnalysis> {
        let results: BTreeMap<String, FileAnalysis> = paths
            .iter()
            .map(|p| {
                let p = p.as_ref();
                (display_key(p), self.analyze_code_and_generate_tests(p))
            })
            .collect();
        let failed = results.values().filter(|r| r.is_failed()).count();
        info!(files = results.len(), failed, "batch analysis complete");
        results
    }

    fn report_for(&self, path: &Path, key: &str) -> Result<FileReport> {
        let content = read_source(&self.analyzer.locate(path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.to_string());
        let change = format!("File: {name}\nContent:\n{content}");

        let pages: Vec<FileIdentity> = self
            .find_pages_using_file(path, self.default_pages_depth())
            .into_iter()
            .collect();
        let context = page_context(&name, &pages);

        let assessment = self.narrator.assess(&change)?;
        let impact_analysis = self.narrator.analyze_impact(&change, &context)?;
        let test_cases = extract_test_cases(&impact_analysis);

        Ok(FileReport {
            path: key.to_string(),
            referencing_pages: pages,
            assessment,
            impact_analysis,
            test_cases,
        })
    }
}

fn display_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn page_context(name: &str, pages: &[FileIdentity]) -> String {
    let mut context = format!("Code change analysis.\nFile under analysis: {name}\n");
    if !pages.is_empty() {
        let shown: Vec<&str> = pages
            .iter()
            .take(CONTEXT_PAGE_LIMIT)
            .map(FileIdentity::as_str)
            .collect();
        let more = if pages.len() > CONTEXT_PAGE_LIMIT { "..." } else { "" };
        context.push_str(&format!(
            "{} pages reference this file: {}{more}\n",
            pages.len(),
            shown.join(", ")
        ));
    }
    context
}
