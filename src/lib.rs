//! # Blast
//!
//! Blast-radius analysis for code pushes.
//!
//! Blast builds a file-level import graph for a project, then answers
//! "what is affected if these files change" at a bounded depth. Results feed
//! a narrative generator and a markdown report for chat notification.
//!
//! ## Key Features
//!
//! - **Textual import scanning**: JS/TS/JSX/TSX/Vue and Python, no AST
//! - **Root-relative identities**: one key per file regardless of host OS
//! - **Bounded queries**: affected files, pages using a file, critical pairs
//! - **Snapshots**: JSON or bincode, reloaded with neighbor order intact
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blast::analyzer::DependencyAnalyzer;
//! use blast::config::BlastConfig;
//! use std::path::Path;
//!
//! let config = BlastConfig::default();
//! let mut analyzer = DependencyAnalyzer::new(config.analysis).unwrap();
//! analyzer.set_project_root(Path::new(".")).unwrap();
//! analyzer.analyze_project(None).unwrap();
//!
//! let impact = analyzer.analyze_changes(&["src/api/user.ts"]);
//! println!("score {}", impact.impact_score);
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod event;
pub mod graph;
pub mod impact;
pub mod parser;
pub mod remote;
pub mod report;
pub mod resolver;

// Re-exports for convenience
pub use analyzer::{DependencyAnalyzer, ScanStats};
pub use config::BlastConfig;
pub use error::{BlastError, Result};
pub use graph::{DependencyGraph, FileIdentity, ImpactResult};
pub use impact::{ChangeImpactAnalyzer, FileAnalysis, NarrativeGenerator};
pub use resolver::{PathResolver, RemoteFileAccessor, RemoteSource};
