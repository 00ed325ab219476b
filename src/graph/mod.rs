//! Dependency graph module: the structural backbone of the impact engine.
//!
//! Provides file identities, the forward/reverse import graph, blast-radius
//! queries, and snapshot persistence.

pub mod engine;
pub mod identity;
pub mod persistence;
pub mod query;
pub mod types;

pub use engine::DependencyGraph;
pub use identity::{clean_path, FileIdentity};
pub use persistence::GraphSnapshot;
pub use types::{CriticalPath, GraphStats, ImpactResult, DEFAULT_AFFECTED_DEPTH};
