//
//  persistence.rs
//  Blast
//
//  Created by hak (tharun)
//

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::engine::DependencyGraph;
use super::identity::FileIdentity;
use crate::error::{BlastError, Result};

/// On-disk form of a dependency graph.
///
/// JSON by default; bincode when the snapshot path ends in `.bin`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub dependencies: BTreeMap<FileIdentity, Vec<FileIdentity>>,
    #[serde(default)]
    pub reverse_dependencies: BTreeMap<FileIdentity, Vec<FileIdentity>>,
    #[serde(default)]
    pub file_hashes: BTreeMap<FileIdentity, String>,
}

type Edge = (FileIdentity, FileIdentity);

impl DependencyGraph {
    /// Capture the forward map, reverse map and hash cache.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let mut snapshot = GraphSnapshot {
            file_hashes: self.file_hashes.clone(),
            ..Default::default()
        };
        for id in self.files() {
            snapshot
                .dependencies
                .insert(id.clone(), self.get_dependencies(id.as_str()));
            snapshot
                .reverse_dependencies
                .insert(id.clone(), self.get_dependents(id.as_str()));
        }
        snapshot
    }

    /// Rebuild a graph from a snapshot.
    ///
    /// Fails if the reverse map is not the exact transpose of the forward
    /// map. Edges are replayed in an order that reproduces the neighbor
    /// ordering of both maps.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let forward_edges = edge_set(&snapshot.dependencies, false)?;
        let reverse_edges = edge_set(&snapshot.reverse_dependencies, true)?;
        if forward_edges != reverse_edges {
            return Err(BlastError::Snapshot(
                "reverse dependencies are not the transpose of dependencies".into(),
            ));
        }

        let mut graph = DependencyGraph::new();
        for id in snapshot
            .dependencies
            .keys()
            .chain(snapshot.reverse_dependencies.keys())
        {
            graph.add_file(id.clone());
        }
        for (source, target) in replay_order(&snapshot)? {
            graph.add_dependency(source, target);
        }
        graph.file_hashes = snapshot.file_hashes;
        Ok(graph)
    }

    /// Write the graph to `path`, creating parent directories as needed.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let snapshot = self.to_snapshot();
        let bytes = if is_binary(path) {
            bincode::serialize(&snapshot).map_err(|e| BlastError::Snapshot(e.to_string()))?
        } else {
            serde_json::to_vec_pretty(&snapshot)?
        };
        fs::write(path, bytes)?;
        info!(path = %path.display(), files = self.stats().file_count, "dependency graph snapshot saved");
        Ok(())
    }

    /// Read a snapshot file into a fresh graph.
    pub fn read_snapshot(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| BlastError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: GraphSnapshot = if is_binary(path) {
            bincode::deserialize(&bytes).map_err(|e| BlastError::Snapshot(e.to_string()))?
        } else {
            serde_json::from_slice(&bytes)?
        };
        Self::from_snapshot(snapshot)
    }

    /// Replace this graph with the snapshot at `path`.
    ///
    /// Returns `false` and leaves the graph untouched if the snapshot is
    /// absent or malformed.
    pub fn load_snapshot(&mut self, path: &Path) -> bool {
        match Self::read_snapshot(path) {
            Ok(graph) => {
                *self = graph;
                info!(path = %path.display(), files = self.stats().file_count, "dependency graph snapshot loaded");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load dependency graph snapshot");
                false
            }
        }
    }
}

fn is_binary(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "bin")
}

/// Collect `(importer, imported)` pairs from one of the two maps.
fn edge_set(
    map: &BTreeMap<FileIdentity, Vec<FileIdentity>>,
    reversed: bool,
) -> Result<BTreeSet<Edge>> {
    let mut edges = BTreeSet::new();
    for (key, neighbors) in map {
        for other in neighbors {
            let edge = if reversed {
                (other.clone(), key.clone())
            } else {
                (key.clone(), other.clone())
            };
            if !edges.insert(edge) {
                return Err(BlastError::Snapshot(format!(
                    "duplicate edge entry under {key}"
                )));
            }
        }
    }
    Ok(edges)
}

/// Order edges so that every forward list and every reverse list keeps its
/// saved sequence once replayed through `add_dependency`.
fn replay_order(snapshot: &GraphSnapshot) -> Result<Vec<Edge>> {
    let mut constraints: DiGraph<Edge, ()> = DiGraph::new();
    let mut nodes: HashMap<Edge, NodeIndex> = HashMap::new();

    let mut node_for = |edge: Edge, g: &mut DiGraph<Edge, ()>| -> NodeIndex {
        *nodes.entry(edge.clone()).or_insert_with(|| g.add_node(edge))
    };

    for (source, targets) in &snapshot.dependencies {
        let chain: Vec<NodeIndex> = targets
            .iter()
            .map(|t| node_for((source.clone(), t.clone()), &mut constraints))
            .collect();
        for pair in chain.windows(2) {
            constraints.add_edge(pair[0], pair[1], ());
        }
    }
    for (target, sources) in &snapshot.reverse_dependencies {
        let chain: Vec<NodeIndex> = sources
            .iter()
            .map(|s| node_for((s.clone(), target.clone()), &mut constraints))
            .collect();
        for pair in chain.windows(2) {
            constraints.add_edge(pair[0], pair[1], ());
        }
    }

    let order = toposort(&constraints, None).map_err(|_| {
        BlastError::Snapshot("edge ordering in snapshot is inconsistent".into())
    })?;
    Ok(order
        .into_iter()
        .map(|idx| constraints[idx].clone())
        .collect())
}
