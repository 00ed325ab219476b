//
//  engine.rs
//  Blast
//
//  Created by hak (tharun)
//

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap};

use super::identity::FileIdentity;
use super::types::GraphStats;

/// File-level import graph.
///
/// An edge `a -> b` means "a imports b". Forward and reverse adjacency are
/// two views of the same petgraph edge set, so the reverse view is always
/// the exact transpose of the forward one.
#[derive(Clone)]
pub struct DependencyGraph {
    /// The directed graph storing import relationships.
    pub(crate) graph: DiGraph<FileIdentity, ()>,
    /// Index: file identity -> node index.
    pub(crate) file_index: HashMap<FileIdentity, NodeIndex>,
    /// Content hashes reserved for incremental rebuilds.
    pub(crate) file_hashes: BTreeMap<FileIdentity, String>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            file_index: HashMap::new(),
            file_hashes: BTreeMap::new(),
        }
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Ensure a file has a node. Idempotent.
    pub fn add_file(&mut self, id: impl Into<FileIdentity>) -> NodeIndex {
        let id = id.into();
        if let Some(&idx) = self.file_index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.file_index.insert(id, idx);
        idx
    }

    /// Whether the file has a node.
    pub fn contains(&self, id: &str) -> bool {
        self.file_index.contains_key(id)
    }

    /// Every file identity in the graph, in insertion order.
    pub fn files(&self) -> impl Iterator<Item = &FileIdentity> {
        self.graph.node_weights()
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Record that `source` imports `target`. Duplicate edges are ignored.
    pub fn add_dependency(
        &mut self,
        source: impl Into<FileIdentity>,
        target: impl Into<FileIdentity>,
    ) {
        let from = self.add_file(source);
        let to = self.add_file(target);
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Files that import `id` (reverse edges), in edge insertion order.
    pub fn get_dependents(&self, id: &str) -> Vec<FileIdentity> {
        self.neighbors_ordered(id, Direction::Incoming)
    }

    /// Files that `id` imports (forward edges), in edge insertion order.
    pub fn get_dependencies(&self, id: &str) -> Vec<FileIdentity> {
        self.neighbors_ordered(id, Direction::Outgoing)
    }

    /// Empty the forward map, the reverse map and the hash cache.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.file_index.clear();
        self.file_hashes.clear();
    }

    // ─── Hash Cache ─────────────────────────────────────────────

    pub fn file_hash(&self, id: &str) -> Option<&str> {
        self.file_hashes.get(id).map(String::as_str)
    }

    pub fn set_file_hash(&mut self, id: impl Into<FileIdentity>, hash: impl Into<String>) {
        self.file_hashes.insert(id.into(), hash.into());
    }

    /// Get graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            file_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
        }
    }

    // ─── Internal Helpers ───────────────────────────────────────

    /// Neighbors of a node sorted by edge index, which is insertion order.
    fn neighbors_ordered(&self, id: &str, dir: Direction) -> Vec<FileIdentity> {
        let Some(&idx) = self.file_index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Incoming => e.source(),
                    Direction::Outgoing => e.target(),
                };
                (e.id(), other)
            })
            .collect();
        edges.sort_by_key(|(edge, _)| *edge);
        edges
            .into_iter()
            .map(|(_, node)| self.graph[node].clone())
            .collect()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> DependencyGraph {
        // A imports B, B imports C
        let mut graph = DependencyGraph::new();
        graph.add_dependency("A", "B");
        graph.add_dependency("B", "C");
        graph
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::new();
        let stats = graph.stats();
        assert_eq!(stats.file_count, 0);
        assert_eq!(stats.edge_count, 0);
        assert!(graph.get_dependents("missing").is_empty());
        assert!(graph.get_dependencies("missing").is_empty());
    }

    #[test]
    fn test_add_file_is_idempotent() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_file("src/a.ts");
        let b = graph.add_file("src/a.ts");
        assert_eq!(a, b);
        assert_eq!(graph.stats().file_count, 1);
        assert!(graph.get_dependents("src/a.ts").is_empty());
        assert!(graph.get_dependencies("src/a.ts").is_empty());
    }

    #[test]
    fn test_dependents_and_dependencies() {
        let graph = chain();
        assert_eq!(graph.get_dependents("C"), vec![FileIdentity::from("B")]);
        assert_eq!(graph.get_dependencies("A"), vec![FileIdentity::from("B")]);
        assert!(graph.get_dependents("A").is_empty());
        assert!(graph.get_dependencies("C").is_empty());
    }

    #[test]
    fn test_add_dependency_twice_is_idempotent() {
        let mut graph = chain();
        let before = graph.stats();
        graph.add_dependency("A", "B");
        assert_eq!(graph.stats(), before);
        assert_eq!(graph.get_dependents("B").len(), 1);
        assert_eq!(graph.get_dependencies("A").len(), 1);
    }

    #[test]
    fn test_forward_and_reverse_stay_transposed() {
        let mut graph = DependencyGraph::new();
        let edges = [("a", "b"), ("a", "c"), ("c", "b"), ("b", "a"), ("d", "d")];
        for (s, t) in edges {
            graph.add_dependency(s, t);
        }
        for source in graph.files().cloned().collect::<Vec<_>>() {
            for target in graph.get_dependencies(source.as_str()) {
                assert!(graph.get_dependents(target.as_str()).contains(&source));
            }
            for dependent in graph.get_dependents(source.as_str()) {
                assert!(graph.get_dependencies(dependent.as_str()).contains(&source));
            }
        }
    }

    #[test]
    fn test_neighbors_keep_insertion_order() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("x", "shared");
        graph.add_dependency("y", "shared");
        graph.add_dependency("z", "shared");
        graph.add_dependency("x", "other");
        let dependents: Vec<String> = graph
            .get_dependents("shared")
            .iter()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(dependents, vec!["x", "y", "z"]);
        assert_eq!(
            graph.get_dependencies("x"),
            vec![FileIdentity::from("shared"), FileIdentity::from("other")]
        );
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut graph = chain();
        graph.set_file_hash("A", "abc");
        graph.clear();
        assert_eq!(graph.stats().file_count, 0);
        assert!(graph.file_hash("A").is_none());
        assert!(!graph.contains("A"));
    }
}
