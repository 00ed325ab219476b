//
//  query.rs
//  Blast
//
//  Created by hak (tharun)
//

use std::collections::BTreeSet;

use super::engine::DependencyGraph;
use super::identity::FileIdentity;
use super::types::*;

impl DependencyGraph {
    /// Breadth-first expansion over reverse edges for at most `depth` rounds.
    ///
    /// The returned set contains the seeds. A round that discovers nothing
    /// new ends the walk early, which also bounds cyclic graphs.
    pub(crate) fn expand_dependents<'a, I>(&self, seeds: I, depth: usize) -> BTreeSet<FileIdentity>
    where
        I: IntoIterator<Item = &'a FileIdentity>,
    {
        let mut visited: BTreeSet<FileIdentity> = seeds.into_iter().cloned().collect();
        let mut frontier: Vec<FileIdentity> = visited.iter().cloned().collect();

        for _ in 0..depth {
            let mut next: BTreeSet<FileIdentity> = BTreeSet::new();
            for file in &frontier {
                for dependent in self.get_dependents(file.as_str()) {
                    if !visited.contains(&dependent) {
                        next.insert(dependent);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            visited.extend(next.iter().cloned());
            frontier = next.into_iter().collect();
        }

        visited
    }

    /// Every file affected by a change to `changed_files` within `depth`
    /// rounds, including the changed files themselves.
    pub fn find_affected_files(
        &self,
        changed_files: &[FileIdentity],
        depth: usize,
    ) -> BTreeSet<FileIdentity> {
        self.expand_dependents(changed_files, depth)
    }

    /// Blast-radius score at the default depth. Higher means broader impact.
    pub fn calculate_impact_score(&self, changed_files: &[FileIdentity]) -> f64 {
        self.impact_score_within(changed_files, DEFAULT_AFFECTED_DEPTH)
    }

    /// Blast-radius score at an explicit depth.
    ///
    /// Currently the affected-file count; weights (fan-in, file criticality)
    /// can be layered on here without changing callers.
    pub fn impact_score_within(&self, changed_files: &[FileIdentity], depth: usize) -> f64 {
        self.find_affected_files(changed_files, depth).len() as f64
    }

    /// One `[changed, dependent]` pair per direct dependent of each changed file.
    pub fn find_critical_paths(&self, changed_files: &[FileIdentity]) -> Vec<CriticalPath> {
        changed_files
            .iter()
            .flat_map(|source| {
                self.get_dependents(source.as_str())
                    .into_iter()
                    .map(move |dependent| CriticalPath {
                        source: source.clone(),
                        dependent,
                    })
            })
            .collect()
    }

    /// Files that reach `file` through reverse edges within `depth` rounds,
    /// excluding `file` itself.
    ///
    /// `depth` counts every round including the first hop, so depth 0 is
    /// always empty rather than the direct dependents.
    pub fn find_dependents_within(&self, file: &FileIdentity, depth: usize) -> BTreeSet<FileIdentity> {
        let mut found = self.expand_dependents(std::iter::once(file), depth);
        found.remove(file);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<FileIdentity> {
        names.iter().map(|n| FileIdentity::from(*n)).collect()
    }

    fn set(names: &[&str]) -> BTreeSet<FileIdentity> {
        ids(names).into_iter().collect()
    }

    fn chain() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("A", "B");
        graph.add_dependency("B", "C");
        graph
    }

    #[test]
    fn test_affected_files_by_depth() {
        let graph = chain();
        assert_eq!(graph.find_affected_files(&ids(&["C"]), 2), set(&["C", "B", "A"]));
        assert_eq!(graph.find_affected_files(&ids(&["C"]), 1), set(&["C", "B"]));
        assert_eq!(graph.find_affected_files(&ids(&["C"]), 0), set(&["C"]));
    }

    #[test]
    fn test_affected_files_include_unknown_seed() {
        let graph = chain();
        assert_eq!(graph.find_affected_files(&ids(&["nowhere.ts"]), 2), set(&["nowhere.ts"]));
    }

    #[test]
    fn test_depth_is_monotonic() {
        let mut graph = DependencyGraph::new();
        for (s, t) in [("b", "a"), ("c", "b"), ("d", "c"), ("e", "d"), ("x", "a"), ("y", "x")] {
            graph.add_dependency(s, t);
        }
        let changed = ids(&["a"]);
        let mut previous = BTreeSet::new();
        for depth in 0..6 {
            let current = graph.find_affected_files(&changed, depth);
            assert!(previous.is_subset(&current), "depth {depth} lost files");
            assert!(current.contains(&FileIdentity::from("a")));
            previous = current;
        }
    }

    #[test]
    fn test_cycles_terminate() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "c");
        graph.add_dependency("c", "a");
        let affected = graph.find_affected_files(&ids(&["a"]), 1000);
        assert_eq!(affected, set(&["a", "b", "c"]));
        let pages = graph.find_dependents_within(&FileIdentity::from("a"), 1000);
        assert_eq!(pages, set(&["b", "c"]));
    }

    #[test]
    fn test_impact_score_counts_affected_files() {
        let graph = chain();
        assert_eq!(graph.calculate_impact_score(&ids(&["C"])), 3.0);
        assert_eq!(graph.impact_score_within(&ids(&["C"]), 1), 2.0);
        assert_eq!(graph.calculate_impact_score(&ids(&["A"])), 1.0);
    }

    #[test]
    fn test_critical_paths_are_one_hop() {
        let mut graph = chain();
        graph.add_dependency("D", "C");
        let paths = graph.find_critical_paths(&ids(&["C"]));
        let pairs: Vec<(String, String)> = paths
            .iter()
            .map(|p| (p.source.to_string(), p.dependent.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("C".to_string(), "B".to_string()),
                ("C".to_string(), "D".to_string())
            ]
        );
        assert!(graph.find_critical_paths(&ids(&["A"])).is_empty());
    }

    #[test]
    fn test_dependents_within_excludes_seed_but_affected_includes_it() {
        let graph = chain();
        let seed = FileIdentity::from("C");
        let pages = graph.find_dependents_within(&seed, 3);
        let affected = graph.find_affected_files(std::slice::from_ref(&seed), 3);
        assert!(!pages.contains(&seed));
        assert!(affected.contains(&seed));
        assert_eq!(pages, set(&["B", "A"]));
    }

    #[test]
    fn test_dependents_within_depth_counts_first_hop() {
        let graph = chain();
        let seed = FileIdentity::from("C");
        assert!(graph.find_dependents_within(&seed, 0).is_empty());
        assert_eq!(graph.find_dependents_within(&seed, 1), set(&["B"]));
    }
}
