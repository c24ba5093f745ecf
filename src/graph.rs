//! Dependency graph store: an in-memory directed graph keyed by absolute file paths, with
//! explicit forward and reverse adjacency so ancestor/descendant queries are a single walk each.

use crate::utils;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Bumped whenever the persisted shape changes; a mismatch on load discards the file.
pub const SCHEMA_VERSION: u32 = 1;

/// On-disk shape of the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedGraph {
    schema_version: u32,
    vertices: Vec<(PathBuf, u64)>,
    edges: Vec<(PathBuf, PathBuf)>,
    include_roots: Vec<PathBuf>,
}

/// The in-memory dependency graph. Vertices carry the mtime observed as of the last update;
/// edges run dependent -> dependency, with `reverse` the mirrored dependency -> dependent map.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    timestamps: HashMap<PathBuf, u64>,
    forward: HashMap<PathBuf, HashSet<PathBuf>>,
    reverse: HashMap<PathBuf, HashSet<PathBuf>>,
    include_roots: Vec<PathBuf>,
}

impl DependencyGraph {
    pub fn new(include_roots: Vec<PathBuf>) -> Self {
        Self { include_roots, ..Default::default() }
    }

    pub fn include_roots(&self) -> &[PathBuf] {
        &self.include_roots
    }

    pub fn contains_vertex(&self, path: &Path) -> bool {
        self.timestamps.contains_key(path)
    }

    pub fn timestamp(&self, path: &Path) -> Option<u64> {
        self.timestamps.get(path).copied()
    }

    /// Adds or refreshes a vertex's timestamp, registering empty adjacency sets if new.
    pub fn upsert_vertex(&mut self, path: &Path, timestamp: u64) {
        self.timestamps.insert(path.to_path_buf(), timestamp);
        self.forward.entry(path.to_path_buf()).or_default();
        self.reverse.entry(path.to_path_buf()).or_default();
    }

    /// Adds an edge `from -> to` (from depends on to). Both endpoints must already be vertices.
    pub fn add_edge(&mut self, from: &Path, to: &Path) {
        self.forward.entry(from.to_path_buf()).or_default().insert(to.to_path_buf());
        self.reverse.entry(to.to_path_buf()).or_default().insert(from.to_path_buf());
    }

    /// Removes every outgoing edge of `path`, leaving it a vertex with no dependencies.
    pub fn clear_outgoing_edges(&mut self, path: &Path) {
        if let Some(targets) = self.forward.get_mut(path) {
            let targets = std::mem::take(targets);
            for target in targets {
                if let Some(back) = self.reverse.get_mut(&target) {
                    back.remove(path);
                }
            }
        }
    }

    /// Deletes a vertex and every edge touching it, in both directions.
    pub fn delete_vertex(&mut self, path: &Path) {
        self.clear_outgoing_edges(path);
        if let Some(dependents) = self.reverse.remove(path) {
            for dependent in dependents {
                if let Some(fwd) = self.forward.get_mut(&dependent) {
                    fwd.remove(path);
                }
            }
        }
        self.forward.remove(path);
        self.timestamps.remove(path);
    }

    pub fn vertices(&self) -> impl Iterator<Item = &PathBuf> {
        self.timestamps.keys()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&PathBuf, &PathBuf)> {
        self.forward.iter().flat_map(|(from, tos)| tos.iter().map(move |to| (from, to)))
    }

    pub fn direct_dependencies(&self, path: &Path) -> impl Iterator<Item = &PathBuf> {
        self.forward.get(path).into_iter().flatten()
    }

    /// Every vertex reachable from `path` by following outgoing (dependency) edges, excluding
    /// `path` itself: the full transitive dependency set ("reaches").
    pub fn reaches(&self, path: &Path) -> HashSet<PathBuf> {
        self.walk(path, &self.forward)
    }

    /// Every vertex that can reach `path` by following outgoing edges, excluding `path` itself:
    /// the full transitive dependent set ("reachable-from"/descendants).
    pub fn reached_by(&self, path: &Path) -> HashSet<PathBuf> {
        self.walk(path, &self.reverse)
    }

    fn walk(
        &self,
        start: &Path,
        adjacency: &HashMap<PathBuf, HashSet<PathBuf>>,
    ) -> HashSet<PathBuf> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start.to_path_buf());

        while let Some(current) = queue.pop_front() {
            if let Some(neighbours) = adjacency.get(&current) {
                for next in neighbours {
                    if visited.insert(next.clone()) {
                        queue.push_back(next.clone());
                    }
                }
            }
        }
        visited
    }

    /// Loads a persisted graph from `path` built under `include_roots`. On any failure — missing
    /// file, corrupt contents, schema mismatch, or a different include-roots set — logs a warning,
    /// deletes the stale file if present, and returns an empty graph; never fatal.
    #[tracing::instrument(skip(include_roots))]
    pub fn load(path: &Path, include_roots: &[PathBuf]) -> Self {
        match Self::try_load(path, include_roots) {
            Ok(graph) => graph,
            Err(reason) => {
                tracing::warn!(path = %path.display(), reason, "discarding persisted graph");
                let _ = std::fs::remove_file(path);
                Self::new(include_roots.to_vec())
            }
        }
    }

    fn try_load(path: &Path, include_roots: &[PathBuf]) -> Result<Self, String> {
        let persisted: PersistedGraph =
            utils::read_compressed(path).map_err(|err| err.to_string())?;

        if persisted.schema_version != SCHEMA_VERSION {
            return Err(format!(
                "schema version mismatch: stored {}, expected {SCHEMA_VERSION}",
                persisted.schema_version
            ));
        }
        if persisted.include_roots != include_roots {
            return Err("include roots changed since last build".to_string());
        }

        let mut graph = Self::new(include_roots.to_vec());
        for (vertex, timestamp) in persisted.vertices {
            graph.upsert_vertex(&vertex, timestamp);
        }
        for (from, to) in persisted.edges {
            graph.add_edge(&from, &to);
        }
        Ok(graph)
    }

    /// Persists the graph to `path`, atomically.
    pub fn persist(&self, path: &Path) -> crate::error::Result<()> {
        let persisted = PersistedGraph {
            schema_version: SCHEMA_VERSION,
            vertices: self.timestamps.iter().map(|(p, t)| (p.clone(), *t)).collect(),
            edges: self.edges().map(|(from, to)| (from.clone(), to.clone())).collect(),
            include_roots: self.include_roots.clone(),
        };
        utils::write_compressed_atomic(&persisted, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_removal_is_bidirectional() {
        let mut graph = DependencyGraph::new(vec![]);
        let a = PathBuf::from("/a.src");
        let h = PathBuf::from("/a.hrl");
        graph.upsert_vertex(&a, 1);
        graph.upsert_vertex(&h, 1);
        graph.add_edge(&a, &h);
        assert!(graph.reaches(&a).contains(&h));
        assert!(graph.reached_by(&h).contains(&a));

        graph.clear_outgoing_edges(&a);
        assert!(graph.reaches(&a).is_empty());
        assert!(graph.reached_by(&h).is_empty());
    }

    #[test]
    fn delete_vertex_cascades() {
        let mut graph = DependencyGraph::new(vec![]);
        let a = PathBuf::from("/a.src");
        let h = PathBuf::from("/a.hrl");
        graph.upsert_vertex(&a, 1);
        graph.upsert_vertex(&h, 1);
        graph.add_edge(&a, &h);

        graph.delete_vertex(&h);
        assert!(!graph.contains_vertex(&h));
        assert!(graph.reaches(&a).is_empty());
    }

    #[test]
    fn cyclic_includes_terminate_reachability_walk() {
        let mut graph = DependencyGraph::new(vec![]);
        let a = PathBuf::from("/a.hrl");
        let b = PathBuf::from("/b.hrl");
        graph.upsert_vertex(&a, 1);
        graph.upsert_vertex(&b, 1);
        graph.add_edge(&a, &b);
        graph.add_edge(&b, &a);

        let reached = graph.reaches(&a);
        assert_eq!(reached, HashSet::from([a.clone(), b.clone()]));
    }

    #[test]
    fn persist_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("graph.cache");
        let roots = vec![PathBuf::from("/inc")];

        let mut graph = DependencyGraph::new(roots.clone());
        let a = PathBuf::from("/a.src");
        let h = PathBuf::from("/a.hrl");
        graph.upsert_vertex(&a, 123);
        graph.upsert_vertex(&h, 456);
        graph.add_edge(&a, &h);
        graph.persist(&cache).unwrap();

        let reloaded = DependencyGraph::load(&cache, &roots);
        let mut vertices: Vec<_> = reloaded.vertices().cloned().collect();
        vertices.sort();
        let mut expected = vec![a.clone(), h.clone()];
        expected.sort();
        assert_eq!(vertices, expected);
        assert!(reloaded.reaches(&a).contains(&h));
    }

    #[test]
    fn reload_with_different_include_roots_discards_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("graph.cache");
        let graph = DependencyGraph::new(vec![PathBuf::from("/inc1")]);
        graph.persist(&cache).unwrap();

        let reloaded = DependencyGraph::load(&cache, &[PathBuf::from("/inc1"), PathBuf::from("/inc2")]);
        assert!(reloaded.vertices().next().is_none());
        assert!(!cache.exists());
    }
}
