//! Compile planner: builds the final ordered compile plan from the graph and first-files.

use crate::graph::DependencyGraph;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Builds the final plan: `ExplicitFirst ++ OrderedImplicit ++ Tail`.
///
/// `is_source` filters reachability sets down to files with the source extension, since headers
/// and transform modules alike show up as graph vertices but only source files participate in
/// compile ordering.
pub fn plan(
    graph: &DependencyGraph,
    all_sources: &[PathBuf],
    first_files_conf: &[PathBuf],
) -> Vec<PathBuf> {
    let all_set: HashSet<&PathBuf> = all_sources.iter().collect();

    let explicit_first: Vec<PathBuf> =
        first_files_conf.iter().filter(|f| all_set.contains(f)).cloned().collect();
    let explicit_set: HashSet<&PathBuf> = explicit_first.iter().collect();

    let rest: Vec<PathBuf> =
        all_sources.iter().filter(|f| !explicit_set.contains(f)).cloned().collect();

    let dependents = |f: &Path| -> HashSet<PathBuf> {
        graph.reached_by(f).into_iter().filter(|x| all_set.contains(x)).collect()
    };
    let parents = |f: &Path| -> HashSet<PathBuf> {
        graph.reaches(f).into_iter().filter(|x| all_set.contains(x)).collect()
    };

    let mut implicit_first = Vec::new();
    let mut tail = Vec::new();
    for f in &rest {
        if !dependents(f).is_empty() {
            implicit_first.push(f.clone());
        } else {
            tail.push(f.clone());
        }
    }

    let mut flattened_parents = Vec::new();
    for f in &implicit_first {
        for parent in parents(f) {
            flattened_parents.push(parent);
        }
    }

    let ordered_implicit = uo_merge(&flattened_parents, &implicit_first);

    let mut result = explicit_first;
    result.extend(ordered_implicit);
    result.extend(tail);
    result
}

/// Dedupe `a` preserving order, then append first-occurrences of `b` not already present.
/// `result` contains exactly `set(a) ∪ set(b)`, each element's position fixed by its
/// first occurrence across `a` then `b`.
pub fn uo_merge(a: &[PathBuf], b: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for item in a.iter().chain(b.iter()) {
        if seen.insert(item.clone()) {
            result.push(item.clone());
        }
    }
    result
}
