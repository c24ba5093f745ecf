//! Graph updater: brings the in-memory graph into sync with the filesystem.

use crate::config::Config;
use crate::graph::DependencyGraph;
use crate::report;
use crate::resolver::{self, LibraryLocator};
use crate::scanner::{self, Reference};
use crate::utils;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Runs one update pass: restores the persisted graph if compatible, then visits every source,
/// returning the updated graph. Persists the graph if anything changed.
#[tracing::instrument(skip(config, locator))]
pub fn update(
    config: &Config,
    sources: &[PathBuf],
    locator: &dyn LibraryLocator,
) -> DependencyGraph {
    let include_roots = config.include_roots();
    let cache_path = config.paths.cache_path();
    let mut graph = DependencyGraph::load(&cache_path, &include_roots);

    let mut dirs: Vec<PathBuf> = vec![PathBuf::from("include")];
    dirs.extend(include_roots.iter().cloned());
    for source in sources {
        if let Some(parent) = source.parent() {
            if !dirs.contains(&parent.to_path_buf()) {
                dirs.push(parent.to_path_buf());
            }
        }
    }

    let mut modified = false;
    for source in sources {
        if update_vertex(&mut graph, &dirs, source, &config.source_extension, locator) {
            modified = true;
        }
    }

    if modified {
        if let Err(err) = graph.persist(&cache_path) {
            tracing::warn!(error = %err, "failed to persist updated graph");
        }
    }

    graph
}

/// `update_vertex`: returns `true` if the graph was modified by visiting `file`.
fn update_vertex(
    graph: &mut DependencyGraph,
    dirs: &[PathBuf],
    file: &Path,
    source_extension: &str,
    locator: &dyn LibraryLocator,
) -> bool {
    let live_mtime = utils::mtime_millis(file);

    if !graph.contains_vertex(file) {
        if live_mtime == 0 {
            // Referenced but nonexistent; nothing to add.
            return false;
        }
        graph.upsert_vertex(file, live_mtime);
        scan_and_link(graph, dirs, file, source_extension, locator);
        return true;
    }

    let stored = graph.timestamp(file).unwrap_or(0);
    if live_mtime == 0 {
        graph.delete_vertex(file);
        return true;
    }
    if live_mtime > stored {
        graph.clear_outgoing_edges(file);
        scan_and_link(graph, dirs, file, source_extension, locator);
        graph.upsert_vertex(file, live_mtime);
        return true;
    }

    false
}

fn scan_and_link(
    graph: &mut DependencyGraph,
    dirs: &[PathBuf],
    file: &Path,
    source_extension: &str,
    locator: &dyn LibraryLocator,
) {
    let contents = match utils::read_to_string(file) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(file = %file.display(), error = %err, "failed to read file for scanning");
            return;
        }
    };

    let references = scanner::scan(file, &contents);
    let mut seen = HashSet::new();
    for reference in references {
        let raw = module_reference_string(&reference, source_extension);
        let normalized = if matches!(reference, Reference::IncludeLib(_)) {
            Reference::IncludeLib(raw.clone())
        } else {
            Reference::Include(raw.clone())
        };
        if let Some(resolved) = resolver::resolve(&normalized, file, dirs, locator) {
            if seen.insert(resolved.clone()) {
                update_vertex(graph, dirs, &resolved, source_extension, locator);
                graph.add_edge(file, &resolved);
            }
        } else {
            report::unresolved_reference(file, &raw);
        }
    }
}

/// Maps a raw reference to the string the resolver should search for, turning `Module` references
/// into `<module>.<source-extension>`.
fn module_reference_string(reference: &Reference, source_extension: &str) -> String {
    match reference {
        Reference::Include(path) | Reference::IncludeLib(path) | Reference::File(path) => {
            path.clone()
        }
        Reference::Module(module) => format!("{module}.{source_extension}"),
    }
}
