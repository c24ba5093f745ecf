//! Generator pipelines: thin source-extension-to-target-extension compile loops for
//! auxiliary generators (lexers, parsers, schema descriptors) that live outside the main graph.

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::runner;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Runs a single pipeline: discovers its sources, orders by its first-files list, and compiles
/// each with `compile_fn`, using the same mtime check as the main runner with an empty parent set
/// (a pipeline source has no graph-tracked dependencies of its own).
#[tracing::instrument(skip(pipeline, compile_fn))]
pub fn run_pipeline(
    pipeline: &PipelineConfig,
    compile_fn: impl Fn(&std::path::Path, &std::path::Path) -> Result<()>,
) -> Result<()> {
    let sources = discover(pipeline)?;
    let empty_graph = DependencyGraph::new(vec![]);

    let mut ordered = Vec::new();
    for first in &pipeline.first_files {
        if !sources.contains(first) {
            return Err(Error::MissingFirstFile(first.clone()));
        }
        ordered.push(first.clone());
    }
    for source in &sources {
        if !ordered.contains(source) {
            ordered.push(source.clone());
        }
    }

    for source in &ordered {
        let target = runner::target_path(source, &pipeline.output_dir, &pipeline.output_ext);
        crate::utils::create_parent_dir_all(&target)?;
        if runner::needs_compile(source, &target, &empty_graph) {
            compile_fn(source, &target)?;
        }
    }
    Ok(())
}

fn discover(pipeline: &PipelineConfig) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    if !pipeline.source_dir.is_dir() {
        return Ok(sources);
    }
    for entry in WalkDir::new(&pipeline.source_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(pipeline.source_ext.as_str()) {
            sources.push(crate::utils::canonicalize(path)?);
        }
    }
    sources.sort();
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    #[test]
    fn missing_declared_first_file_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let source_dir = dir.path().join("gen");
        fs::create_dir_all(&source_dir).unwrap();
        fs::write(source_dir.join("a.y"), "").unwrap();

        let pipeline = PipelineConfig {
            name: "yecc".to_string(),
            source_dir,
            source_ext: "y".to_string(),
            output_dir: dir.path().join("src"),
            output_ext: "src".to_string(),
            first_files: vec![PathBuf::from("does_not_exist.y")],
            opts: vec![],
        };

        let result = run_pipeline(&pipeline, |_, _| Ok(()));
        assert!(matches!(result, Err(Error::MissingFirstFile(_))));
    }

    #[test]
    fn compiles_each_discovered_source_once() {
        let dir = tempfile::tempdir().unwrap();
        let source_dir = dir.path().join("gen");
        fs::create_dir_all(&source_dir).unwrap();
        fs::write(source_dir.join("a.y"), "").unwrap();
        fs::write(source_dir.join("b.y"), "").unwrap();

        let pipeline = PipelineConfig {
            name: "yecc".to_string(),
            source_dir,
            source_ext: "y".to_string(),
            output_dir: dir.path().join("src"),
            output_ext: "src".to_string(),
            first_files: vec![],
            opts: vec![],
        };

        let calls = RefCell::new(0);
        run_pipeline(&pipeline, |_, _| {
            *calls.borrow_mut() += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(*calls.borrow(), 2);
    }
}
