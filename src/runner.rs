//! Build runner: computes target paths, decides staleness, and invokes the compiler.

use crate::compiler::{CompileOptions, CompileStatus, Compiler};
use crate::graph::DependencyGraph;
use crate::report;
use crate::utils;
use std::path::{Path, PathBuf};

/// Computes the target path for `source`, turning `.`-separated module namespaces in the
/// basename into path separators under `out_dir`.
pub fn target_path(source: &Path, out_dir: &Path, target_extension: &str) -> PathBuf {
    let stem = source.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let mut path = out_dir.to_path_buf();
    for segment in stem.split('.') {
        path = path.join(segment);
    }
    path.set_extension(target_extension);
    path
}

/// `needs_compile`: true if `target`'s live mtime is strictly less than the live
/// mtime of `source` or any of its transitive parents. A missing target has mtime `0`, always
/// forcing a recompile.
pub fn needs_compile(source: &Path, target: &Path, graph: &DependencyGraph) -> bool {
    let target_mtime = utils::mtime_millis(target);
    let source_mtime = utils::mtime_millis(source);
    if target_mtime < source_mtime {
        return true;
    }
    graph.reaches(source).iter().any(|parent| target_mtime < utils::mtime_millis(parent))
}

/// Runs the full compile plan in order, invoking `compiler` for each source that needs it.
/// Returns `Ok(())` if every invocation succeeded (including skipped-as-up-to-date sources), or
/// the first fatal [`crate::error::Error::Compile`] encountered.
#[tracing::instrument(skip(plan, graph, compiler, extra_options))]
pub fn run(
    plan: &[PathBuf],
    graph: &DependencyGraph,
    out_dir: &Path,
    include_dir: &Path,
    target_extension: &str,
    extra_options: &[String],
    compiler: &dyn Compiler,
) -> crate::error::Result<()> {
    for source in plan {
        let target = target_path(source, out_dir, target_extension);
        utils::create_parent_dir_all(&target)?;

        if !needs_compile(source, &target, graph) {
            tracing::debug!(source = %source.display(), "up to date, skipping");
            continue;
        }

        let options = CompileOptions {
            extra: extra_options.to_vec(),
            out_dir: target.parent().map(Path::to_path_buf).unwrap_or_else(|| out_dir.to_path_buf()),
            include_dir: include_dir.to_path_buf(),
            target: target.clone(),
        };

        let status = compiler.compile(source, &options)?;
        match &status {
            CompileStatus::Ok => {
                tracing::info!(source = %source.display(), "compiled");
            }
            CompileStatus::OkWithWarnings(diagnostics) => {
                report::compile_diagnostics(source, diagnostics);
            }
            CompileStatus::Error(diagnostics) => {
                report::compile_diagnostics(source, diagnostics);
                return Err(crate::error::Error::Compile(
                    source.clone(),
                    diagnostics.iter().map(|d| d.message.clone()).collect(),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::MockCompiler;
    use std::fs;

    #[test]
    fn target_path_splits_dotted_module_namespace() {
        let target = target_path(Path::new("src/a.b.c.src"), Path::new("ebin"), "out");
        assert_eq!(target, PathBuf::from("ebin/a/b/c.out"));
    }

    #[test]
    fn missing_target_always_needs_compile() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.src");
        fs::write(&source, "").unwrap();
        let target = dir.path().join("ebin/a.out");
        let graph = DependencyGraph::new(vec![]);
        assert!(needs_compile(&source, &target, &graph));
    }

    #[test]
    fn stale_parent_forces_recompile_even_if_target_newer_than_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.src");
        let header = dir.path().join("a.hrl");
        let target = dir.path().join("a.out");
        fs::write(&source, "").unwrap();
        fs::write(&header, "").unwrap();
        fs::write(&target, "").unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        fs::write(&header, "changed").unwrap();

        let mut graph = DependencyGraph::new(vec![]);
        graph.upsert_vertex(&source, 1);
        graph.upsert_vertex(&header, 1);
        graph.add_edge(&source, &header);

        assert!(needs_compile(&source, &target, &graph));
    }

    #[test]
    fn run_stops_on_first_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.src");
        let b = dir.path().join("b.src");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();
        let graph = DependencyGraph::new(vec![]);
        let compiler = MockCompiler::new().failing_on("a.src");

        let result = run(
            &[a.clone(), b.clone()],
            &graph,
            &dir.path().join("ebin"),
            &dir.path().join("include"),
            "out",
            &[],
            &compiler,
        );
        assert!(result.is_err());
    }
}
