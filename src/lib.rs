#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]

#[macro_use]
extern crate tracing;

pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod planner;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod scanner;
pub mod updater;
pub mod utils;

pub use compiler::{CompileOptions, CompileStatus, Compiler, Diagnostic};
pub use config::{BuildCommand, Config, ConfigBuilder, ProjectPaths};
pub use error::{Error, Result};
pub use graph::DependencyGraph;
pub use resolver::{FilesystemLibraryLocator, LibraryLocator};

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The load path guard: adds the output directory to the load path for the duration of
/// a build and restores it on every exit path, including errors, via `Drop`.
struct LoadPathGuard<'a> {
    load_path: &'a mut Vec<PathBuf>,
}

impl<'a> LoadPathGuard<'a> {
    fn acquire(load_path: &'a mut Vec<PathBuf>, dir: &Path) -> Self {
        load_path.push(dir.to_path_buf());
        tracing::debug!(dir = %dir.display(), "added to load path");
        Self { load_path }
    }
}

impl Drop for LoadPathGuard<'_> {
    fn drop(&mut self) {
        if let Some(dir) = self.load_path.pop() {
            tracing::debug!(dir = %dir.display(), "restored load path");
        }
    }
}

/// Drives a single build invocation: discovers sources, updates the dependency graph, runs
/// generator pipelines, plans and executes the main compile, and persists the graph.
pub struct Project<C: Compiler> {
    pub config: Config,
    pub compiler: C,
    pub locator: Box<dyn LibraryLocator>,
    load_path: Vec<PathBuf>,
}

impl<C: Compiler> Project<C> {
    pub fn new(config: Config, compiler: C) -> Self {
        let locator = Box::new(FilesystemLibraryLocator::new(config.paths.root.clone()));
        Self { config, compiler, locator, load_path: Vec::new() }
    }

    #[must_use]
    pub fn with_locator(mut self, locator: Box<dyn LibraryLocator>) -> Self {
        self.locator = locator;
        self
    }

    /// Runs a full build under `command`.
    #[tracing::instrument(skip(self))]
    pub fn build(&mut self, command: BuildCommand) -> Result<()> {
        let sources = self.discover_sources()?;

        let first_files = self.config.first_files_for(command).to_vec();
        let first_files_absolute: Vec<PathBuf> = first_files
            .iter()
            .map(|f| {
                let joined = self.config.paths.root.join(f);
                utils::canonicalize(&joined).unwrap_or(joined)
            })
            .collect();
        for (declared, absolute) in first_files.iter().zip(&first_files_absolute) {
            if !sources.contains(absolute) {
                report::missing_first_file(declared);
                return Err(Error::MissingFirstFile(declared.clone()));
            }
        }

        std::fs::create_dir_all(&self.config.paths.output_dir)
            .map_err(|err| Error::io(err, &self.config.paths.output_dir))?;
        let _guard = LoadPathGuard::acquire(&mut self.load_path, &self.config.paths.output_dir);

        for pipeline in self.config.pipelines.clone() {
            let compiler = &self.compiler;
            let options_base = CompileOptions {
                extra: pipeline.opts.clone(),
                out_dir: pipeline.output_dir.clone(),
                include_dir: PathBuf::from("include"),
                target: PathBuf::new(),
            };
            pipeline::run_pipeline(&pipeline, move |source, target| {
                let mut options = options_base.clone();
                options.target = target.to_path_buf();
                match compiler.compile(source, &options)? {
                    CompileStatus::Error(diagnostics) => {
                        report::compile_diagnostics(source, &diagnostics);
                        Err(Error::Compile(
                            source.to_path_buf(),
                            diagnostics.iter().map(|d| d.message.clone()).collect(),
                        ))
                    }
                    CompileStatus::OkWithWarnings(diagnostics) => {
                        report::compile_diagnostics(source, &diagnostics);
                        Ok(())
                    }
                    CompileStatus::Ok => Ok(()),
                }
            })?;
        }

        let graph = updater::update(&self.config, &sources, self.locator.as_ref());
        let ordered = planner::plan(&graph, &sources, &first_files_absolute);

        let mut extra_options = self.config.compiler_options.clone();
        extra_options.extend(self.config.platform_define_options());
        if command == BuildCommand::Test {
            // Debug info is always present in test-variant builds.
            extra_options.retain(|opt| opt != "no-debug-info");
        }
        if let Some(overrides) = self.config.overrides_for(command) {
            extra_options.extend(overrides.extra_compiler_options.clone());
        }

        let result = runner::run(
            &ordered,
            &graph,
            &self.config.paths.output_dir,
            Path::new("include"),
            &self.config.target_extension,
            &extra_options,
            &self.compiler,
        );

        if result.is_ok() {
            if let Err(err) = graph.persist(&self.config.paths.cache_path()) {
                tracing::warn!(error = %err, "failed to persist graph after successful build");
            }
        }

        result
    }

    /// Walks every configured source root for files with the configured source extension.
    fn discover_sources(&self) -> Result<Vec<PathBuf>> {
        let mut sources = Vec::new();
        for dir in &self.config.paths.source_dirs {
            if !dir.is_dir() {
                continue;
            }
            for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str())
                    == Some(self.config.source_extension.as_str())
                {
                    sources.push(utils::canonicalize(path)?);
                }
            }
        }
        sources.sort();
        Ok(sources)
    }
}
