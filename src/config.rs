//! The typed configuration surface an external project-file loader populates; parsing the
//! project's own config file format is out of scope for this crate.

use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// The fixed set of invocation modes that can carry their own option/first-files overrides.
///
/// Modeled as a closed enum with a small lookup table rather than dynamically constructed option
/// keys, per the design note on avoiding runtime symbol construction for per-command options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildCommand {
    /// The default `build` invocation.
    Default,
    /// Builds into a separate test output directory with extra conditional-compile defines and
    /// `no-debug-info` filtered out (debug info is always present in test builds).
    Test,
    /// A bare `compile` of a single target, skipping generator pipelines.
    Compile,
}

/// Extra options layered on top of [`Config`] when invoked under a particular [`BuildCommand`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandOverrides {
    pub extra_compiler_options: Vec<String>,
    pub first_files: Vec<PathBuf>,
}

/// `(regex, name[, value])`: if `regex` matches the platform string (`release-arch-wordsize`),
/// the compiler option `{d, name, value}` (or just `{d, name}` if no value) is added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformDefine {
    pub regex: String,
    pub name: String,
    pub value: Option<String>,
}

/// Configuration for one of the thin generator pipelines: a source-extension to
/// target-extension compiler with its own first-files list and pass-through options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub source_dir: PathBuf,
    pub source_ext: String,
    pub output_dir: PathBuf,
    pub output_ext: String,
    pub first_files: Vec<PathBuf>,
    pub opts: Vec<String>,
}

/// Where everything for a project lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPaths {
    /// Project root; the directory the driver was invoked in.
    pub root: PathBuf,
    /// Source roots searched for compilable sources (default: `["src"]`, relative to `root`).
    pub source_dirs: Vec<PathBuf>,
    /// Additional include roots searched when resolving a header reference.
    pub include_dirs: Vec<PathBuf>,
    /// Where compiled targets are written (default: `ebin`, relative to `root`).
    pub output_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            source_dirs: vec![root.join("src")],
            include_dirs: Vec::new(),
            output_dir: root.join("ebin"),
            root,
        }
    }

    /// Path to the persisted dependency graph cache file.
    pub fn cache_path(&self) -> PathBuf {
        let project_name =
            self.root.file_name().and_then(|n| n.to_str()).unwrap_or("project");
        self.root.join(format!(".{project_name}")).join("build_graph.cache")
    }
}

/// The full typed configuration surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: ProjectPaths,
    pub compiler_options: Vec<String>,
    pub platform_defines: Vec<PlatformDefine>,
    pub first_files: Vec<PathBuf>,
    pub pipelines: Vec<PipelineConfig>,
    pub command_overrides: HashMap<BuildCommand, CommandOverrides>,
    /// Extension for compilable source files, e.g. `"src"`.
    pub source_extension: String,
    /// Extension for headers, e.g. `"hrl"`.
    pub header_extension: String,
    /// Extension for compiled targets, e.g. `"target"`.
    pub target_extension: String,
}

impl Config {
    pub fn builder(root: impl Into<PathBuf>) -> ConfigBuilder {
        ConfigBuilder::new(root)
    }

    /// Resolves an option override for `command`, if any was configured.
    pub fn overrides_for(&self, command: BuildCommand) -> Option<&CommandOverrides> {
        self.command_overrides.get(&command)
    }

    /// First-files for `command`: the command-specific list if set, else the global one.
    pub fn first_files_for(&self, command: BuildCommand) -> &[PathBuf] {
        match self.overrides_for(command) {
            Some(overrides) if !overrides.first_files.is_empty() => &overrides.first_files,
            _ => &self.first_files,
        }
    }

    /// All include roots a reference may be resolved against, not yet including the per-source
    /// directories (those are added once the source list is known).
    pub fn include_roots(&self) -> Vec<PathBuf> {
        let mut dirs = vec![PathBuf::from("include")];
        dirs.extend(self.paths.include_dirs.iter().cloned());
        dirs
    }

    /// Compiler options contributed by `platform_defines` whose regex matches the current
    /// `release-arch-wordsize` platform string. Uses target-triple constants baked in at
    /// compile time, not an environment variable read.
    pub fn platform_define_options(&self) -> Vec<String> {
        let platform =
            format!("{}-{}-{}", env!("CARGO_PKG_VERSION"), std::env::consts::ARCH, usize::BITS);
        self.platform_defines
            .iter()
            .filter_map(|define| {
                let re = regex::Regex::new(&define.regex).ok()?;
                if !re.is_match(&platform) {
                    return None;
                }
                Some(match &define.value {
                    Some(value) => format!("{}={value}", define.name),
                    None => define.name.clone(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    paths: ProjectPaths,
    compiler_options: Vec<String>,
    platform_defines: Vec<PlatformDefine>,
    first_files: Vec<PathBuf>,
    pipelines: Vec<PipelineConfig>,
    command_overrides: HashMap<BuildCommand, CommandOverrides>,
    source_extension: String,
    header_extension: String,
    target_extension: String,
}

impl ConfigBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: ProjectPaths::new(root),
            compiler_options: Vec::new(),
            platform_defines: Vec::new(),
            first_files: Vec::new(),
            pipelines: Vec::new(),
            command_overrides: HashMap::new(),
            source_extension: "src".to_string(),
            header_extension: "hdr".to_string(),
            target_extension: "out".to_string(),
        }
    }

    #[must_use]
    pub fn source_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.paths.source_dirs.push(self.paths.root.join(dir));
        self
    }

    #[must_use]
    pub fn include_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.paths.include_dirs.push(self.paths.root.join(dir));
        self
    }

    #[must_use]
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.paths.output_dir = self.paths.root.join(dir);
        self
    }

    #[must_use]
    pub fn compiler_option(mut self, opt: impl Into<String>) -> Self {
        self.compiler_options.push(opt.into());
        self
    }

    #[must_use]
    pub fn platform_define(mut self, define: PlatformDefine) -> Self {
        self.platform_defines.push(define);
        self
    }

    #[must_use]
    pub fn first_files(mut self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.first_files.extend(files);
        self
    }

    #[must_use]
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipelines.push(pipeline);
        self
    }

    #[must_use]
    pub fn command_override(mut self, command: BuildCommand, overrides: CommandOverrides) -> Self {
        self.command_overrides.insert(command, overrides);
        self
    }

    #[must_use]
    pub fn extensions(
        mut self,
        source: impl Into<String>,
        header: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.source_extension = source.into();
        self.header_extension = header.into();
        self.target_extension = target.into();
        self
    }

    pub fn build(self) -> Config {
        Config {
            paths: self.paths,
            compiler_options: self.compiler_options,
            platform_defines: self.platform_defines,
            first_files: self.first_files,
            pipelines: self.pipelines,
            command_overrides: self.command_overrides,
            source_extension: self.source_extension,
            header_extension: self.header_extension,
            target_extension: self.target_extension,
        }
    }
}
