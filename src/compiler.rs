//! The underlying language compiler is an external collaborator: this module only fixes the
//! shape of that boundary, the way the teacher's `compilers::Compiler` trait stands in for `solc`.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// A single compiler-reported error or warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub is_warning: bool,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self { message: message.into(), is_warning: true }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), is_warning: false }
    }
}

/// The outcome of a single `compile(source, options)` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileStatus {
    Ok,
    OkWithWarnings(Vec<Diagnostic>),
    Error(Vec<Diagnostic>),
}

impl CompileStatus {
    pub fn is_success(&self) -> bool {
        !matches!(self, CompileStatus::Error(_))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileStatus::Ok => &[],
            CompileStatus::OkWithWarnings(d) | CompileStatus::Error(d) => d,
        }
    }
}

/// Options accumulated for a single compile invocation: compiler-options plus
/// `{outdir, include-dir, return-diagnostics}`.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub extra: Vec<String>,
    pub out_dir: PathBuf,
    pub include_dir: PathBuf,
    /// The target this invocation is expected to produce; the compiler decides the exact file
    /// name under `out_dir`, but the runner needs somewhere real to point a mock implementation.
    pub target: PathBuf,
}

/// The black-box language compiler. A real deployment shells out to (or links against) the
/// actual toolchain; tests use [`MockCompiler`].
pub trait Compiler: Send + Sync {
    fn compile(&self, source: &Path, options: &CompileOptions) -> Result<CompileStatus>;
}

/// A trivial [`Compiler`] used by tests: always succeeds, unless `source`'s file name is listed in
/// `fail_on`, in which case it reports a single synthetic error. Writes an empty file at
/// `options.target` on success, so the mtime-based dirty check in the runner has something real to
/// compare against.
#[derive(Debug, Default, Clone)]
pub struct MockCompiler {
    pub fail_on: Vec<String>,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_on(mut self, name: impl Into<String>) -> Self {
        self.fail_on.push(name.into());
        self
    }
}

impl Compiler for MockCompiler {
    fn compile(&self, source: &Path, options: &CompileOptions) -> Result<CompileStatus> {
        let name = source.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if self.fail_on.iter().any(|f| f == name) {
            return Ok(CompileStatus::Error(vec![Diagnostic::error(format!(
                "synthetic failure compiling {}",
                source.display()
            ))]));
        }

        if let Some(parent) = options.target.parent() {
            std::fs::create_dir_all(parent).map_err(|err| crate::error::Error::io(err, parent))?;
        }
        std::fs::write(&options.target, b"")
            .map_err(|err| crate::error::Error::io(err, &options.target))?;
        Ok(CompileStatus::Ok)
    }
}
