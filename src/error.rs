//! Crate-wide error type.
//!
//! Errors are split along the recoverable/fatal line drawn by the design: persistence failures,
//! scan failures and resolution misses are handled at the point they occur (logged via `tracing`
//! and absorbed into a degraded-but-valid value) and never surface as an [`Error`] from the public
//! entry points. Only misconfiguration and compile failures do.

use std::{
    fmt,
    path::{Path, PathBuf},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file named in a `first-files` list does not exist among the discovered sources.
    #[error("first file not found: {0}")]
    MissingFirstFile(PathBuf),

    /// The on-disk dependency graph could not be read back (missing, corrupted, or built under
    /// different include roots / schema version). Never returned from [`crate::Project::build`] -
    /// callers that want to observe it use [`crate::graph::DependencyGraph::load`] directly.
    #[error("failed to load persisted graph at {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A source file could not be scanned for attributes. Kept as a named variant for library
    /// consumers, but never constructed as an `Err` by the scanner itself - see module docs.
    #[error("failed to scan {0}: {1}")]
    Scan(PathBuf, String),

    /// One or more sources failed to compile.
    #[error("compilation failed for {0}: {1:?}")]
    Compile(PathBuf, Vec<String>),

    /// Writing the graph cache back to disk failed.
    #[error("failed to persist build cache at {path}: {source}")]
    CachePersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] SourceIoError),
}

impl Error {
    pub fn io(err: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io(SourceIoError { io: err, path: path.as_ref().to_path_buf() })
    }
}

/// An [`std::io::Error`] tagged with the path that caused it, so error messages can name the file.
#[derive(Debug)]
pub struct SourceIoError {
    io: std::io::Error,
    path: PathBuf,
}

impl SourceIoError {
    pub fn new(io: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self { io, path: path.into() }
    }
}

impl fmt::Display for SourceIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.io)
    }
}

impl std::error::Error for SourceIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.io)
    }
}
