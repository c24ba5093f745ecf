//! Path and filesystem helpers shared across the engine.

use crate::error::{Error, Result, SourceIoError};
use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

/// Returns the canonical, absolute form of `path`.
///
/// Uses [`dunce::canonicalize`] instead of [`std::fs::canonicalize`] so Windows doesn't leak
/// `\\?\` UNC prefixes into paths that end up in diagnostics or the persisted graph.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    dunce::canonicalize(path).map_err(|err| Error::io(err, path))
}

/// Live mtime of `path`, in milliseconds since the Unix epoch.
///
/// Returns the sentinel `0` if the file does not exist (or its metadata can't be read), per the
/// timestamp convention used throughout the graph: "0 means gone".
pub fn mtime_millis(path: impl AsRef<Path>) -> u64 {
    fs::metadata(path.as_ref())
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .map(|dur| dur.as_millis() as u64)
        .unwrap_or(0)
}

/// `true` if `path` exists and is a regular file.
pub fn is_regular_file(path: impl AsRef<Path>) -> bool {
    fs::metadata(path.as_ref()).map(|meta| meta.is_file()).unwrap_or(false)
}

pub fn create_parent_dir_all(file: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = file.as_ref().parent() {
        fs::create_dir_all(parent).map_err(|err| Error::io(err, parent))?;
    }
    Ok(())
}

/// Reads a gzip-compressed [`bincode`] value from `path`.
pub fn read_compressed<T: serde::de::DeserializeOwned>(
    path: impl AsRef<Path>,
) -> std::result::Result<T, Box<dyn std::error::Error + Send + Sync>> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;
    let mut decoder = flate2::read::GzDecoder::new(file);
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

/// Writes `value` as a gzip-compressed [`bincode`] blob to `path`, via a temp file that is then
/// renamed into place so a process that dies mid-write never leaves a torn file behind.
pub fn write_compressed_atomic<T: serde::Serialize>(
    value: &T,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    create_parent_dir_all(path)?;
    let encoded = bincode::serialize(value).map_err(|err| Error::CachePersist {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::Other, err),
    })?;

    let tmp_path = path.with_extension("tmp");
    {
        let file = fs::File::create(&tmp_path)
            .map_err(|err| Error::CachePersist { path: path.to_path_buf(), source: err })?;
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder
            .write_all(&encoded)
            .map_err(|err| Error::CachePersist { path: path.to_path_buf(), source: err })?;
        encoder
            .finish()
            .map_err(|err| Error::CachePersist { path: path.to_path_buf(), source: err })?;
    }
    fs::rename(&tmp_path, path)
        .map_err(|err| Error::CachePersist { path: path.to_path_buf(), source: err })?;
    Ok(())
}

/// Reads a file's full contents as a UTF-8 string, wrapping I/O errors with the offending path.
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|err| Error::io(err, path))
}

/// Rebase `path` relative to `root`, the way diagnostics name files relative to the project root.
pub fn source_name<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

/// Renders `path` with forward slashes regardless of platform, so diagnostics stay stable across
/// the Windows/Unix builds of the host compiler.
pub fn display_slash(path: &Path) -> String {
    use path_slash::PathExt;
    path.to_slash_lossy().into_owned()
}

pub(crate) fn io_err(err: std::io::Error, path: impl Into<PathBuf>) -> SourceIoError {
    SourceIoError::new(err, path)
}
