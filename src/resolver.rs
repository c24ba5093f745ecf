//! Include resolver: maps a raw [`crate::scanner::Reference`] to zero or one absolute path.

use crate::scanner::Reference;
use crate::utils;
use std::path::{Path, PathBuf};

/// External library-directory lookup for `include_lib`-style references. A reference of
/// the form `<lib>/<subpath>/<file>` asks this trait for `lib`'s install directory.
pub trait LibraryLocator: Send + Sync {
    /// Returns the absolute directory backing `lib`, if known.
    fn locate(&self, lib: &str) -> Option<PathBuf>;
}

/// Default [`LibraryLocator`]: looks under `<root>/_checkouts/<lib>` and `<root>/deps/<lib>`,
/// matching common local-dependency-checkout conventions.
#[derive(Debug, Clone)]
pub struct FilesystemLibraryLocator {
    root: PathBuf,
}

impl FilesystemLibraryLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LibraryLocator for FilesystemLibraryLocator {
    fn locate(&self, lib: &str) -> Option<PathBuf> {
        for base in ["_checkouts", "deps"] {
            let candidate = self.root.join(base).join(lib);
            if candidate.is_dir() {
                return Some(candidate);
            }
        }
        None
    }
}

/// Resolves `reference` to an absolute path, trying in order:
/// 1. the reference as given, if it already names a regular file;
/// 2. the referring file's own directory, joined with the reference;
/// 3. `candidate_dirs` in order, joined with the reference;
/// 4. for an `include_lib`-flagged reference `<lib>/<subpath>/<file>`, the locator's answer for
///    `lib`, joined with `<subpath>/<file>`;
/// 5. nothing — dropped silently (logged via [`crate::report::unresolved_reference`]).
pub fn resolve(
    reference: &Reference,
    from: &Path,
    candidate_dirs: &[PathBuf],
    locator: &dyn LibraryLocator,
) -> Option<PathBuf> {
    let (raw, is_lib) = match reference {
        Reference::Include(path) => (path.as_str(), false),
        Reference::IncludeLib(path) => (path.as_str(), true),
        Reference::Module(_) | Reference::File(_) => {
            // Module and file-origin references are already full relative/module paths handled
            // by the caller before this function is reached (see updater::module_reference_path).
            (reference_path(reference), false)
        }
    };

    let direct = Path::new(raw);
    if utils::is_regular_file(direct) {
        return utils::canonicalize(direct).ok();
    }

    if let Some(parent) = from.parent() {
        let candidate = parent.join(raw);
        if utils::is_regular_file(&candidate) {
            return utils::canonicalize(candidate).ok();
        }
    }

    for dir in candidate_dirs {
        let candidate = dir.join(raw);
        if utils::is_regular_file(&candidate) {
            return utils::canonicalize(candidate).ok();
        }
    }

    if is_lib {
        if let Some((lib, subpath)) = split_library_reference(raw) {
            if let Some(lib_dir) = locator.locate(lib) {
                let candidate = lib_dir.join(subpath);
                if utils::is_regular_file(&candidate) {
                    return utils::canonicalize(candidate).ok();
                }
            }
        }
    }

    None
}

fn reference_path(reference: &Reference) -> &str {
    match reference {
        Reference::Include(p) | Reference::IncludeLib(p) | Reference::File(p) => p.as_str(),
        Reference::Module(m) => m.as_str(),
    }
}

/// Splits `<lib>/<subpath...>/<file>` into `(lib, subpath/file)`.
fn split_library_reference(raw: &str) -> Option<(&str, &str)> {
    let mut parts = raw.splitn(2, '/');
    let lib = parts.next()?;
    let rest = parts.next()?;
    if lib.is_empty() || rest.is_empty() {
        return None;
    }
    Some((lib, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct NoLibraries;
    impl LibraryLocator for NoLibraries {
        fn locate(&self, _lib: &str) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn resolves_via_candidate_dir() {
        let dir = tempfile::tempdir().unwrap();
        let include_dir = dir.path().join("include");
        fs::create_dir_all(&include_dir).unwrap();
        fs::write(include_dir.join("a.hrl"), "").unwrap();

        let reference = Reference::Include("a.hrl".to_string());
        let resolved = resolve(
            &reference,
            &dir.path().join("src/a.src"),
            &[include_dir.clone()],
            &NoLibraries,
        );
        assert_eq!(resolved, Some(utils::canonicalize(include_dir.join("a.hrl")).unwrap()));
    }

    #[test]
    fn direct_resolution_wins_over_include_dir() {
        let dir = tempfile::tempdir().unwrap();
        let src_dir = dir.path().join("src");
        fs::create_dir_all(&src_dir).unwrap();
        fs::write(src_dir.join("a.hrl"), "").unwrap();
        let include_dir = dir.path().join("include");
        fs::create_dir_all(&include_dir).unwrap();
        fs::write(include_dir.join("a.hrl"), "").unwrap();

        let reference = Reference::Include(src_dir.join("a.hrl").to_str().unwrap().to_string());
        let resolved = resolve(&reference, &src_dir.join("x.src"), &[include_dir], &NoLibraries);
        assert_eq!(resolved, Some(utils::canonicalize(src_dir.join("a.hrl")).unwrap()));
    }

    #[test]
    fn referring_directory_wins_over_candidate_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let src_dir = dir.path().join("src");
        fs::create_dir_all(&src_dir).unwrap();
        fs::write(src_dir.join("a.hrl"), "from src").unwrap();
        let include_dir = dir.path().join("include");
        fs::create_dir_all(&include_dir).unwrap();
        fs::write(include_dir.join("a.hrl"), "from include").unwrap();

        let reference = Reference::Include("a.hrl".to_string());
        let resolved = resolve(
            &reference,
            &src_dir.join("x.src"),
            &[include_dir.clone()],
            &NoLibraries,
        );
        assert_eq!(resolved, Some(utils::canonicalize(src_dir.join("a.hrl")).unwrap()));
    }

    #[test]
    fn unresolvable_reference_drops_silently() {
        let dir = tempfile::tempdir().unwrap();
        let reference = Reference::Include("does_not_exist.hrl".to_string());
        let resolved = resolve(&reference, &dir.path().join("a.src"), &[], &NoLibraries);
        assert_eq!(resolved, None);
    }

    #[test]
    fn library_reference_via_locator() {
        let dir = tempfile::tempdir().unwrap();
        let lib_dir = dir.path().join("_checkouts/mylib");
        fs::create_dir_all(lib_dir.join("include")).unwrap();
        fs::write(lib_dir.join("include/ms_transform.hrl"), "").unwrap();

        struct Checkouts(PathBuf);
        impl LibraryLocator for Checkouts {
            fn locate(&self, lib: &str) -> Option<PathBuf> {
                let candidate = self.0.join("_checkouts").join(lib);
                candidate.is_dir().then_some(candidate)
            }
        }

        let reference =
            Reference::IncludeLib("mylib/include/ms_transform.hrl".to_string());
        let resolved = resolve(
            &reference,
            &dir.path().join("src/a.src"),
            &[],
            &Checkouts(dir.path().to_path_buf()),
        );
        assert_eq!(
            resolved,
            Some(utils::canonicalize(lib_dir.join("include/ms_transform.hrl")).unwrap())
        );
    }
}
