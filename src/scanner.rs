//! Attribute scanner: extracts include/behaviour/transform/import references from a
//! source file's leading attributes without a full parser for the source language.
//!
//! A real parser for the host language is out of scope; like the teacher falls back to a
//! regex pass over pragma/import text when an AST parse isn't available, this scanner runs a
//! line-oriented regex pass over the leading forms of the file. Discovery, not validation: an
//! unparseable form is skipped and scanning continues with the next line.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// One reference extracted from a source file's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `-include("path").` — a plain textual include.
    Include(String),
    /// `-include_lib("lib/path").` — resolved via the library locator.
    IncludeLib(String),
    /// `-import(module, [...]).` / `-behaviour(module).` / `-compile({parse_transform, module})`
    /// / `-compile({core_transform, module})` — all map to `<module>.<source-extension>`.
    Module(String),
    /// `-file("path", Line).` — a file-origin annotation.
    File(String),
}

static INCLUDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"-include\s*\(\s*"([^"]+)"\s*\)"#).unwrap());
static INCLUDE_LIB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"-include_lib\s*\(\s*"([^"]+)"\s*\)"#).unwrap());
static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"-import\s*\(\s*([a-zA-Z_][\w@]*)\s*,"#).unwrap());
static BEHAVIOUR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"-behaviou?r\s*\(\s*([a-zA-Z_][\w@]*)\s*\)"#).unwrap());
static FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"-file\s*\(\s*"([^"]+)"\s*,"#).unwrap());
static TRANSFORM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{\s*(?:parse_transform|core_transform)\s*,\s*([a-zA-Z_][\w@]*)\s*\}"#).unwrap()
});

/// Scans `contents` (the full text of a source file) and returns the ordered references it
/// declares. Pure with respect to the bytes given; never follows a reference itself.
#[tracing::instrument(level = "trace", skip(contents))]
pub fn scan(path: &Path, contents: &str) -> Vec<Reference> {
    let mut refs = Vec::new();

    for line in contents.lines() {
        let trimmed = line.trim_start();
        if !trimmed.starts_with('-') {
            continue;
        }

        if let Some(caps) = INCLUDE_RE.captures(line) {
            refs.push(Reference::Include(caps[1].to_string()));
        } else if let Some(caps) = INCLUDE_LIB_RE.captures(line) {
            refs.push(Reference::IncludeLib(caps[1].to_string()));
        } else if let Some(caps) = FILE_RE.captures(line) {
            refs.push(Reference::File(caps[1].to_string()));
        } else if let Some(caps) = IMPORT_RE.captures(line) {
            refs.push(Reference::Module(caps[1].to_string()));
        } else if let Some(caps) = BEHAVIOUR_RE.captures(line) {
            refs.push(Reference::Module(caps[1].to_string()));
        } else if trimmed.starts_with("-compile") {
            for caps in TRANSFORM_RE.captures_iter(line) {
                refs.push(Reference::Module(caps[1].to_string()));
            }
        }
    }

    tracing::trace!(path = %path.display(), found = refs.len(), "scanned attributes");
    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_include_and_include_lib() {
        let src = r#"
-module(a).
-include("a.hrl").
-include_lib("stdlib/include/ms_transform.hrl").
"#;
        let refs = scan(Path::new("a.src"), src);
        assert_eq!(
            refs,
            vec![
                Reference::Include("a.hrl".to_string()),
                Reference::IncludeLib("stdlib/include/ms_transform.hrl".to_string()),
            ]
        );
    }

    #[test]
    fn extracts_behaviour_and_parse_transform() {
        let src = r#"
-module(a).
-behaviour(gen_server).
-compile({parse_transform, t}).
"#;
        let refs = scan(Path::new("a.src"), src);
        assert_eq!(
            refs,
            vec![Reference::Module("gen_server".to_string()), Reference::Module("t".to_string())]
        );
    }

    #[test]
    fn extracts_compile_list_of_transforms() {
        let src = r#"-compile([{parse_transform, t1}, {core_transform, t2}])."#;
        let refs = scan(Path::new("a.src"), src);
        assert_eq!(
            refs,
            vec![Reference::Module("t1".to_string()), Reference::Module("t2".to_string())]
        );
    }

    #[test]
    fn ignores_unparseable_forms() {
        let src = "-this is not a valid attribute at all(((\n-include(\"ok.hrl\").";
        let refs = scan(Path::new("a.src"), src);
        assert_eq!(refs, vec![Reference::Include("ok.hrl".to_string())]);
    }
}
