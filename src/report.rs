//! Centralizes the handful of human-facing diagnostics that are more than a log line: unresolved
//! references, missing first-files, and compiler error/warning summaries. Mirrors the way the
//! teacher keeps a small `report` module alongside its `tracing` instrumentation rather than
//! scattering `println!`s through the engine.

use crate::compiler::Diagnostic;
use std::path::Path;
use yansi::Paint;

/// A reference that didn't resolve to any file. Dropped silently from the graph, but still worth
/// a trace-level breadcrumb for anyone debugging a missing dependency.
pub fn unresolved_reference(from: &Path, reference: &str) {
    tracing::trace!(
        from = %from.display(),
        reference,
        "reference did not resolve to a file; assuming it is satisfied by the compiler's own search path"
    );
}

/// A first-file named in the configuration does not exist among the discovered sources.
pub fn missing_first_file(file: &Path) {
    eprintln!(
        "{} first file not found: {}",
        Paint::red("error:").bold(),
        crate::utils::display_slash(file)
    );
}

/// Summarizes a single source's compile diagnostics after a run.
pub fn compile_diagnostics(source: &Path, diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        let label = if diag.is_warning {
            Paint::yellow("warning:").bold().to_string()
        } else {
            Paint::red("error:").bold().to_string()
        };
        eprintln!("{label} {}: {}", crate::utils::display_slash(source), diag.message);
    }
}
