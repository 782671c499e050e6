//! Problems found while loading dependencies and resolving references.
//!
//! Resolution answers `None` for anything it cannot resolve. Why it came back empty (an
//! assembly missing from every probed directory, a reader that rejected a file, a nested
//! scope that loops back on itself) is recorded here, so callers can inspect the causes
//! after a batch of lookups.
//!
//! One [`Diagnostics`] container is shared by the module cache and the resolver. Entries
//! are appended to a `boxcar::Vec` under a shared lock, so parallel loads report without
//! waiting on each other; only [`Diagnostics::clear`] locks exclusively. An entry equal to
//! one already reported is dropped, so a reference that keeps failing the same way is
//! recorded once until the container is cleared.
//!
//! # Examples
//!
//! ```rust
//! use dotscope_resolver::metadata::diagnostics::{DiagnosticCategory, Diagnostics};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.warning(DiagnosticCategory::Scope, "Nested scope of 'Outer/Inner' is cyclic");
//! diagnostics.error(DiagnosticCategory::Load, "Failed to read 'Missing, Version=1.0.0.0'");
//!
//! assert!(diagnostics.has_errors());
//! assert_eq!(diagnostics.by_category(DiagnosticCategory::Scope).len(), 1);
//! ```

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::RwLock,
};

use dashmap::DashSet;
use strum::Display;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DiagnosticSeverity {
    /// Expected gaps, e.g. types living in module files that are never loaded
    Info,
    /// A lookup came back empty because the graph is malformed
    Warning,
    /// A dependency could not be located, mapped or decoded
    Error,
}

/// The stage that reported a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DiagnosticCategory {
    /// Mapping or decoding a located file
    Load,
    /// Probing the filesystem for an assembly
    Probe,
    /// Walking a resolution scope: dropped modules, cyclic or too deep nesting
    Scope,
    /// Walking types: forwarders, base chains
    Type,
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    /// How serious it is
    pub severity: DiagnosticSeverity,
    /// Who reported it
    pub category: DiagnosticCategory,
    /// What happened
    pub message: String,
    /// Display name of the assembly concerned
    pub assembly: Option<String>,
    /// The file concerned
    pub path: Option<PathBuf>,
}

impl Diagnostic {
    /// Create an entry without assembly or file context.
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            severity,
            category,
            message: message.into(),
            assembly: None,
            path: None,
        }
    }

    /// Attach the assembly concerned.
    #[must_use]
    pub fn with_assembly(mut self, assembly: impl Into<String>) -> Self {
        self.assembly = Some(assembly.into());
        self
    }

    /// Attach the file concerned.
    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;
        match (&self.assembly, &self.path) {
            (Some(assembly), Some(path)) => write!(f, " ({} at {})", assembly, path.display()),
            (Some(assembly), None) => write!(f, " ({})", assembly),
            (None, Some(path)) => write!(f, " ({})", path.display()),
            (None, None) => Ok(()),
        }
    }
}

/// Shared collection of distinct [`Diagnostic`] entries, in reporting order.
#[derive(Debug)]
pub struct Diagnostics {
    entries: RwLock<boxcar::Vec<Diagnostic>>,
    seen: DashSet<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Diagnostics {
            entries: RwLock::new(boxcar::Vec::new()),
            seen: DashSet::new(),
        }
    }

    /// Report an [`DiagnosticSeverity::Info`] entry.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Report an [`DiagnosticSeverity::Warning`] entry.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Warning, category, message));
    }

    /// Report an [`DiagnosticSeverity::Error`] entry.
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Error, category, message));
    }

    /// Report a prepared entry, typically one carrying assembly or file context.
    ///
    /// Returns `false` if an equal entry was already reported.
    pub fn push(&self, diagnostic: Diagnostic) -> bool {
        let entries = read_lock!(self.entries);
        if !self.seen.insert(diagnostic.clone()) {
            return false;
        }
        entries.push(diagnostic);
        true
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = write_lock!(self.entries);
        entries.clear();
        self.seen.clear();
    }

    /// A snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.matching(|_| true)
    }

    fn matching(&self, filter: impl Fn(&Diagnostic) -> bool) -> Vec<Diagnostic> {
        read_lock!(self.entries)
            .iter()
            .filter(|&(_, diagnostic)| filter(diagnostic))
            .map(|(_, diagnostic)| diagnostic.clone())
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        read_lock!(self.entries).count()
    }

    /// Returns `true` if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if any entry is an error.
    pub fn has_errors(&self) -> bool {
        read_lock!(self.entries)
            .iter()
            .any(|(_, diagnostic)| diagnostic.severity == DiagnosticSeverity::Error)
    }

    /// Entries reported by `category`.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<Diagnostic> {
        self.matching(|diagnostic| diagnostic.category == category)
    }

    /// Entries at or above `severity`.
    pub fn at_least(&self, severity: DiagnosticSeverity) -> Vec<Diagnostic> {
        self.matching(|diagnostic| diagnostic.severity >= severity)
    }
}

/// A count line, followed by every warning and error.
impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries();
        let count = |severity: DiagnosticSeverity| {
            entries.iter().filter(|d| d.severity == severity).count()
        };
        writeln!(
            f,
            "{} error(s), {} warning(s), {} info(s)",
            count(DiagnosticSeverity::Error),
            count(DiagnosticSeverity::Warning),
            count(DiagnosticSeverity::Info)
        )?;

        for diagnostic in entries
            .iter()
            .filter(|d| d.severity >= DiagnosticSeverity::Warning)
        {
            writeln!(f, "  {}", diagnostic)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn entry_display() {
        let diagnostic = Diagnostic::new(
            DiagnosticSeverity::Error,
            DiagnosticCategory::Load,
            "Failed to map file",
        )
        .with_assembly("Missing, Version=1.0.0.0")
        .with_path(Path::new("/tmp/Missing.dll"));

        assert_eq!(
            diagnostic.to_string(),
            "[ERROR] Load: Failed to map file (Missing, Version=1.0.0.0 at /tmp/Missing.dll)"
        );
        assert_eq!(
            Diagnostic::new(DiagnosticSeverity::Info, DiagnosticCategory::Type, "x").to_string(),
            "[INFO] Type: x"
        );
    }

    #[test]
    fn filtering_and_summary() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.info(DiagnosticCategory::Type, "Module file not loaded");
        diagnostics.warning(DiagnosticCategory::Scope, "Cyclic scope");
        diagnostics.error(DiagnosticCategory::Load, "Reader failed");

        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.by_category(DiagnosticCategory::Scope).len(), 1);
        assert_eq!(diagnostics.at_least(DiagnosticSeverity::Warning).len(), 2);

        let summary = diagnostics.to_string();
        assert!(summary.starts_with("1 error(s), 1 warning(s), 1 info(s)"));
        assert!(summary.contains("Cyclic scope"));
        assert!(!summary.contains("Module file not loaded"));
    }

    #[test]
    fn repeated_reports_are_recorded_once() {
        let diagnostics = Diagnostics::new();
        for _ in 0..1000 {
            diagnostics.error(DiagnosticCategory::Probe, "Assembly could not be located");
        }
        assert_eq!(diagnostics.len(), 1);

        let located = Diagnostic::new(
            DiagnosticSeverity::Error,
            DiagnosticCategory::Probe,
            "Assembly could not be located",
        )
        .with_assembly("Missing, Version=1.0.0.0");
        assert!(diagnostics.push(located.clone()));
        assert!(!diagnostics.push(located.clone()));
        assert_eq!(diagnostics.len(), 2);

        diagnostics.clear();
        assert!(diagnostics.is_empty());
        assert!(diagnostics.push(located));
        assert_eq!(diagnostics.entries().len(), 1);
    }

    #[test]
    fn concurrent_reports() {
        let diagnostics = Arc::new(Diagnostics::new());
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let diagnostics = Arc::clone(&diagnostics);
                thread::spawn(move || {
                    diagnostics.warning(DiagnosticCategory::Type, format!("Thread {}", i));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(diagnostics.len(), 10);
        assert!(!diagnostics.has_errors());
    }
}
