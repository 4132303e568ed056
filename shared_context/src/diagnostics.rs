use crate::Span;

/// How bad a diagnostic is. `Error` and `Fatal` gate code generation but
/// never stop analysis; the whole tree is always walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
}

/// An extra location attached to a diagnostic, e.g. the prior declaration
/// in a duplicate-symbol report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticNote {
    message: String,
    span: Option<Span>,
}

impl DiagnosticNote {
    pub fn new(message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    pub fn get_message(&self) -> &str {
        &self.message
    }

    pub fn get_span(&self) -> Option<Span> {
        self.span
    }
}

/// A single finding: severity, where, what, and optional attached notes.
/// The middle end only builds these; rendering belongs to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    span: Span,
    message: String,
    notes: Vec<DiagnosticNote>,
}

impl Diagnostic {
    pub fn new(severity: Severity, span: Span, message: impl Into<String>) -> Self {
        Self {
            severity,
            span,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, span, message)
    }

    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, span, message)
    }

    /// An internal invariant was violated. Asserts in debug builds; in
    /// release flows the driver sees a fatal diagnostic instead of a crash.
    pub fn fatal_internal(span: Span, message: impl Into<String>) -> Self {
        let message = message.into();
        debug_assert!(false, "internal compiler invariant violated: {message}");
        Self::new(Severity::Fatal, span, format!("internal error: {message}"))
    }

    pub fn with_note(mut self, note: DiagnosticNote) -> Self {
        self.notes.push(note);
        self
    }

    pub fn get_severity(&self) -> Severity {
        self.severity
    }

    pub fn get_span(&self) -> Span {
        self.span
    }

    pub fn get_message(&self) -> &str {
        &self.message
    }

    pub fn get_notes(&self) -> &[DiagnosticNote] {
        &self.notes
    }
}

/// Accumulates diagnostics across a pass. Bags are merged upward; analysis
/// never early-returns on the first error.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Moves every diagnostic out of `other` into this bag.
    pub fn merge(&mut self, other: DiagnosticBag) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Merges the bag out of a `Diagnosed` and hands back its value.
    pub fn collect<T>(&mut self, diagnosed: Diagnosed<T>) -> T {
        let (value, bag) = diagnosed.into_parts();
        self.merge(bag);
        value
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.get_severity() >= Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Diagnostics ordered by source position. Two passes over one tree may
    /// interleave their reports, so comparisons sort first.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by_key(|d| (d.get_span(), d.get_severity()));
        self.diagnostics
    }
}

/// A value paired with the diagnostics produced while computing it.
/// The callee never decides to stop; the caller merges the bag and goes on,
/// usually with an error placeholder standing in for anything unresolved.
#[derive(Debug)]
pub struct Diagnosed<T> {
    value: T,
    diagnostics: DiagnosticBag,
}

impl<T> Diagnosed<T> {
    pub fn new(value: T, diagnostics: DiagnosticBag) -> Self {
        Self { value, diagnostics }
    }

    /// Wraps a value with an empty bag.
    pub fn ok(value: T) -> Self {
        Self::new(value, DiagnosticBag::new())
    }

    pub fn get_value(&self) -> &T {
        &self.value
    }

    pub fn get_diagnostics(&self) -> &DiagnosticBag {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (T, DiagnosticBag) {
        (self.value, self.diagnostics)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Diagnosed<U> {
        Diagnosed::new(f(self.value), self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_reports_errors_but_not_warnings() {
        let mut bag = DiagnosticBag::new();
        bag.add(Diagnostic::warning(Span::default(), "unused binding"));
        assert!(!bag.has_errors());
        bag.add(Diagnostic::error(Span::default(), "no implicit conversion"));
        assert!(bag.has_errors());
    }

    #[test]
    fn collect_merges_child_bags() {
        let mut child = DiagnosticBag::new();
        child.add(Diagnostic::error(Span::new(1, 2, 1), "symbol not found"));
        let diagnosed = Diagnosed::new(7, child);

        let mut parent = DiagnosticBag::new();
        let value = parent.collect(diagnosed);
        assert_eq!(value, 7);
        assert_eq!(parent.len(), 1);
    }

    #[test]
    fn sorting_orders_by_span() {
        let mut bag = DiagnosticBag::new();
        bag.add(Diagnostic::error(Span::new(9, 10, 2), "second"));
        bag.add(Diagnostic::error(Span::new(1, 2, 1), "first"));
        let sorted = bag.into_sorted();
        assert_eq!(sorted[0].get_message(), "first");
    }
}
