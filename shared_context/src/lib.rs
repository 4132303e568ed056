// Crate-level imports and re-exports
pub use bumpalo::Bump; // Memory arena backing the string interner
use interner::NameId;

// Submodules
pub mod diagnostics; // Diagnostic values, bags and the Diagnosed<T> carrier
pub mod interner; // Deduplicates identifier strings into NameIds
pub mod source_map; // Maps tree positions back to source code positions

/// Represents a region in the source code
/// Used for diagnostics and mapping tree nodes to positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    pub start: usize, // Starting byte offset in source
    pub end: usize,   // Ending byte offset in source
    pub line: usize,  // Line number in source
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize) -> Self {
        Self { start, end, line }
    }

    /// Spans two regions, from the start of `self` to the end of `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
            line: self.line,
        }
    }
}

/// An identifier together with its location in the source.
/// Identifier text is interned, so comparison is a NameId comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident {
    name: NameId,
    span: Span,
}

impl Ident {
    pub fn new(name: NameId, span: Span) -> Self {
        Self { name, span }
    }

    pub fn get_name(&self) -> NameId {
        self.name
    }

    pub fn get_span(&self) -> Span {
        self.span
    }

    pub fn into_parts(self) -> (NameId, Span) {
        (self.name, self.span)
    }
}

/// Produces the name of a compiler-introduced binding, such as the spill
/// temporaries created while rewriting compound assignments. The `$` prefix
/// cannot appear in user identifiers, so these never collide.
pub fn anonymous_name(counter: usize) -> String {
    format!("$anon_{counter}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_join_keeps_outer_bounds() {
        let a = Span::new(4, 9, 1);
        let b = Span::new(12, 20, 2);
        assert_eq!(a.to(b), Span::new(4, 20, 1));
    }

    #[test]
    fn anonymous_names_are_reserved() {
        assert_eq!(anonymous_name(3), "$anon_3");
    }
}
