use shared_context::{Ident, Span};

/// Where resolution of a qualified name starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRoot {
    /// Resolution starts at the global scope: `::std::mem::copy`.
    Global,
    /// Resolution starts at the use site and walks outward through the
    /// enclosing scopes until the first section matches.
    Local,
}

/// One section of a qualified name, possibly carrying type arguments:
/// `StrongPtr[Int32]` is a single section with one type argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSection {
    ident: Ident,
    type_args: Vec<QualifiedName>,
}

impl NameSection {
    pub fn new(ident: Ident, type_args: Vec<QualifiedName>) -> Self {
        Self { ident, type_args }
    }

    /// A plain section without type arguments.
    pub fn plain(ident: Ident) -> Self {
        Self::new(ident, Vec::new())
    }

    pub fn get_ident(&self) -> Ident {
        self.ident
    }

    pub fn get_type_args(&self) -> &[QualifiedName] {
        &self.type_args
    }
}

/// A possibly-qualified name as written in source, section by section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    root: NameRoot,
    sections: Vec<NameSection>,
}

impl QualifiedName {
    pub fn new(root: NameRoot, sections: Vec<NameSection>) -> Self {
        debug_assert!(!sections.is_empty());
        Self { root, sections }
    }

    /// A single unqualified identifier.
    pub fn local(ident: Ident) -> Self {
        Self::new(NameRoot::Local, vec![NameSection::plain(ident)])
    }

    pub fn get_root(&self) -> NameRoot {
        self.root
    }

    pub fn get_sections(&self) -> &[NameSection] {
        &self.sections
    }

    pub fn last_section(&self) -> &NameSection {
        self.sections.last().expect("qualified name has no sections")
    }

    pub fn get_span(&self) -> Span {
        let first = self.sections.first().expect("qualified name has no sections");
        first.get_ident().get_span().to(self.last_section().get_ident().get_span())
    }
}
