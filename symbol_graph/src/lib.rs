// The symbol graph: the persistent data model of everything the program
// declares, and the operations the sema passes run against it.
//
// Scopes form a lexical tree overlaid with association edges (a type's body
// scope is associated with the body scopes of its impls). Symbols are stored
// in one id-indexed table owned by the `Compilation`; every cross-symbol
// reference is a plain `SymbolId`, so the graph has no ownership cycles and
// nothing is freed before the compilation ends.

pub mod compilation;
pub mod conversions;
pub mod instantiator;
pub mod layout;
pub mod natives;
pub mod resolution;
pub mod scope;
pub mod substitution;
pub mod symbols;

#[cfg(test)]
pub(crate) mod test_support;

pub use compilation::Compilation;
pub use scope::{Scope, ScopeKind, SymbolGraph};
pub use symbols::Symbol;

/// Handle to a scope in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) u32);

/// Handle to a symbol in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) u32);

/// Whether a symbol is reached through an instance (`value.member`) or
/// statically (`Type::member`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolCategory {
    Static,
    Instance,
}

/// Who may reach a symbol. `Private` restricts use sites to the declaring
/// module subtree; declaration itself is never access checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessModifier {
    Public,
    Private,
}

/// Whether an expression names a memory location or a transient value.
/// Assignment targets and reference formation require `L`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    L,
    R,
}

/// The type-and-value-kind pair every sema expression exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    pub symbol: SymbolId,
    pub value_kind: ValueKind,
}

impl TypeInfo {
    pub fn new(symbol: SymbolId, value_kind: ValueKind) -> Self {
        Self { symbol, value_kind }
    }

    pub fn lvalue(symbol: SymbolId) -> Self {
        Self::new(symbol, ValueKind::L)
    }

    pub fn rvalue(symbol: SymbolId) -> Self {
        Self::new(symbol, ValueKind::R)
    }
}
