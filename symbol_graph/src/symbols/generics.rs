use crate::{AccessModifier, ScopeId, SymbolId};
use shared_context::{Ident, Span};

/// A module: a named scope grouping declarations. Accessibility of private
/// symbols is defined over module subtrees.
#[derive(Debug)]
pub struct ModuleSymbol {
    pub scope: ScopeId,
    pub body_scope: ScopeId,
    pub name: Ident,
    pub access: AccessModifier,
}

/// `T: Trait1 + Trait2` on a generic symbol. Named after the constrained
/// parameter; checked each time the owner is instantiated.
#[derive(Debug)]
pub struct ConstraintSymbol {
    pub scope: ScopeId,
    pub name: Ident,
    pub type_param: SymbolId,
    pub traits: Vec<SymbolId>,
    pub span: Span,
}

/// A supertrait requirement inside a trait body: implementing the trait
/// requires the self type to also implement this one.
#[derive(Debug)]
pub struct SupertraitSymbol {
    pub scope: ScopeId,
    pub name: Ident,
    pub supertrait: SymbolId,
}

/// A `use` import bringing a trait's methods into scope for instance
/// method lookup. Never conflicts with other declarations.
#[derive(Debug)]
pub struct UseSymbol {
    pub scope: ScopeId,
    pub name: Ident,
    pub target_trait: SymbolId,
}
