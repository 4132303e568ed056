use crate::{ScopeId, SymbolId};
use shared_context::Ident;

/// An inherent impl block. Its body scope is associated with the target
/// type's body scope, which is how instance lookup reaches the members.
#[derive(Debug)]
pub struct InherentImplSymbol {
    pub scope: ScopeId,
    pub body_scope: ScopeId,
    pub name: Ident,
    pub target_type: SymbolId,
}

/// A trait impl block: the target type, the implemented trait, and
/// optionally a scope carrying constraints on the impl.
#[derive(Debug)]
pub struct TraitImplSymbol {
    pub scope: ScopeId,
    pub body_scope: ScopeId,
    pub name: Ident,
    pub target_type: SymbolId,
    pub implemented_trait: SymbolId,
    pub constraints_scope: Option<ScopeId>,
}
