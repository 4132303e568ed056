use crate::{AccessModifier, ScopeId, SymbolId};
use shared_context::Ident;

/// A `let` binding inside a function body.
#[derive(Debug)]
pub struct LocalVarSymbol {
    pub scope: ScopeId,
    pub name: Ident,
    pub var_type: SymbolId,
}

/// An instance field of a struct. `index` fixes the layout position.
#[derive(Debug)]
pub struct FieldVarSymbol {
    pub scope: ScopeId,
    pub name: Ident,
    pub access: AccessModifier,
    pub var_type: SymbolId,
    pub index: usize,
}

/// A module-level variable.
#[derive(Debug)]
pub struct StaticVarSymbol {
    pub scope: ScopeId,
    pub name: Ident,
    pub access: AccessModifier,
    pub var_type: SymbolId,
}

/// The `self` parameter of an instance function. Typed as a reference to
/// the implementing type.
#[derive(Debug)]
pub struct SelfParamVarSymbol {
    pub scope: ScopeId,
    pub name: Ident,
    pub var_type: SymbolId,
}

/// An ordinary function parameter. `index` is the call-site argument
/// position, not counting self.
#[derive(Debug)]
pub struct ParamVarSymbol {
    pub scope: ScopeId,
    pub name: Ident,
    pub var_type: SymbolId,
    pub index: usize,
}
