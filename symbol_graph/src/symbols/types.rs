use crate::{AccessModifier, ScopeId, SymbolId};
use shared_context::Ident;

/// Progress of struct size resolution. `Resolving` doubles as the cycle
/// flag: reentering a struct in this state is a layout cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeState {
    Unresolved,
    Resolving,
    Sized,
    Unsized,
}

/// A nominal struct type, or an instance of a generic one. The fields live
/// in the body scope as `Field` symbols ordered by index.
#[derive(Debug)]
pub struct StructSymbol {
    pub scope: ScopeId,
    pub body_scope: ScopeId,
    pub name: Ident,
    pub access: AccessModifier,
    pub type_params: Vec<SymbolId>,
    pub type_args: Vec<SymbolId>,
    pub generic_root: Option<SymbolId>,
    pub size_state: SizeState,
    /// Lowered straight to an IR primitive; no field layout of its own.
    pub primitively_emittable: bool,
    pub trivially_copyable: bool,
    pub trivially_droppable: bool,
    pub copy_glue: Option<SymbolId>,
    pub drop_glue: Option<SymbolId>,
}

impl StructSymbol {
    pub fn new(
        scope: ScopeId,
        body_scope: ScopeId,
        name: Ident,
        access: AccessModifier,
        type_params: Vec<SymbolId>,
        type_args: Vec<SymbolId>,
    ) -> Self {
        Self {
            scope,
            body_scope,
            name,
            access,
            type_params,
            type_args,
            generic_root: None,
            size_state: SizeState::Unresolved,
            primitively_emittable: false,
            trivially_copyable: false,
            trivially_droppable: false,
            copy_glue: None,
            drop_glue: None,
        }
    }
}

/// A trait: a body scope of prototypes plus the trait self type and any
/// supertrait requirements.
#[derive(Debug)]
pub struct TraitSymbol {
    pub scope: ScopeId,
    pub body_scope: ScopeId,
    pub name: Ident,
    pub access: AccessModifier,
    pub type_params: Vec<SymbolId>,
    pub type_args: Vec<SymbolId>,
    pub generic_root: Option<SymbolId>,
    /// The `TraitSelf` symbol declared in the body scope.
    pub self_type: SymbolId,
}

/// The `Self` type inside a trait body. Substituted with the implementing
/// type when prototypes are instantiated.
#[derive(Debug)]
pub struct TraitSelfSymbol {
    pub scope: ScopeId,
    pub name: Ident,
    pub parent_trait: SymbolId,
}

/// A declared type parameter. Counts as sized so placeholder instances can
/// be formed inside generic bodies.
#[derive(Debug)]
pub struct TypeParamSymbol {
    pub scope: ScopeId,
    pub name: Ident,
    pub index: usize,
}

/// A name for another type. Instance body scopes use aliases to map the
/// root's type parameters onto the concrete arguments.
#[derive(Debug)]
pub struct AliasSymbol {
    pub scope: ScopeId,
    pub name: Ident,
    pub access: AccessModifier,
    pub target: SymbolId,
}

/// The error placeholder type. Stands in wherever resolution failed so the
/// rest of the tree can still be analyzed; conversions to and from it
/// always succeed silently.
#[derive(Debug)]
pub struct ErrorTypeSymbol {
    pub scope: ScopeId,
    pub name: Ident,
}
