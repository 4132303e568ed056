use crate::natives::NativeOp;
use crate::{AccessModifier, ScopeId, SymbolCategory, SymbolId};
use shared_context::Ident;

/// Which compiler-synthesized glue a function is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlueKind {
    Copy,
    Drop,
}

/// What stands behind a function symbol when its IR is requested. The core
/// records the binding; the emitter side interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Not yet bound. Emission of a function in this state is an internal
    /// error.
    Unbound,
    /// A user-written body; the sema tree lives in the pipeline's body map.
    User,
    /// A built-in operation with an externally provided body.
    Native(NativeOp),
    /// Synthesized copy or drop glue with an externally provided body.
    Glue(GlueKind),
}

/// A function, free or associated, or an instance of a generic one.
#[derive(Debug)]
pub struct FunctionSymbol {
    pub scope: ScopeId,
    pub body_scope: ScopeId,
    pub name: Ident,
    pub access: AccessModifier,
    pub category: SymbolCategory,
    pub return_type: SymbolId,
    /// Ordered `Param` symbols, excluding the self parameter.
    pub params: Vec<SymbolId>,
    pub self_param: Option<SymbolId>,
    pub type_params: Vec<SymbolId>,
    pub type_args: Vec<SymbolId>,
    pub generic_root: Option<SymbolId>,
    pub body: BodyKind,
}

impl FunctionSymbol {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scope: ScopeId,
        body_scope: ScopeId,
        name: Ident,
        access: AccessModifier,
        category: SymbolCategory,
        return_type: SymbolId,
        params: Vec<SymbolId>,
        self_param: Option<SymbolId>,
    ) -> Self {
        Self {
            scope,
            body_scope,
            name,
            access,
            category,
            return_type,
            params,
            self_param,
            type_params: Vec::new(),
            type_args: Vec::new(),
            generic_root: None,
            body: BodyKind::Unbound,
        }
    }
}

/// A trait-declared method signature without a body. Generic over the
/// trait self type; each trait impl must match it with a function.
#[derive(Debug)]
pub struct PrototypeSymbol {
    pub scope: ScopeId,
    pub body_scope: ScopeId,
    pub name: Ident,
    pub access: AccessModifier,
    pub return_type: SymbolId,
    pub params: Vec<SymbolId>,
    pub self_param: Option<SymbolId>,
    pub type_params: Vec<SymbolId>,
    pub type_args: Vec<SymbolId>,
    pub generic_root: Option<SymbolId>,
    pub parent_trait: SymbolId,
    /// The trait self type on the root; the implementing type once
    /// instantiated for an impl.
    pub self_type: SymbolId,
}
