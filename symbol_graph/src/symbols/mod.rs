use crate::scope::SymbolGraph;
use crate::{AccessModifier, ScopeId, SymbolCategory, SymbolId};
use shared_context::Ident;

mod callables;
mod generics;
mod impls;
mod types;
mod vars;

pub use callables::{BodyKind, FunctionSymbol, GlueKind, PrototypeSymbol};
pub use generics::{ConstraintSymbol, ModuleSymbol, SupertraitSymbol, UseSymbol};
pub use impls::{InherentImplSymbol, TraitImplSymbol};
pub use types::{
    AliasSymbol, ErrorTypeSymbol, SizeState, StructSymbol, TraitSelfSymbol, TraitSymbol,
    TypeParamSymbol,
};
pub use vars::{
    FieldVarSymbol, LocalVarSymbol, ParamVarSymbol, SelfParamVarSymbol, StaticVarSymbol,
};

/// Every entity a program can declare. The set is sealed: the sema passes
/// match over it and a new variant is a change to all of them.
#[derive(Debug)]
pub enum Symbol {
    Module(ModuleSymbol),
    Struct(StructSymbol),
    Trait(TraitSymbol),
    TraitSelf(TraitSelfSymbol),
    TypeParam(TypeParamSymbol),
    Alias(AliasSymbol),
    ErrorType(ErrorTypeSymbol),
    InherentImpl(InherentImplSymbol),
    TraitImpl(TraitImplSymbol),
    Function(FunctionSymbol),
    Prototype(PrototypeSymbol),
    Local(LocalVarSymbol),
    Field(FieldVarSymbol),
    StaticVar(StaticVarSymbol),
    SelfParam(SelfParamVarSymbol),
    Param(ParamVarSymbol),
    Constraint(ConstraintSymbol),
    Supertrait(SupertraitSymbol),
    Use(UseSymbol),
}

impl Symbol {
    pub fn get_name(&self) -> Ident {
        match self {
            Symbol::Module(s) => s.name,
            Symbol::Struct(s) => s.name,
            Symbol::Trait(s) => s.name,
            Symbol::TraitSelf(s) => s.name,
            Symbol::TypeParam(s) => s.name,
            Symbol::Alias(s) => s.name,
            Symbol::ErrorType(s) => s.name,
            Symbol::InherentImpl(s) => s.name,
            Symbol::TraitImpl(s) => s.name,
            Symbol::Function(s) => s.name,
            Symbol::Prototype(s) => s.name,
            Symbol::Local(s) => s.name,
            Symbol::Field(s) => s.name,
            Symbol::StaticVar(s) => s.name,
            Symbol::SelfParam(s) => s.name,
            Symbol::Param(s) => s.name,
            Symbol::Constraint(s) => s.name,
            Symbol::Supertrait(s) => s.name,
            Symbol::Use(s) => s.name,
        }
    }

    /// The scope the symbol is declared in.
    pub fn get_scope(&self) -> ScopeId {
        match self {
            Symbol::Module(s) => s.scope,
            Symbol::Struct(s) => s.scope,
            Symbol::Trait(s) => s.scope,
            Symbol::TraitSelf(s) => s.scope,
            Symbol::TypeParam(s) => s.scope,
            Symbol::Alias(s) => s.scope,
            Symbol::ErrorType(s) => s.scope,
            Symbol::InherentImpl(s) => s.scope,
            Symbol::TraitImpl(s) => s.scope,
            Symbol::Function(s) => s.scope,
            Symbol::Prototype(s) => s.scope,
            Symbol::Local(s) => s.scope,
            Symbol::Field(s) => s.scope,
            Symbol::StaticVar(s) => s.scope,
            Symbol::SelfParam(s) => s.scope,
            Symbol::Param(s) => s.scope,
            Symbol::Constraint(s) => s.scope,
            Symbol::Supertrait(s) => s.scope,
            Symbol::Use(s) => s.scope,
        }
    }

    /// The scope the symbol owns, for symbols that have a body.
    pub fn get_body_scope(&self) -> Option<ScopeId> {
        match self {
            Symbol::Module(s) => Some(s.body_scope),
            Symbol::Struct(s) => Some(s.body_scope),
            Symbol::Trait(s) => Some(s.body_scope),
            Symbol::InherentImpl(s) => Some(s.body_scope),
            Symbol::TraitImpl(s) => Some(s.body_scope),
            Symbol::Function(s) => Some(s.body_scope),
            Symbol::Prototype(s) => Some(s.body_scope),
            _ => None,
        }
    }

    pub fn get_access(&self) -> AccessModifier {
        match self {
            Symbol::Module(s) => s.access,
            Symbol::Struct(s) => s.access,
            Symbol::Trait(s) => s.access,
            Symbol::Alias(s) => s.access,
            Symbol::Function(s) => s.access,
            Symbol::Prototype(s) => s.access,
            Symbol::Field(s) => s.access,
            Symbol::StaticVar(s) => s.access,
            // everything else is only reachable from inside its own body
            _ => AccessModifier::Public,
        }
    }

    pub fn get_category(&self) -> SymbolCategory {
        match self {
            Symbol::Function(s) => s.category,
            Symbol::Prototype(_) => SymbolCategory::Instance,
            Symbol::Field(_) | Symbol::SelfParam(_) => SymbolCategory::Instance,
            _ => SymbolCategory::Static,
        }
    }

    /// The word diagnostics use for this kind of symbol.
    pub fn get_noun(&self) -> &'static str {
        match self {
            Symbol::Module(_) => "module",
            Symbol::Struct(_) => "struct",
            Symbol::Trait(_) => "trait",
            Symbol::TraitSelf(_) => "trait self type",
            Symbol::TypeParam(_) => "type parameter",
            Symbol::Alias(_) => "type alias",
            Symbol::ErrorType(_) => "unknown type",
            Symbol::InherentImpl(_) => "impl",
            Symbol::TraitImpl(_) => "trait impl",
            Symbol::Function(_) => "function",
            Symbol::Prototype(_) => "trait method",
            Symbol::Local(_) => "local variable",
            Symbol::Field(_) => "field",
            Symbol::StaticVar(_) => "static variable",
            Symbol::SelfParam(_) => "self parameter",
            Symbol::Param(_) => "parameter",
            Symbol::Constraint(_) => "constraint",
            Symbol::Supertrait(_) => "supertrait",
            Symbol::Use(_) => "use import",
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Symbol::Struct(_)
                | Symbol::Trait(_)
                | Symbol::TraitSelf(_)
                | Symbol::TypeParam(_)
                | Symbol::Alias(_)
                | Symbol::ErrorType(_)
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Symbol::Function(_) | Symbol::Prototype(_))
    }

    pub fn is_var(&self) -> bool {
        matches!(
            self,
            Symbol::Local(_)
                | Symbol::Field(_)
                | Symbol::StaticVar(_)
                | Symbol::SelfParam(_)
                | Symbol::Param(_)
        )
    }

    /// Type arguments of a generic symbol. A generic root carries its own
    /// type parameters here (a placeholder of itself); instances carry the
    /// concrete arguments.
    pub fn get_type_args(&self) -> &[SymbolId] {
        match self {
            Symbol::Struct(s) => &s.type_args,
            Symbol::Trait(s) => &s.type_args,
            Symbol::Function(s) => &s.type_args,
            Symbol::Prototype(s) => &s.type_args,
            _ => &[],
        }
    }

    pub fn get_type_params(&self) -> &[SymbolId] {
        match self {
            Symbol::Struct(s) => &s.type_params,
            Symbol::Trait(s) => &s.type_params,
            Symbol::Function(s) => &s.type_params,
            Symbol::Prototype(s) => &s.type_params,
            _ => &[],
        }
    }

    /// The generic root an instance was materialized from. `None` on roots
    /// and on non-generic symbols.
    pub fn get_generic_root_hint(&self) -> Option<SymbolId> {
        match self {
            Symbol::Struct(s) => s.generic_root,
            Symbol::Trait(s) => s.generic_root,
            Symbol::Function(s) => s.generic_root,
            Symbol::Prototype(s) => s.generic_root,
            _ => None,
        }
    }

    /// Generic symbols participate in instantiation: anything with type
    /// args, plus prototypes (which are generic over the trait self type).
    pub fn is_generic(&self) -> bool {
        !self.get_type_args().is_empty() || matches!(self, Symbol::Prototype(_))
    }

    /// Ordered parameters of a callable, excluding the self parameter.
    pub fn callable_params(&self) -> Option<&[SymbolId]> {
        match self {
            Symbol::Function(s) => Some(&s.params),
            Symbol::Prototype(s) => Some(&s.params),
            _ => None,
        }
    }

    pub fn callable_return_type(&self) -> Option<SymbolId> {
        match self {
            Symbol::Function(s) => Some(s.return_type),
            Symbol::Prototype(s) => Some(s.return_type),
            _ => None,
        }
    }

    pub fn callable_self_param(&self) -> Option<SymbolId> {
        match self {
            Symbol::Function(s) => s.self_param,
            Symbol::Prototype(s) => s.self_param,
            _ => None,
        }
    }

    /// The declared type of a var symbol.
    pub fn get_var_type(&self) -> Option<SymbolId> {
        match self {
            Symbol::Local(s) => Some(s.var_type),
            Symbol::Field(s) => Some(s.var_type),
            Symbol::StaticVar(s) => Some(s.var_type),
            Symbol::SelfParam(s) => Some(s.var_type),
            Symbol::Param(s) => Some(s.var_type),
            _ => None,
        }
    }

    /// Whether declaring `other` next to `self` (same name, same scope) is
    /// a redeclaration. Callables overload when their parameter types or
    /// type arguments differ; generic roots coexist with their instances;
    /// `use` imports never conflict.
    pub fn conflicts_with(&self, other: &Symbol, graph: &SymbolGraph) -> bool {
        if matches!(self, Symbol::Use(_)) || matches!(other, Symbol::Use(_)) {
            return false;
        }

        // Template-vs-instance role and distinct instances: differing type
        // args means a different declaration.
        if self.is_generic() || other.is_generic() {
            if !same_types(self.get_type_args(), other.get_type_args(), graph) {
                return false;
            }
        }

        if self.is_callable() && other.is_callable() {
            let self_params = param_types(self, graph);
            let other_params = param_types(other, graph);
            return same_types(&self_params, &other_params, graph);
        }

        true
    }
}

fn param_types(symbol: &Symbol, graph: &SymbolGraph) -> Vec<SymbolId> {
    symbol
        .callable_params()
        .unwrap_or(&[])
        .iter()
        .map(|&p| graph.symbol(p).get_var_type().expect("param has a type"))
        .collect()
}

/// Compares two type lists after unaliasing.
pub fn same_types(a: &[SymbolId], b: &[SymbolId], graph: &SymbolGraph) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(&x, &y)| graph.unaliased(x) == graph.unaliased(y))
}
