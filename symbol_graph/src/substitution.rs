use crate::natives::Natives;
use crate::scope::{ScopeKind, SymbolGraph};
use crate::symbols::{
    AliasSymbol, FieldVarSymbol, FunctionSymbol, LocalVarSymbol, ParamVarSymbol, PrototypeSymbol,
    SelfParamVarSymbol, SizeState, StaticVarSymbol, StructSymbol, Symbol, TraitSelfSymbol,
    TraitSymbol, same_types,
};
use crate::{AccessModifier, ScopeId, SymbolId, instantiator};
use shared_context::Span;
use shared_context::diagnostics::{Diagnostic, DiagnosticBag};
use shared_context::interner::Interner;

/// The type-argument assignment applied while materializing an instance of
/// a generic root: parallel parameter/argument lists, plus the optional
/// trait-self substitution used when prototypes are instantiated for an
/// implementing type.
#[derive(Debug, Clone)]
pub struct InstantiationContext {
    pub params: Vec<SymbolId>,
    pub args: Vec<SymbolId>,
    pub self_map: Option<(SymbolId, SymbolId)>,
}

impl InstantiationContext {
    pub fn new(params: Vec<SymbolId>, args: Vec<SymbolId>) -> Self {
        debug_assert_eq!(params.len(), args.len());
        Self {
            params,
            args,
            self_map: None,
        }
    }

    pub fn with_self(
        params: Vec<SymbolId>,
        args: Vec<SymbolId>,
        self_from: SymbolId,
        self_to: SymbolId,
    ) -> Self {
        Self {
            params,
            args,
            self_map: Some((self_from, self_to)),
        }
    }
}

/// Applies `ctx` to a type: type parameters map to their arguments, the
/// trait self type maps to the implementing type, and generic instances
/// whose arguments change are re-instantiated (through the instantiator,
/// so body elaboration stays deferment safe).
pub fn substitute_type(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    ty: SymbolId,
    ctx: &InstantiationContext,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> SymbolId {
    let unaliased = graph.unaliased(ty);

    if let Some(position) = ctx
        .params
        .iter()
        .position(|&p| graph.unaliased(p) == unaliased)
    {
        return ctx.args[position];
    }

    if let Some((from, to)) = ctx.self_map {
        if graph.unaliased(from) == unaliased {
            return to;
        }
    }

    let symbol = graph.symbol(unaliased);
    if !symbol.is_type() || symbol.get_type_args().is_empty() {
        return ty;
    }

    let type_args = symbol.get_type_args().to_vec();
    let root = symbol.get_generic_root_hint().unwrap_or(unaliased);

    let new_args: Vec<SymbolId> = type_args
        .iter()
        .map(|&arg| substitute_type(graph, natives, interner, arg, ctx, span, diagnostics))
        .collect();

    if same_types(&new_args, &type_args, graph) {
        return ty;
    }

    diagnostics.collect(instantiator::instantiate_or_get(
        graph, natives, interner, span, root, new_args,
    ))
}

/// Produces a copy of `symbol` with `ctx` applied, declared into
/// `target_scope`. Body-scoped symbols get a fresh body scope seeded with
/// aliases mapping their type parameters onto the context's arguments;
/// their members are cloned later, when the instance body is elaborated.
pub fn create_instantiated(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    symbol: SymbolId,
    target_scope: ScopeId,
    ctx: &InstantiationContext,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> SymbolId {
    match graph.symbol(symbol) {
        Symbol::Struct(_) => instantiate_struct(
            graph,
            natives,
            interner,
            symbol,
            target_scope,
            ctx,
            span,
            diagnostics,
        ),
        Symbol::Trait(_) => instantiate_trait(
            graph,
            natives,
            interner,
            symbol,
            target_scope,
            ctx,
            span,
            diagnostics,
        ),
        Symbol::Function(_) | Symbol::Prototype(_) => instantiate_callable(
            graph,
            natives,
            interner,
            symbol,
            target_scope,
            ctx,
            span,
            diagnostics,
        ),
        Symbol::Field(data) => {
            let data = FieldVarSymbol {
                scope: target_scope,
                name: data.name,
                access: data.access,
                var_type: data.var_type,
                index: data.index,
            };
            let var_type =
                substitute_type(graph, natives, interner, data.var_type, ctx, span, diagnostics);
            graph.declare_symbol_unchecked(Symbol::Field(FieldVarSymbol { var_type, ..data }))
        }
        Symbol::StaticVar(data) => {
            let data = StaticVarSymbol {
                scope: target_scope,
                name: data.name,
                access: data.access,
                var_type: data.var_type,
            };
            let var_type =
                substitute_type(graph, natives, interner, data.var_type, ctx, span, diagnostics);
            graph.declare_symbol_unchecked(Symbol::StaticVar(StaticVarSymbol { var_type, ..data }))
        }
        Symbol::Local(data) => {
            let data = LocalVarSymbol {
                scope: target_scope,
                name: data.name,
                var_type: data.var_type,
            };
            let var_type =
                substitute_type(graph, natives, interner, data.var_type, ctx, span, diagnostics);
            graph.declare_symbol_unchecked(Symbol::Local(LocalVarSymbol { var_type, ..data }))
        }
        Symbol::Alias(data) => {
            let data = AliasSymbol {
                scope: target_scope,
                name: data.name,
                access: data.access,
                target: data.target,
            };
            let target =
                substitute_type(graph, natives, interner, data.target, ctx, span, diagnostics);
            graph.declare_symbol_unchecked(Symbol::Alias(AliasSymbol { target, ..data }))
        }
        Symbol::Use(data) => {
            let cloned = crate::symbols::UseSymbol {
                scope: target_scope,
                name: data.name,
                target_trait: data.target_trait,
            };
            graph.declare_symbol_unchecked(Symbol::Use(cloned))
        }
        other => {
            diagnostics.add(Diagnostic::fatal_internal(
                span,
                format!("cannot instantiate a {}", other.get_noun()),
            ));
            symbol
        }
    }
}

/// Declares aliases in `body` mapping each of `params` onto its
/// substituted type, so names inside the instance body resolve concretely.
fn declare_param_aliases(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    body: ScopeId,
    params: &[SymbolId],
    ctx: &InstantiationContext,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) {
    for &param in params {
        let name = graph.symbol(param).get_name();
        let target = substitute_type(graph, natives, interner, param, ctx, span, diagnostics);
        graph.declare_symbol_unchecked(Symbol::Alias(AliasSymbol {
            scope: body,
            name,
            access: AccessModifier::Public,
            target,
        }));
    }
}

#[allow(clippy::too_many_arguments)]
fn instantiate_struct(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    symbol: SymbolId,
    target_scope: ScopeId,
    ctx: &InstantiationContext,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> SymbolId {
    let Symbol::Struct(data) = graph.symbol(symbol) else {
        unreachable!()
    };
    let name = data.name;
    let access = data.access;
    let type_params = data.type_params.clone();
    let type_args = data.type_args.clone();
    let primitively_emittable = data.primitively_emittable;
    let trivially_copyable = data.trivially_copyable;
    let trivially_droppable = data.trivially_droppable;
    let root = data.generic_root.unwrap_or(symbol);

    let body = graph.create_scope(target_scope, ScopeKind::TypeBody, Some(name.get_name()));
    declare_param_aliases(
        graph,
        natives,
        interner,
        body,
        &type_params,
        ctx,
        span,
        diagnostics,
    );

    let new_args: Vec<SymbolId> = type_args
        .iter()
        .map(|&arg| substitute_type(graph, natives, interner, arg, ctx, span, diagnostics))
        .collect();

    let mut instance = StructSymbol::new(target_scope, body, name, access, type_params, new_args);
    instance.primitively_emittable = primitively_emittable;
    instance.trivially_copyable = trivially_copyable;
    instance.trivially_droppable = trivially_droppable;
    instance.generic_root = Some(root);
    if primitively_emittable {
        instance.size_state = SizeState::Sized;
    }
    graph.declare_symbol_unchecked(Symbol::Struct(instance))
}

#[allow(clippy::too_many_arguments)]
fn instantiate_trait(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    symbol: SymbolId,
    target_scope: ScopeId,
    ctx: &InstantiationContext,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> SymbolId {
    let Symbol::Trait(data) = graph.symbol(symbol) else {
        unreachable!()
    };
    let name = data.name;
    let access = data.access;
    let type_params = data.type_params.clone();
    let type_args = data.type_args.clone();
    let self_name = graph.symbol(data.self_type).get_name();
    let root = data.generic_root.unwrap_or(symbol);

    let body = graph.create_scope(target_scope, ScopeKind::TypeBody, Some(name.get_name()));
    declare_param_aliases(
        graph,
        natives,
        interner,
        body,
        &type_params,
        ctx,
        span,
        diagnostics,
    );

    let new_args: Vec<SymbolId> = type_args
        .iter()
        .map(|&arg| substitute_type(graph, natives, interner, arg, ctx, span, diagnostics))
        .collect();

    // The instance gets its own Self; the symbol id is only known after
    // the trait itself is declared, so patch it afterwards.
    let instance = TraitSymbol {
        scope: target_scope,
        body_scope: body,
        name,
        access,
        type_params,
        type_args: new_args,
        generic_root: Some(root),
        self_type: symbol,
    };
    let instance_id = graph.declare_symbol_unchecked(Symbol::Trait(instance));

    let self_type = graph.declare_symbol_unchecked(Symbol::TraitSelf(TraitSelfSymbol {
        scope: body,
        name: self_name,
        parent_trait: instance_id,
    }));
    if let Symbol::Trait(data) = graph.symbol_mut(instance_id) {
        data.self_type = self_type;
    }

    instance_id
}

#[allow(clippy::too_many_arguments)]
fn instantiate_callable(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    symbol: SymbolId,
    target_scope: ScopeId,
    ctx: &InstantiationContext,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> SymbolId {
    let body = graph.create_scope(target_scope, ScopeKind::FunctionBody, None);

    let type_params = graph.symbol(symbol).get_type_params().to_vec();
    declare_param_aliases(
        graph,
        natives,
        interner,
        body,
        &type_params,
        ctx,
        span,
        diagnostics,
    );

    // Parameters are materialized eagerly: call sites need the substituted
    // signature long before the instance body is elaborated.
    let param_ids = graph.symbol(symbol).callable_params().unwrap_or(&[]).to_vec();
    let mut params = Vec::with_capacity(param_ids.len());
    for param in param_ids {
        let (name, var_type, index) = match graph.symbol(param) {
            Symbol::Param(p) => (p.name, p.var_type, p.index),
            _ => continue,
        };
        let var_type = substitute_type(graph, natives, interner, var_type, ctx, span, diagnostics);
        params.push(graph.declare_symbol_unchecked(Symbol::Param(ParamVarSymbol {
            scope: body,
            name,
            var_type,
            index,
        })));
    }

    let self_param = match graph.symbol(symbol).callable_self_param() {
        Some(self_param) => {
            let (name, var_type) = match graph.symbol(self_param) {
                Symbol::SelfParam(p) => (p.name, p.var_type),
                _ => unreachable!("self param symbol"),
            };
            let var_type =
                substitute_type(graph, natives, interner, var_type, ctx, span, diagnostics);
            Some(
                graph.declare_symbol_unchecked(Symbol::SelfParam(SelfParamVarSymbol {
                    scope: body,
                    name,
                    var_type,
                })),
            )
        }
        None => None,
    };

    match graph.symbol(symbol) {
        Symbol::Function(data) => {
            let name = data.name;
            let access = data.access;
            let category = data.category;
            let return_type = data.return_type;
            let type_args = data.type_args.clone();
            let body_kind = data.body;
            let root = data.generic_root.unwrap_or(symbol);

            let return_type =
                substitute_type(graph, natives, interner, return_type, ctx, span, diagnostics);
            let new_args: Vec<SymbolId> = type_args
                .iter()
                .map(|&arg| substitute_type(graph, natives, interner, arg, ctx, span, diagnostics))
                .collect();

            let mut instance =
                FunctionSymbol::new(target_scope, body, name, access, category, return_type, params, self_param);
            instance.type_params = type_params;
            instance.type_args = new_args;
            instance.generic_root = Some(root);
            instance.body = body_kind;
            graph.declare_symbol_unchecked(Symbol::Function(instance))
        }
        Symbol::Prototype(data) => {
            let name = data.name;
            let access = data.access;
            let return_type = data.return_type;
            let type_args = data.type_args.clone();
            let parent_trait = data.parent_trait;
            let self_type = data.self_type;
            let root = data.generic_root.unwrap_or(symbol);

            let return_type =
                substitute_type(graph, natives, interner, return_type, ctx, span, diagnostics);
            let new_args: Vec<SymbolId> = type_args
                .iter()
                .map(|&arg| substitute_type(graph, natives, interner, arg, ctx, span, diagnostics))
                .collect();
            let self_type =
                substitute_type(graph, natives, interner, self_type, ctx, span, diagnostics);

            let instance = PrototypeSymbol {
                scope: target_scope,
                body_scope: body,
                name,
                access,
                return_type,
                params,
                self_param,
                type_params,
                type_args: new_args,
                generic_root: Some(root),
                parent_trait,
                self_type,
            };
            graph.declare_symbol_unchecked(Symbol::Prototype(instance))
        }
        _ => unreachable!("instantiate_callable on a non-callable"),
    }
}
