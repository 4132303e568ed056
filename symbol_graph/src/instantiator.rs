// The generic instantiator: materializes concrete instances of generic
// roots on demand and defers instance-body elaboration until declaration
// of the whole program has finished, which is what makes mutually
// recursive generic types safe to resolve.

use crate::natives::Natives;
use crate::scope::SymbolGraph;
use crate::symbols::{Symbol, same_types};
use crate::{ScopeId, SymbolId, compilation, layout, substitution};
pub use crate::substitution::InstantiationContext;
use shared_context::Span;
use shared_context::diagnostics::{Diagnosed, Diagnostic, DiagnosticBag, DiagnosticNote};
use shared_context::interner::Interner;
use tracing::{debug, trace};

/// Scope-declaration hook: the first generic, instantiable symbol declared
/// under a name becomes the root for that name in its scope.
pub fn on_symbol_declared(graph: &mut SymbolGraph, id: SymbolId) {
    if graph.unaliased(id) != id {
        return;
    }

    let symbol = graph.symbol(id);
    if !symbol.is_generic() {
        return;
    }
    let name = symbol.get_name().get_name();
    let scope = symbol.get_scope();

    let instantiable = match symbol {
        // A prototype is a root while its self type is still the trait's
        // own Self; instances carry a concrete implementing type.
        Symbol::Prototype(proto) => {
            let self_type = proto.self_type;
            let parent_trait = proto.parent_trait;
            match graph.symbol(graph.unaliased(parent_trait)) {
                Symbol::Trait(t) => graph.unaliased(self_type) == graph.unaliased(t.self_type),
                _ => false,
            }
        }
        other => !other.get_type_args().is_empty(),
    };
    if !instantiable {
        return;
    }

    let state = &mut graph.scope_mut(scope).instantiator;
    if state.name_to_root.contains_key(&name) {
        return;
    }
    state.name_to_root.insert(name, id);
    state.root_to_monos.insert(id, Vec::new());
}

/// The root a generic instance was materialized from. Roots map to
/// themselves.
pub fn generic_root_of(graph: &SymbolGraph, instance: SymbolId) -> SymbolId {
    let unaliased = graph.unaliased(instance);
    if let Some(root) = graph.symbol(unaliased).get_generic_root_hint() {
        return root;
    }
    let name = graph.symbol(unaliased).get_name().get_name();
    let scope = graph.symbol(unaliased).get_scope();
    graph
        .scope(scope)
        .instantiator
        .name_to_root
        .get(&name)
        .copied()
        .unwrap_or(unaliased)
}

/// Whether a symbol is a generic root or an instance produced by this
/// instantiator.
pub fn is_instance(graph: &SymbolGraph, symbol: SymbolId) -> bool {
    let unaliased = graph.unaliased(symbol);
    let name = graph.symbol(unaliased).get_name().get_name();
    let scope = graph.symbol(unaliased).get_scope();
    let state = &graph.scope(scope).instantiator;
    state.name_to_root.contains_key(&name) || state.instance_set.contains(&unaliased)
}

/// Whether a type still mentions type parameters (or a trait self type)
/// anywhere. Placeholder instances resolve names but are never emitted.
pub fn is_placeholder_type(graph: &SymbolGraph, ty: SymbolId) -> bool {
    let ty = graph.unaliased(ty);
    match graph.symbol(ty) {
        Symbol::TypeParam(_) | Symbol::TraitSelf(_) => true,
        symbol => symbol
            .get_type_args()
            .iter()
            .any(|&arg| is_placeholder_type(graph, arg)),
    }
}

/// Whether a generic symbol (function or type instance) still carries
/// placeholder type arguments.
pub fn is_placeholder_symbol(graph: &SymbolGraph, symbol: SymbolId) -> bool {
    let unaliased = graph.unaliased(symbol);
    let by_args = graph
        .symbol(unaliased)
        .get_type_args()
        .iter()
        .any(|&arg| is_placeholder_type(graph, arg));
    let by_self = match graph.symbol(unaliased) {
        Symbol::Prototype(proto) => is_placeholder_type(graph, proto.self_type),
        _ => false,
    };
    by_args || by_self
}

/// Finds the existing instance of `root` for `args`, or materializes one:
/// checks the arguments are sized (pointer-family roots excepted),
/// diagnoses unsatisfied constraints, constructs the instance in the
/// root's scope, and queues its body while deferment is active.
/// Instantiation is idempotent; the same root and arguments always yield
/// the same symbol.
pub fn instantiate_or_get(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    span: Span,
    root: SymbolId,
    args: Vec<SymbolId>,
) -> Diagnosed<SymbolId> {
    let mut diagnostics = DiagnosticBag::new();

    let root = {
        let unaliased = graph.unaliased(root);
        graph
            .symbol(unaliased)
            .get_generic_root_hint()
            .unwrap_or(unaliased)
    };

    let root_scope = graph.symbol(root).get_scope();
    let name = graph.symbol(root).get_name().get_name();

    // Deduplicate against the instances already declared next to the root.
    for &candidate in graph.scope(root_scope).get_symbols_named(name) {
        if candidate == root {
            continue;
        }
        if same_types(graph.symbol(candidate).get_type_args(), &args, graph) {
            return Diagnosed::new(candidate, diagnostics);
        }
    }

    let type_params = graph.symbol(root).get_type_params().to_vec();
    if type_params.len() != args.len() {
        diagnostics.add(Diagnostic::error(
            span,
            format!(
                "{} takes {} type arguments, got {}",
                compilation::symbol_phrase_of(graph, interner, root),
                type_params.len(),
                args.len()
            ),
        ));
        return Diagnosed::new(natives.error_type, diagnostics);
    }

    // References and the pointer family may wrap anything; every other
    // root requires sized arguments.
    if !natives.is_special_generic(root) {
        for &arg in &args {
            if !layout::is_sized(graph, arg, &mut diagnostics) {
                diagnostics.add(Diagnostic::error(
                    span,
                    format!(
                        "unsized type argument {}",
                        compilation::symbol_phrase_of(graph, interner, arg)
                    ),
                ));
            }
        }
        if diagnostics.has_errors() {
            return Diagnosed::new(natives.error_type, diagnostics);
        }
    }

    let ctx = InstantiationContext::new(type_params.clone(), args.clone());
    diagnose_unsatisfied_constraints(graph, natives, interner, span, root, &ctx, &mut diagnostics);
    if diagnostics.has_errors() {
        return Diagnosed::new(natives.error_type, diagnostics);
    }

    debug!(
        root = %compilation::signature_of(graph, interner, root),
        args = args.len(),
        "instantiating generic root"
    );

    let instance = substitution::create_instantiated(
        graph,
        natives,
        interner,
        root,
        root_scope,
        &ctx,
        span,
        &mut diagnostics,
    );

    let state = &mut graph.scope_mut(root_scope).instantiator;
    state.instance_set.insert(instance);
    state.instance_spans.insert(instance, span);

    defer_or_instantiate_body(graph, natives, interner, instance);

    Diagnosed::new(instance, diagnostics)
}

/// Instantiates a trait prototype for a concrete implementing type. Used
/// while validating trait impls and when forming dyn references.
pub fn instantiate_prototype(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    span: Span,
    proto_root: SymbolId,
    concrete_self: SymbolId,
) -> SymbolId {
    let proto_root = graph.unaliased(proto_root);
    let (trait_self, root_scope, name) = match graph.symbol(proto_root) {
        Symbol::Prototype(proto) => (
            proto.self_type,
            proto.scope,
            proto.name.get_name(),
        ),
        _ => return proto_root,
    };

    // Reuse an instance for the same implementing type.
    for &candidate in graph.scope(root_scope).get_symbols_named(name) {
        if candidate == proto_root {
            continue;
        }
        if let Symbol::Prototype(proto) = graph.symbol(candidate) {
            if graph.unaliased(proto.self_type) == graph.unaliased(concrete_self) {
                return candidate;
            }
        }
    }

    let mut diagnostics = DiagnosticBag::new();
    let ctx = InstantiationContext::with_self(Vec::new(), Vec::new(), trait_self, concrete_self);
    let instance = substitution::create_instantiated(
        graph,
        natives,
        interner,
        proto_root,
        root_scope,
        &ctx,
        span,
        &mut diagnostics,
    );

    let state = &mut graph.scope_mut(root_scope).instantiator;
    state.instance_set.insert(instance);
    state.instance_spans.insert(instance, span);
    instance
}

fn diagnose_unsatisfied_constraints(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    span: Span,
    root: SymbolId,
    ctx: &InstantiationContext,
    diagnostics: &mut DiagnosticBag,
) {
    let Some(body) = graph.symbol(root).get_body_scope() else {
        return;
    };
    let constraints = graph.collect_symbols(body, |s| matches!(s, Symbol::Constraint(_)));

    for constraint in constraints {
        let (type_param, traits, constraint_span) = match graph.symbol(constraint) {
            Symbol::Constraint(c) => (c.type_param, c.traits.clone(), c.span),
            _ => continue,
        };

        let concrete =
            substitution::substitute_type(graph, natives, interner, type_param, ctx, span, diagnostics);
        if matches!(graph.symbol(graph.unaliased(concrete)), Symbol::ErrorType(_)) {
            continue;
        }

        for trait_id in traits {
            if !compilation::is_trait_implemented(graph, concrete, trait_id) {
                diagnostics.add(
                    Diagnostic::error(
                        span,
                        format!(
                            "unsatisfied constraint: {} does not implement {}",
                            compilation::symbol_phrase_of(graph, interner, concrete),
                            compilation::symbol_phrase_of(graph, interner, trait_id),
                        ),
                    )
                    .with_note(DiagnosticNote::new(
                        "required by the constraint declared here",
                        Some(constraint_span),
                    )),
                );
            }
        }
    }
}

fn defer_or_instantiate_body(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    instance: SymbolId,
) {
    // Placeholder instances exist for name resolution only; their bodies
    // are never elaborated, though they stay in the instance set so
    // deduplication keeps working.
    if is_placeholder_symbol(graph, instance) {
        trace!(instance = instance.0, "skipping placeholder body");
        return;
    }

    let scope = graph.symbol(instance).get_scope();
    let state = &mut graph.scope_mut(scope).instantiator;
    if state.defer_bodies {
        state.deferred_instances.push(instance);
    } else {
        instantiate_body(graph, natives, interner, instance);
    }
}

/// Elaborates an instance body: every symbol of the root's body scope
/// (minus type params and constraints) is cloned into the instance's body
/// scope with the instance's type arguments applied. The instance is then
/// queued for referenced-mono propagation.
pub fn instantiate_body(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    instance: SymbolId,
) {
    let root = generic_root_of(graph, instance);
    let (Some(root_body), Some(instance_body)) = (
        graph.symbol(root).get_body_scope(),
        graph.symbol(instance).get_body_scope(),
    ) else {
        return;
    };

    let ctx = body_context(graph, root, instance);
    let span = graph.symbol(instance).get_name().get_span();
    let members: Vec<SymbolId> = graph.scope(root_body).all_symbols().collect();

    let mut diagnostics = DiagnosticBag::new();
    for member in members {
        match graph.symbol(member) {
            Symbol::TypeParam(_) | Symbol::Constraint(_) | Symbol::TraitSelf(_) => continue,
            _ => {}
        }

        // Signature materialization may have cloned some members (callable
        // params); skip anything already present under the same name.
        let name = graph.symbol(member).get_name().get_name();
        let already = graph
            .scope(instance_body)
            .get_symbols_named(name)
            .iter()
            .any(|&existing| {
                std::mem::discriminant(graph.symbol(existing))
                    == std::mem::discriminant(graph.symbol(member))
            });
        if already {
            continue;
        }

        substitution::create_instantiated(
            graph,
            natives,
            interner,
            member,
            instance_body,
            &ctx,
            span,
            &mut diagnostics,
        );
    }

    let scope = graph.symbol(instance).get_scope();
    graph
        .scope_mut(scope)
        .instantiator
        .referenced_monos_instances
        .push(instance);
}

fn body_context(graph: &SymbolGraph, root: SymbolId, instance: SymbolId) -> InstantiationContext {
    let params = graph.symbol(root).get_type_params().to_vec();
    let args = graph.symbol(instance).get_type_args().to_vec();
    match (graph.symbol(root), graph.symbol(instance)) {
        (Symbol::Trait(root_data), Symbol::Trait(instance_data)) => InstantiationContext::with_self(
            params,
            args,
            root_data.self_type,
            instance_data.self_type,
        ),
        _ => InstantiationContext::new(params, args),
    }
}

/// Drains the deferred-instance queues of the whole scope tree, elaborating
/// each body, then disables deferment everywhere. New instances created
/// from here on elaborate immediately.
pub fn finish_body_deferment(graph: &mut SymbolGraph, natives: &Natives, interner: &Interner<'_>) {
    loop {
        let deferred = collect_and_clear_deferred(graph, graph.global_scope());
        if deferred.is_empty() {
            break;
        }
        debug!(count = deferred.len(), "elaborating deferred instance bodies");
        for instance in deferred {
            instantiate_body(graph, natives, interner, instance);
        }
    }

    disable_body_deferment(graph, graph.global_scope());
}

fn disable_body_deferment(graph: &mut SymbolGraph, scope: ScopeId) {
    graph.scope_mut(scope).instantiator.defer_bodies = false;
    let children = graph.scope(scope).get_children().to_vec();
    for child in children {
        disable_body_deferment(graph, child);
    }
}

fn collect_and_clear_deferred(graph: &mut SymbolGraph, scope: ScopeId) -> Vec<SymbolId> {
    let mut instances = std::mem::take(&mut graph.scope_mut(scope).instantiator.deferred_instances);
    let children = graph.scope(scope).get_children().to_vec();
    for child in children {
        instances.extend(collect_and_clear_deferred(graph, child));
    }
    instances
}

fn collect_and_clear_referenced(graph: &mut SymbolGraph, scope: ScopeId) -> Vec<SymbolId> {
    let mut instances = std::mem::take(
        &mut graph
            .scope_mut(scope)
            .instantiator
            .referenced_monos_instances,
    );
    let children = graph.scope(scope).get_children().to_vec();
    for child in children {
        instances.extend(collect_and_clear_referenced(graph, child));
    }
    instances
}

/// Records which placeholder instances a root's body references. Filled in
/// after the root bodies are lowered; consumed by
/// `instantiate_referenced_monos`.
pub fn set_root_monos(graph: &mut SymbolGraph, root: SymbolId, monos: Vec<SymbolId>) {
    let scope = graph.symbol(root).get_scope();
    graph
        .scope_mut(scope)
        .instantiator
        .root_to_monos
        .insert(root, monos);
}

/// Fixed-point propagation: every elaborated instance re-instantiates the
/// placeholder monos its root's body references, in its own type-argument
/// context. Terminates because (root, args) pairs are finite and existing
/// instances are found, not recreated.
pub fn instantiate_referenced_monos(
    graph: &mut SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
) -> Diagnosed<()> {
    let mut diagnostics = DiagnosticBag::new();

    loop {
        let instances = collect_and_clear_referenced(graph, graph.global_scope());
        if instances.is_empty() {
            break;
        }

        for instance in instances {
            let root = generic_root_of(graph, instance);
            let root_scope = graph.symbol(root).get_scope();
            let monos = graph
                .scope(root_scope)
                .instantiator
                .root_to_monos
                .get(&root)
                .cloned()
                .unwrap_or_default();
            if monos.is_empty() {
                continue;
            }

            let span = graph.symbol(instance).get_name().get_span();
            let ctx = body_context(graph, root, instance);

            for mono in monos {
                let mono_root = generic_root_of(graph, mono);
                let mono_args: Vec<SymbolId> = graph
                    .symbol(graph.unaliased(mono))
                    .get_type_args()
                    .to_vec()
                    .iter()
                    .map(|&arg| {
                        substitution::substitute_type(
                            graph,
                            natives,
                            interner,
                            arg,
                            &ctx,
                            span,
                            &mut diagnostics,
                        )
                    })
                    .collect();

                diagnostics.collect(instantiate_or_get(
                    graph, natives, interner, span, mono_root, mono_args,
                ));
            }
        }
    }

    Diagnosed::new((), diagnostics)
}

/// Where an instance was first requested, for diagnostics that point back
/// at the instantiation site.
pub fn instance_span(graph: &SymbolGraph, instance: SymbolId) -> Option<Span> {
    let scope = graph.symbol(instance).get_scope();
    graph
        .scope(scope)
        .instantiator
        .instance_spans
        .get(&instance)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccessModifier;
    use crate::compilation::Compilation;
    use crate::scope::ScopeKind;
    use crate::symbols::{FieldVarSymbol, StructSymbol, TypeParamSymbol};
    use crate::test_support::{declare_struct, sp};
    use shared_context::Bump;

    /// `struct Wrapper[T] { value: T }`
    fn declare_wrapper(comp: &mut Compilation<'_>) -> SymbolId {
        let global = comp.graph.global_scope();
        let ident = comp.intern_ident("Wrapper", sp(0));
        let body = comp
            .graph
            .create_scope(global, ScopeKind::TypeBody, Some(ident.get_name()));

        let t_ident = comp.intern_ident("T", sp(1));
        let type_param = comp
            .graph
            .declare_symbol_unchecked(Symbol::TypeParam(TypeParamSymbol {
                scope: body,
                name: t_ident,
                index: 0,
            }));
        let value_ident = comp.intern_ident("value", sp(2));
        comp.graph
            .declare_symbol_unchecked(Symbol::Field(FieldVarSymbol {
                scope: body,
                name: value_ident,
                access: AccessModifier::Public,
                var_type: type_param,
                index: 0,
            }));

        comp.graph.declare_symbol_unchecked(Symbol::Struct({
            let mut data = StructSymbol::new(
                global,
                body,
                ident,
                AccessModifier::Public,
                vec![type_param],
                vec![type_param],
            );
            data.generic_root = None;
            data
        }))
    }

    #[test]
    fn instantiation_is_idempotent() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let wrapper = declare_wrapper(&mut comp);
        let int32 = comp.natives.int32;

        comp.finish_body_deferment();

        let (first, bag) = comp.instantiate(sp(5), wrapper, vec![int32]).into_parts();
        assert!(bag.is_empty(), "{bag:?}");
        let (second, bag) = comp.instantiate(sp(9), wrapper, vec![int32]).into_parts();
        assert!(bag.is_empty());
        assert_eq!(first, second);
        assert_eq!(comp.partial_signature(first), "Wrapper[Int32]");

        // the instance body was elaborated with the substitution applied
        let fields = comp.struct_fields(first);
        assert_eq!(fields.len(), 1);
        let field_type = comp.graph.symbol(fields[0]).get_var_type().unwrap();
        assert_eq!(comp.graph.unaliased(field_type), int32);

        assert_eq!(generic_root_of(&comp.graph, first), wrapper);
        assert!(is_instance(&comp.graph, first));
    }

    #[test]
    fn unsized_type_arguments_are_rejected_except_for_pointers() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let wrapper = declare_wrapper(&mut comp);
        let global = comp.graph.global_scope();

        // a struct containing itself by value can never be sized
        let unsized_struct = declare_struct(&mut comp, global, "Gnarl", AccessModifier::Public, &[]);
        let body = comp.graph.symbol(unsized_struct).get_body_scope().unwrap();
        let ident = comp.intern_ident("again", sp(3));
        comp.graph
            .declare_symbol_unchecked(Symbol::Field(FieldVarSymbol {
                scope: body,
                name: ident,
                access: AccessModifier::Public,
                var_type: unsized_struct,
                index: 0,
            }));

        comp.finish_body_deferment();

        let (resolved, bag) = comp
            .instantiate(sp(7), wrapper, vec![unsized_struct])
            .into_parts();
        assert_eq!(resolved, comp.error_type());
        assert!(
            bag.iter().any(|d| d.get_message().contains("unsized type argument")),
            "{bag:?}"
        );

        // the reference root is on the whitelist and wraps anything
        let ref_root = comp.natives.ref_root;
        let (reference, bag) = comp
            .instantiate(sp(8), ref_root, vec![unsized_struct])
            .into_parts();
        assert_ne!(reference, comp.error_type());
        assert!(!bag.has_errors(), "{bag:?}");
    }

    #[test]
    fn placeholder_instances_are_tracked_but_not_elaborated() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let wrapper = declare_wrapper(&mut comp);
        let global = comp.graph.global_scope();

        // a second generic whose body mentions Wrapper[U]
        let u_body = comp.graph.create_scope(global, ScopeKind::TypeBody, None);
        let u_ident = comp.intern_ident("U", sp(4));
        let u_param = comp
            .graph
            .declare_symbol_unchecked(Symbol::TypeParam(TypeParamSymbol {
                scope: u_body,
                name: u_ident,
                index: 0,
            }));

        comp.finish_body_deferment();

        let (placeholder, bag) = comp.instantiate(sp(6), wrapper, vec![u_param]).into_parts();
        assert!(!bag.has_errors(), "{bag:?}");
        assert!(is_placeholder_symbol(&comp.graph, placeholder));
        assert!(is_instance(&comp.graph, placeholder));
        // no field clone happened: the body stays empty
        assert!(comp.struct_fields(placeholder).is_empty());
    }
}
