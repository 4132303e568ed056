use crate::compilation::Compilation;
use crate::scope::SymbolGraph;
use crate::symbols::Symbol;
use crate::{ScopeId, SymbolId, TypeInfo, instantiator, resolution};
use shared_context::diagnostics::{Diagnosed, Diagnostic, DiagnosticBag};
use syntax::NameSection;

/// Resolves `value.member` against the type of `value`.
///
/// The self type is dereferenced first, then the member is searched on the
/// type's own body (fields, native members), the inherent impl bodies, the
/// trait impl bodies, and finally supertrait impls. Inherent members
/// always win over trait members; a tie between two trait members is an
/// ambiguity at the call site.
pub fn resolve_instance_symbol(
    comp: &mut Compilation<'_>,
    from_scope: ScopeId,
    self_type: SymbolId,
    section: &NameSection,
    arg_types: Option<&[TypeInfo]>,
) -> Diagnosed<SymbolId> {
    let mut diagnostics = DiagnosticBag::new();
    let span = section.get_ident().get_span();
    let name = section.get_ident().get_name();

    let ty = comp.deref_for_access(self_type);

    if comp.is_error_type(ty) {
        // The base already failed; stay silent.
        let fallback = match arg_types {
            Some(_) => comp.natives.error_function,
            None => comp.error_type(),
        };
        return Diagnosed::new(fallback, diagnostics);
    }

    // Dyn dispatch: members of a trait object are the trait's prototypes.
    if matches!(comp.graph.symbol(ty), Symbol::Trait(_)) {
        let symbol = resolve_dyn_member(comp, ty, section, arg_types, &mut diagnostics);
        return Diagnosed::new(symbol, diagnostics);
    }

    // A constrained type parameter exposes the prototypes of the traits
    // its constraints promise.
    if matches!(comp.graph.symbol(ty), Symbol::TypeParam(_)) {
        let symbol = resolve_constrained_member(comp, ty, section, arg_types, &mut diagnostics);
        return Diagnosed::new(symbol, diagnostics);
    }

    let body = match comp.graph.symbol(ty).get_body_scope() {
        Some(body) => body,
        None => {
            diagnostics.add(Diagnostic::error(
                span,
                format!("{} has no members", comp.symbol_phrase(ty)),
            ));
            return Diagnosed::new(comp.error_type(), diagnostics);
        }
    };

    // Fields shadow everything when the member is not being called.
    if arg_types.is_none() {
        if let Some(&field) = comp
            .graph
            .scope(body)
            .get_symbols_named(name)
            .iter()
            .find(|&&s| matches!(comp.graph.symbol(s), Symbol::Field(_)))
        {
            resolution::check_access(comp, from_scope, field, span, &mut diagnostics);
            return Diagnosed::new(field, diagnostics);
        }
    }

    // Inherent members: the type's own body scope (native operators live
    // there) and inherent impl bodies.
    let mut inherent: Vec<SymbolId> = callable_members(&comp.graph, body, name);
    for &assoc in comp.graph.scope(body).get_associations() {
        if owner_is_inherent_impl(&comp.graph, assoc) {
            inherent.extend(callable_members(&comp.graph, assoc, name));
        }
    }

    let candidates = if !inherent.is_empty() {
        inherent
    } else {
        // Trait impl members, then one supertrait level.
        let mut from_traits: Vec<SymbolId> = Vec::new();
        for &assoc in comp.graph.scope(body).get_associations().to_vec().iter() {
            if owner_is_trait_impl(&comp.graph, assoc) {
                from_traits.extend(callable_members(&comp.graph, assoc, name));
            }
        }
        if from_traits.is_empty() {
            from_traits = supertrait_members(comp, ty, name);
        }
        from_traits
    };

    if candidates.is_empty() {
        diagnostics.add(Diagnostic::error(
            span,
            format!(
                "`{}` is not a member of {}",
                comp.interner.lookup(name),
                comp.symbol_phrase(ty)
            ),
        ));
        let fallback = match arg_types {
            Some(_) => comp.natives.error_function,
            None => comp.error_type(),
        };
        return Diagnosed::new(fallback, diagnostics);
    }

    let candidates = if section.get_type_args().is_empty() {
        candidates
    } else {
        vec![resolution::apply_type_args(
            comp,
            from_scope,
            &candidates,
            section,
            span,
            &mut diagnostics,
        )]
    };

    let winner = match arg_types {
        Some(arg_types) => {
            resolution::resolve_overload(comp, span, &candidates, arg_types, &mut diagnostics)
        }
        None => match resolution::reduce_to_single(comp, &candidates) {
            Some(winner) => winner,
            None => {
                diagnostics.add(resolution::ambiguous(comp, span, &candidates));
                return Diagnosed::new(comp.error_type(), diagnostics);
            }
        },
    };

    resolution::check_access(comp, from_scope, winner, span, &mut diagnostics);
    Diagnosed::new(winner, diagnostics)
}

/// A prototype is dyn-dispatchable unless its signature (outside the self
/// parameter) involves the trait self type; such methods have no stable
/// vtable slot type.
pub fn is_dyn_dispatchable(graph: &SymbolGraph, proto: SymbolId) -> bool {
    let Symbol::Prototype(data) = graph.symbol(graph.unaliased(proto)) else {
        return false;
    };
    let needle = graph.unaliased(data.self_type);

    if mentions_type(graph, data.return_type, needle) {
        return false;
    }
    for &param in &data.params {
        let Some(param_type) = graph.symbol(param).get_var_type() else {
            continue;
        };
        if mentions_type(graph, param_type, needle) {
            return false;
        }
    }
    true
}

fn mentions_type(graph: &SymbolGraph, ty: SymbolId, needle: SymbolId) -> bool {
    let ty = graph.unaliased(ty);
    if ty == needle {
        return true;
    }
    graph
        .symbol(ty)
        .get_type_args()
        .iter()
        .any(|&arg| mentions_type(graph, arg, needle))
}

fn resolve_dyn_member(
    comp: &mut Compilation<'_>,
    trait_ty: SymbolId,
    section: &NameSection,
    arg_types: Option<&[TypeInfo]>,
    diagnostics: &mut DiagnosticBag,
) -> SymbolId {
    let span = section.get_ident().get_span();
    let name = section.get_ident().get_name();
    let body = comp
        .graph
        .symbol(trait_ty)
        .get_body_scope()
        .expect("trait has a body scope");

    let prototypes: Vec<SymbolId> = comp
        .graph
        .scope(body)
        .get_symbols_named(name)
        .iter()
        .copied()
        .filter(|&s| matches!(comp.graph.symbol(s), Symbol::Prototype(_)))
        .collect();

    if prototypes.is_empty() {
        diagnostics.add(Diagnostic::error(
            span,
            format!(
                "`{}` is not a method of {}",
                comp.interner.lookup(name),
                comp.symbol_phrase(trait_ty)
            ),
        ));
        return comp.natives.error_function;
    }

    let winner = match arg_types {
        Some(arg_types) => {
            resolution::resolve_overload(comp, span, &prototypes, arg_types, diagnostics)
        }
        None => prototypes[0],
    };

    if !is_dyn_dispatchable(&comp.graph, winner) {
        diagnostics.add(Diagnostic::error(
            span,
            format!(
                "{} mentions the trait self type and cannot be called through a dyn reference",
                comp.symbol_phrase(winner)
            ),
        ));
    }
    winner
}

fn resolve_constrained_member(
    comp: &mut Compilation<'_>,
    param_ty: SymbolId,
    section: &NameSection,
    arg_types: Option<&[TypeInfo]>,
    diagnostics: &mut DiagnosticBag,
) -> SymbolId {
    let span = section.get_ident().get_span();
    let name = section.get_ident().get_name();

    let scope = comp.graph.symbol(param_ty).get_scope();
    let constraints = comp
        .graph
        .collect_symbols(scope, |s| matches!(s, Symbol::Constraint(_)));

    let mut candidates: Vec<SymbolId> = Vec::new();
    for constraint in constraints {
        let (constrained, traits) = match comp.graph.symbol(constraint) {
            Symbol::Constraint(c) => (c.type_param, c.traits.clone()),
            _ => continue,
        };
        if comp.graph.unaliased(constrained) != param_ty {
            continue;
        }
        for trait_id in traits {
            let Some(trait_body) = comp
                .graph
                .symbol(comp.graph.unaliased(trait_id))
                .get_body_scope()
            else {
                continue;
            };
            let protos: Vec<SymbolId> = comp
                .graph
                .scope(trait_body)
                .get_symbols_named(name)
                .iter()
                .copied()
                .filter(|&s| matches!(comp.graph.symbol(s), Symbol::Prototype(_)))
                .collect();
            for proto in protos {
                // The candidate is the prototype viewed with Self bound to
                // the constrained parameter, a placeholder instance.
                let instance = instantiator::instantiate_prototype(
                    &mut comp.graph,
                    &comp.natives,
                    &comp.interner,
                    span,
                    proto,
                    param_ty,
                );
                candidates.push(instance);
            }
        }
    }

    if candidates.is_empty() {
        diagnostics.add(Diagnostic::error(
            span,
            format!(
                "`{}` is not provided by the constraints on {}",
                comp.interner.lookup(name),
                comp.symbol_phrase(param_ty)
            ),
        ));
        return comp.natives.error_function;
    }

    match arg_types {
        Some(arg_types) => {
            resolution::resolve_overload(comp, span, &candidates, arg_types, diagnostics)
        }
        None => candidates[0],
    }
}

fn callable_members(graph: &SymbolGraph, scope: ScopeId, name: shared_context::interner::NameId) -> Vec<SymbolId> {
    graph
        .scope(scope)
        .get_symbols_named(name)
        .iter()
        .copied()
        .filter(|&s| graph.symbol(s).is_callable())
        .collect()
}

fn owner_is_inherent_impl(graph: &SymbolGraph, scope: ScopeId) -> bool {
    matches!(
        graph.scope(scope).get_owner().map(|o| graph.symbol(o)),
        Some(Symbol::InherentImpl(_))
    )
}

fn owner_is_trait_impl(graph: &SymbolGraph, scope: ScopeId) -> bool {
    matches!(
        graph.scope(scope).get_owner().map(|o| graph.symbol(o)),
        Some(Symbol::TraitImpl(_))
    )
}

/// Members found through supertraits of the traits implemented for `ty`:
/// if `impl Ord for T` exists and `Ord: Eq`, then `Eq`'s impl members are
/// reachable on `T` values.
fn supertrait_members(
    comp: &Compilation<'_>,
    ty: SymbolId,
    name: shared_context::interner::NameId,
) -> Vec<SymbolId> {
    let Some(body) = comp.graph.symbol(ty).get_body_scope() else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for &assoc in comp.graph.scope(body).get_associations() {
        let Some(owner) = comp.graph.scope(assoc).get_owner() else {
            continue;
        };
        let Symbol::TraitImpl(impl_data) = comp.graph.symbol(owner) else {
            continue;
        };
        let trait_id = comp.graph.unaliased(impl_data.implemented_trait);
        let Some(trait_body) = comp.graph.symbol(trait_id).get_body_scope() else {
            continue;
        };

        let supertraits = comp
            .graph
            .collect_symbols(trait_body, |s| matches!(s, Symbol::Supertrait(_)));
        for supertrait in supertraits {
            let Symbol::Supertrait(data) = comp.graph.symbol(supertrait) else {
                continue;
            };
            if let Some(super_impl) = comp.trait_impl_for(ty, data.supertrait) {
                if let Some(super_body) = comp.graph.symbol(super_impl).get_body_scope() {
                    found.extend(callable_members(&comp.graph, super_body, name));
                }
            }
        }
    }
    found
}
