// Trait-impl validation: every prototype of the implemented trait must be
// matched by a function with the same signature, nothing extraneous may
// claim membership, and supertraits must themselves be implemented for
// the target type.

use shared_context::diagnostics::{Diagnosed, Diagnostic, DiagnosticBag, DiagnosticNote};
use std::collections::HashSet;
use symbol_graph::symbols::{Symbol, same_types};
use symbol_graph::{Compilation, SymbolId, instantiator};
use tracing::debug;

pub fn validate_trait_impls(comp: &mut Compilation<'_>) -> Diagnosed<()> {
    let mut diagnostics = DiagnosticBag::new();

    let impls = comp
        .graph
        .collect_symbols_recursive(comp.graph.global_scope(), |s| {
            matches!(s, Symbol::TraitImpl(_))
        });

    for impl_id in impls {
        validate_impl(comp, impl_id, &mut diagnostics);
    }

    Diagnosed::new((), diagnostics)
}

fn validate_impl(comp: &mut Compilation<'_>, impl_id: SymbolId, diagnostics: &mut DiagnosticBag) {
    let (trait_id, target, impl_body, impl_span) = match comp.graph.symbol(impl_id) {
        Symbol::TraitImpl(data) => (
            data.implemented_trait,
            data.target_type,
            data.body_scope,
            data.name.get_span(),
        ),
        _ => return,
    };

    let trait_id = comp.graph.unaliased(trait_id);
    if comp.is_error_type(trait_id) || comp.is_error_type(target) {
        return;
    }
    let Symbol::Trait(trait_data) = comp.graph.symbol(trait_id) else {
        return;
    };
    let trait_body = trait_data.body_scope;

    debug!(
        impl_ = %comp.symbol_signature(impl_id),
        "validating trait impl"
    );

    // Supertraits must hold for the implementing type.
    let supertraits = comp
        .graph
        .collect_symbols(trait_body, |s| matches!(s, Symbol::Supertrait(_)));
    for supertrait in supertraits {
        let (required, declared_at) = match comp.graph.symbol(supertrait) {
            Symbol::Supertrait(data) => (data.supertrait, data.name.get_span()),
            _ => continue,
        };
        if !comp.is_trait_implemented(target, required) {
            diagnostics.add(
                Diagnostic::error(
                    impl_span,
                    format!(
                        "{} does not implement the supertrait {}",
                        comp.symbol_phrase(target),
                        comp.symbol_phrase(required),
                    ),
                )
                .with_note(DiagnosticNote::new(
                    "supertrait required here",
                    Some(declared_at),
                )),
            );
        }
    }

    // Every prototype needs exactly one matching function in the impl.
    let prototypes = comp
        .graph
        .collect_symbols(trait_body, |s| matches!(s, Symbol::Prototype(_)));
    let mut member_names: HashSet<shared_context::interner::NameId> = HashSet::new();

    for proto in prototypes {
        let proto_name = comp.graph.symbol(proto).get_name();
        member_names.insert(proto_name.get_name());

        let expected = instantiator::instantiate_prototype(
            &mut comp.graph,
            &comp.natives,
            &comp.interner,
            impl_span,
            proto,
            target,
        );
        let expected_params = param_types(comp, expected);
        let expected_return = comp
            .graph
            .symbol(expected)
            .callable_return_type()
            .unwrap_or_else(|| comp.error_type());

        let candidates: Vec<SymbolId> = comp
            .graph
            .scope(impl_body)
            .get_symbols_named(proto_name.get_name())
            .iter()
            .copied()
            .filter(|&s| matches!(comp.graph.symbol(s), Symbol::Function(_)))
            .collect();

        if candidates.is_empty() {
            diagnostics.add(
                Diagnostic::error(
                    impl_span,
                    format!(
                        "missing an implementation of {}",
                        comp.symbol_phrase(proto)
                    ),
                )
                .with_note(DiagnosticNote::new(
                    "declared by the trait here",
                    Some(proto_name.get_span()),
                )),
            );
            continue;
        }

        let matched = candidates.iter().copied().any(|candidate| {
            let candidate_params = param_types(comp, candidate);
            let candidate_return = comp
                .graph
                .symbol(candidate)
                .callable_return_type()
                .unwrap_or_else(|| comp.error_type());
            same_types(&candidate_params, &expected_params, &comp.graph)
                && comp.graph.unaliased(candidate_return) == comp.graph.unaliased(expected_return)
        });

        if !matched {
            diagnostics.add(
                Diagnostic::error(
                    comp.graph.symbol(candidates[0]).get_name().get_span(),
                    format!(
                        "signature does not match {}",
                        comp.symbol_phrase(proto)
                    ),
                )
                .with_note(DiagnosticNote::new(
                    "declared by the trait here",
                    Some(proto_name.get_span()),
                )),
            );
        }
    }

    // Functions the trait never declared do not belong in a trait impl.
    let impl_functions = comp
        .graph
        .collect_symbols(impl_body, |s| matches!(s, Symbol::Function(_)));
    for function in impl_functions {
        let name = comp.graph.symbol(function).get_name();
        let text = comp.interner.lookup(name.get_name());
        if text.starts_with('$') || member_names.contains(&name.get_name()) {
            continue;
        }
        diagnostics.add(
            Diagnostic::error(
                name.get_span(),
                format!(
                    "{} is not a member of {}",
                    comp.symbol_phrase(function),
                    comp.symbol_phrase(trait_id),
                ),
            )
            .with_note(DiagnosticNote::new(
                "the implemented trait is declared here",
                Some(comp.graph.symbol(trait_id).get_name().get_span()),
            )),
        );
    }

    // An impl whose module can see neither the trait nor the target being
    // declared is an orphan.
    let impl_module = comp.graph.enclosing_module_scope(
        comp.graph.symbol(impl_id).get_scope(),
    );
    let trait_home = comp.graph.symbol(trait_id).get_scope();
    let target_home = comp.graph.symbol(comp.graph.unaliased(target)).get_scope();
    if !comp.graph.is_within(trait_home, impl_module) && !comp.graph.is_within(target_home, impl_module)
    {
        diagnostics.add(Diagnostic::error(
            impl_span,
            "orphan impl: neither the trait nor the type is declared in this module",
        ));
    }
}

fn param_types(comp: &Compilation<'_>, callable: SymbolId) -> Vec<SymbolId> {
    comp.graph
        .symbol(comp.graph.unaliased(callable))
        .callable_params()
        .unwrap_or(&[])
        .iter()
        .map(|&p| {
            comp.graph
                .symbol(p)
                .get_var_type()
                .expect("param has a type")
        })
        .collect()
}
