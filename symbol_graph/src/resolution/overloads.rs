use crate::compilation::Compilation;
use crate::conversions::{self, ConversionCost, ConversionMode};
use crate::scope::SymbolGraph;
use crate::symbols::Symbol;
use crate::{SymbolId, TypeInfo, instantiator};
use shared_context::Span;
use shared_context::diagnostics::{Diagnostic, DiagnosticBag, DiagnosticNote};
use std::collections::HashMap;

/// Picks the callable a call site means.
///
/// Candidates with the wrong arity are dropped; for the rest, every
/// argument must convert implicitly to the matching parameter. Candidates
/// are ranked exact > widening > user conversion (summed over arguments);
/// a unique minimum wins, a shared minimum is an ambiguity, and an empty
/// field is a no-match. Generic roots participate through type-argument
/// deduction and the winner is instantiated.
///
/// The result is deterministic: same candidates and argument types, same
/// winner.
pub fn resolve_overload(
    comp: &mut Compilation<'_>,
    span: Span,
    candidates: &[SymbolId],
    arg_types: &[TypeInfo],
    diagnostics: &mut DiagnosticBag,
) -> SymbolId {
    let callables: Vec<SymbolId> = candidates
        .iter()
        .copied()
        .filter(|&c| comp.graph.symbol(comp.graph.unaliased(c)).is_callable())
        .collect();

    // Generic instances are shadowed by their root: the root deduces and
    // the instantiator hands back the existing instance, so letting both
    // compete would fake an ambiguity.
    let callables: Vec<SymbolId> = callables
        .iter()
        .copied()
        .filter(|&c| {
            match comp
                .graph
                .symbol(comp.graph.unaliased(c))
                .get_generic_root_hint()
            {
                Some(root) => !callables
                    .iter()
                    .any(|&other| comp.graph.unaliased(other) == root),
                None => true,
            }
        })
        .collect();

    if callables.is_empty() {
        diagnostics.add(Diagnostic::error(span, "this name is not callable"));
        return comp.natives.error_function;
    }

    let mut scored: Vec<(SymbolId, u32, Option<Vec<SymbolId>>)> = Vec::new();

    for candidate in callables {
        let unaliased = comp.graph.unaliased(candidate);
        let params = comp.graph.symbol(unaliased).callable_params().unwrap_or(&[]);
        if params.len() != arg_types.len() {
            continue;
        }

        let param_types: Vec<SymbolId> = params
            .iter()
            .map(|&p| {
                comp.graph
                    .symbol(p)
                    .get_var_type()
                    .expect("param has a type")
            })
            .collect();

        // Only generic functions deduce and instantiate here; prototypes
        // are generic over the self type and dispatch as they are.
        let is_generic_root = matches!(comp.graph.symbol(unaliased), Symbol::Function(_))
            && comp.graph.symbol(unaliased).is_generic()
            && comp.graph.symbol(unaliased).get_generic_root_hint().is_none();

        if is_generic_root {
            // Generic candidates match by unification: each parameter type
            // must deduce against the argument, and every type parameter
            // must come out bound.
            let type_params = comp.graph.symbol(unaliased).get_type_params().to_vec();
            let mut bindings: HashMap<SymbolId, SymbolId> = HashMap::new();
            let deduced = param_types.iter().zip(arg_types).all(|(&param, arg)| {
                deduce(
                    &comp.graph,
                    &comp.natives,
                    param,
                    arg.symbol,
                    &type_params,
                    &mut bindings,
                )
            });
            if !deduced {
                continue;
            }
            let Some(args) = type_params
                .iter()
                .map(|p| bindings.get(&comp.graph.unaliased(*p)).copied())
                .collect::<Option<Vec<SymbolId>>>()
            else {
                continue;
            };
            scored.push((candidate, 0, Some(args)));
            continue;
        }

        let mut total = 0u32;
        let mut convertible = true;
        for (&param, &arg) in param_types.iter().zip(arg_types) {
            let target = TypeInfo::rvalue(param);
            match conversions::find_conversion(
                &comp.graph,
                &comp.natives,
                &comp.interner,
                arg,
                target,
                ConversionMode::Implicit,
            ) {
                Ok(plan) => {
                    total += match plan.cost {
                        ConversionCost::Exact => 0,
                        ConversionCost::Widening => 1,
                        ConversionCost::User => 2,
                    };
                }
                Err(_) => {
                    convertible = false;
                    break;
                }
            }
        }
        if convertible {
            scored.push((candidate, total, None));
        }
    }

    let Some(&(_, best, _)) = scored.iter().min_by_key(|(_, score, _)| *score) else {
        diagnostics.add(Diagnostic::error(
            span,
            "no overload matches these argument types",
        ));
        return comp.natives.error_function;
    };

    let winners: Vec<&(SymbolId, u32, Option<Vec<SymbolId>>)> =
        scored.iter().filter(|(_, score, _)| *score == best).collect();

    if winners.len() > 1 {
        let mut diagnostic =
            Diagnostic::error(span, format!("ambiguous call: {} candidates match", winners.len()));
        for (candidate, _, _) in winners.iter().map(|w| *w) {
            diagnostic = diagnostic.with_note(DiagnosticNote::new(
                format!("candidate: {}", comp.symbol_signature(*candidate)),
                Some(
                    comp.graph
                        .symbol(comp.graph.unaliased(*candidate))
                        .get_name()
                        .get_span(),
                ),
            ));
        }
        diagnostics.add(diagnostic);
        return comp.natives.error_function;
    }

    let (winner, _, deduced_args) = (*winners[0]).clone();
    match deduced_args {
        Some(args) => diagnostics.collect(comp.instantiate(span, winner, args)),
        None => winner,
    }
}

/// Unifies a parameter type against an argument type, binding the root's
/// type parameters. References on the argument side are stripped so that
/// `fn f[T](x: T)` accepts a `&T` argument through the usual deref.
pub fn deduce(
    graph: &SymbolGraph,
    natives: &crate::natives::Natives,
    param_type: SymbolId,
    arg_type: SymbolId,
    type_params: &[SymbolId],
    bindings: &mut HashMap<SymbolId, SymbolId>,
) -> bool {
    let param = graph.unaliased(param_type);
    let arg = graph.unaliased(arg_type);

    if type_params.iter().any(|&p| graph.unaliased(p) == param) {
        return match bindings.get(&param) {
            Some(&bound) => graph.unaliased(bound) == arg,
            None => {
                bindings.insert(param, arg);
                true
            }
        };
    }

    if param == arg {
        return true;
    }

    let param_args = graph.symbol(param).get_type_args();
    let arg_args = graph.symbol(arg).get_type_args();
    if !param_args.is_empty()
        && instantiator::generic_root_of(graph, param) == instantiator::generic_root_of(graph, arg)
        && param_args.len() == arg_args.len()
    {
        let param_args = param_args.to_vec();
        let arg_args = arg_args.to_vec();
        return param_args
            .iter()
            .zip(&arg_args)
            .all(|(&p, &a)| deduce(graph, natives, p, a, type_params, bindings));
    }

    // One implicit deref on the argument side.
    let is_ref = graph.symbol(arg).get_generic_root_hint() == Some(natives.ref_root);
    if is_ref {
        if let Some(&pointee) = graph.symbol(arg).get_type_args().first() {
            return deduce(graph, natives, param, pointee, type_params, bindings);
        }
    }

    false
}
