// Name resolution: qualified names to symbols, member names to symbols on
// a self type, and overload selection among callable candidates.

use crate::compilation::Compilation;
use crate::scope::SymbolGraph;
use crate::symbols::Symbol;
use crate::{ScopeId, SymbolId, TypeInfo, instantiator};
use shared_context::Span;
use shared_context::diagnostics::{Diagnosed, Diagnostic, DiagnosticBag, DiagnosticNote};
use shared_context::interner::NameId;
use syntax::{NameRoot, NameSection, QualifiedName};
use tracing::trace;

pub mod instance;
pub mod overloads;

pub use instance::{is_dyn_dispatchable, resolve_instance_symbol};
pub use overloads::resolve_overload;

/// Resolves a qualified name section by section from its resolution root.
/// Intermediate sections must name something with a body scope; sections
/// with type arguments materialize generic instances; the final section is
/// overload-resolved when argument types are supplied.
///
/// Resolution never gives up: failures are reported into the bag and the
/// error type stands in for the missing symbol.
pub fn resolve_static_symbol(
    comp: &mut Compilation<'_>,
    from_scope: ScopeId,
    name: &QualifiedName,
    arg_types: Option<&[TypeInfo]>,
) -> Diagnosed<SymbolId> {
    let mut diagnostics = DiagnosticBag::new();
    let sections = name.get_sections();

    let mut current = first_section_candidates(&comp.graph, from_scope, sections[0].get_ident().get_name(), name.get_root());

    if current.is_empty() {
        diagnostics.add(not_found(comp, sections[0].get_ident().get_span(), &sections[0], None));
        return Diagnosed::new(comp.error_type(), diagnostics);
    }

    for (index, section) in sections.iter().enumerate() {
        let span = section.get_ident().get_span();

        if index > 0 {
            // Descend through the single symbol the previous sections
            // named.
            let parent = match reduce_to_parent(comp, &current, span, &mut diagnostics) {
                Some(parent) => parent,
                None => return Diagnosed::new(comp.error_type(), diagnostics),
            };
            let Some(body) = comp.graph.symbol(comp.graph.unaliased(parent)).get_body_scope() else {
                diagnostics.add(Diagnostic::error(
                    span,
                    format!("{} has no members", comp.symbol_phrase(parent)),
                ));
                return Diagnosed::new(comp.error_type(), diagnostics);
            };
            current = lookup_with_associations(&comp.graph, body, section.get_ident().get_name());
            if current.is_empty() {
                diagnostics.add(not_found(comp, span, section, Some(parent)));
                return Diagnosed::new(comp.error_type(), diagnostics);
            }
        }

        if !section.get_type_args().is_empty() {
            let instance =
                apply_type_args(comp, from_scope, &current, section, span, &mut diagnostics);
            current = vec![instance];
        }
    }

    let span = name.last_section().get_ident().get_span();
    let winner = if let Some(arg_types) = arg_types {
        overloads::resolve_overload(comp, span, &current, arg_types, &mut diagnostics)
    } else {
        match reduce_to_single(comp, &current) {
            Some(winner) => winner,
            None => {
                diagnostics.add(ambiguous(comp, span, &current));
                return Diagnosed::new(comp.error_type(), diagnostics);
            }
        }
    };

    check_access(comp, from_scope, winner, span, &mut diagnostics);

    trace!(
        name = %comp.fully_qualified_name(winner),
        "resolved static symbol"
    );
    Diagnosed::new(winner, diagnostics)
}

/// Resolves a name that must denote a type. Anything else is diagnosed and
/// replaced by the error type.
pub fn resolve_type(
    comp: &mut Compilation<'_>,
    from_scope: ScopeId,
    name: &QualifiedName,
) -> Diagnosed<SymbolId> {
    let mut diagnostics = DiagnosticBag::new();
    let symbol = diagnostics.collect(resolve_static_symbol(comp, from_scope, name, None));

    if comp.graph.symbol(comp.graph.unaliased(symbol)).is_type() {
        Diagnosed::new(symbol, diagnostics)
    } else {
        diagnostics.add(Diagnostic::error(
            name.get_span(),
            format!("{} is not a type", comp.symbol_phrase(symbol)),
        ));
        Diagnosed::new(comp.error_type(), diagnostics)
    }
}

/// Accessibility is checked at use sites only: a private symbol is
/// reachable exactly from inside the module subtree that declares it.
pub fn is_accessible(graph: &SymbolGraph, from_scope: ScopeId, symbol: SymbolId) -> bool {
    match graph.symbol(graph.unaliased(symbol)).get_access() {
        crate::AccessModifier::Public => true,
        crate::AccessModifier::Private => {
            let home = crate::compilation::declaring_module_scope(graph, graph.unaliased(symbol));
            graph.is_within(from_scope, home)
        }
    }
}

pub(crate) fn check_access(
    comp: &Compilation<'_>,
    from_scope: ScopeId,
    symbol: SymbolId,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) {
    if !is_accessible(&comp.graph, from_scope, symbol) {
        diagnostics.add(
            Diagnostic::error(
                span,
                format!("private {} is not accessible here", comp.symbol_phrase(symbol)),
            )
            .with_note(DiagnosticNote::new(
                "declared here",
                Some(comp.graph.symbol(comp.graph.unaliased(symbol)).get_name().get_span()),
            )),
        );
    }
}

/// Candidates for the first name section: the global scope for
/// globally-rooted names, otherwise the nearest enclosing scope (or
/// association of one) where the name means anything.
fn first_section_candidates(
    graph: &SymbolGraph,
    from_scope: ScopeId,
    name: NameId,
    root: NameRoot,
) -> Vec<SymbolId> {
    match root {
        NameRoot::Global => lookup_with_associations(graph, graph.global_scope(), name),
        NameRoot::Local => {
            for scope in graph.scope_chain(from_scope) {
                let found = lookup_with_associations(graph, scope, name);
                if !found.is_empty() {
                    return found;
                }
            }
            Vec::new()
        }
    }
}

/// A scope's own symbols under `name`, then those of its associated peer
/// scopes.
fn lookup_with_associations(graph: &SymbolGraph, scope: ScopeId, name: NameId) -> Vec<SymbolId> {
    let mut found: Vec<SymbolId> = graph.scope(scope).get_symbols_named(name).to_vec();
    for &assoc in graph.scope(scope).get_associations() {
        found.extend_from_slice(graph.scope(assoc).get_symbols_named(name));
    }
    found
}

/// Materializes the instance a `Name[Args]` section denotes.
pub(crate) fn apply_type_args(
    comp: &mut Compilation<'_>,
    from_scope: ScopeId,
    candidates: &[SymbolId],
    section: &NameSection,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> SymbolId {
    let mut args = Vec::with_capacity(section.get_type_args().len());
    for arg_name in section.get_type_args() {
        args.push(diagnostics.collect(resolve_type(comp, from_scope, arg_name)));
    }

    let root = candidates.iter().copied().find(|&c| {
        let u = comp.graph.unaliased(c);
        comp.graph.symbol(u).is_generic() && comp.graph.symbol(u).get_generic_root_hint().is_none()
    });

    match root {
        Some(root) => diagnostics.collect(comp.instantiate(span, root, args)),
        None => {
            diagnostics.add(Diagnostic::error(
                span,
                "type arguments applied to a non-generic name",
            ));
            comp.error_type()
        }
    }
}

/// For intermediate sections: the candidate set must shrink to the one
/// symbol resolution descends into.
fn reduce_to_parent(
    comp: &Compilation<'_>,
    candidates: &[SymbolId],
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> Option<SymbolId> {
    match reduce_to_single(comp, candidates) {
        Some(single) => Some(single),
        None => {
            diagnostics.add(ambiguous(comp, span, candidates));
            None
        }
    }
}

/// Collapses a candidate set when no argument types drive the choice.
/// Generic instances are shadowed by their root; a lone survivor wins.
pub(crate) fn reduce_to_single(comp: &Compilation<'_>, candidates: &[SymbolId]) -> Option<SymbolId> {
    if candidates.len() == 1 {
        return Some(candidates[0]);
    }
    let non_instances: Vec<SymbolId> = candidates
        .iter()
        .copied()
        .filter(|&c| {
            comp.graph
                .symbol(comp.graph.unaliased(c))
                .get_generic_root_hint()
                .is_none()
        })
        .collect();
    if non_instances.len() == 1 {
        return Some(non_instances[0]);
    }
    None
}

pub(crate) fn ambiguous(comp: &Compilation<'_>, span: Span, candidates: &[SymbolId]) -> Diagnostic {
    let mut diagnostic = Diagnostic::error(
        span,
        format!("ambiguous name: {} candidates match", candidates.len()),
    );
    for &candidate in candidates {
        diagnostic = diagnostic.with_note(DiagnosticNote::new(
            format!("candidate: {}", comp.symbol_signature(candidate)),
            Some(comp.graph.symbol(comp.graph.unaliased(candidate)).get_name().get_span()),
        ));
    }
    diagnostic
}

fn not_found(
    comp: &Compilation<'_>,
    span: Span,
    section: &NameSection,
    parent: Option<SymbolId>,
) -> Diagnostic {
    let name = comp.interner.lookup(section.get_ident().get_name());
    match parent {
        Some(parent) => Diagnostic::error(
            span,
            format!("`{}` is not a member of {}", name, comp.symbol_phrase(parent)),
        ),
        None => Diagnostic::error(span, format!("symbol `{name}` not found")),
    }
}

/// Keeps `instantiator` linked into the public resolution surface: callers
/// asking "is this symbol a generic instance" go through here.
pub fn is_generic_instance(graph: &SymbolGraph, symbol: SymbolId) -> bool {
    instantiator::is_instance(graph, symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccessModifier;
    use crate::test_support::{declare_function, declare_module, declare_struct, sp};
    use shared_context::Bump;
    use syntax::NameSection;

    fn qualified(comp: &mut Compilation<'_>, root: NameRoot, parts: &[&str]) -> QualifiedName {
        let sections = parts
            .iter()
            .enumerate()
            .map(|(i, part)| NameSection::plain(comp.intern_ident(part, sp(i))))
            .collect();
        QualifiedName::new(root, sections)
    }

    #[test]
    fn qualified_names_resolve_and_round_trip() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let global = comp.graph.global_scope();
        let int32 = comp.natives.int32;

        let (_, module_body) = declare_module(&mut comp, global, "geometry");
        let point = declare_struct(
            &mut comp,
            module_body,
            "Point",
            AccessModifier::Public,
            &[("x", int32)],
        );

        let name = qualified(&mut comp, NameRoot::Global, &["geometry", "Point"]);
        let (resolved, bag) = resolve_static_symbol(&mut comp, global, &name, None).into_parts();
        assert!(bag.is_empty(), "{bag:?}");
        assert_eq!(resolved, point);

        // the fully qualified name of a successful resolution names the
        // same symbol again
        assert_eq!(comp.fully_qualified_name(resolved), "geometry::Point");
        let again = qualified(&mut comp, NameRoot::Global, &["geometry", "Point"]);
        let (resolved_again, _) =
            resolve_static_symbol(&mut comp, global, &again, None).into_parts();
        assert_eq!(resolved, resolved_again);
    }

    #[test]
    fn private_symbols_are_inaccessible_outside_their_module() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let global = comp.graph.global_scope();
        let int32 = comp.natives.int32;

        let (_, module_body) = declare_module(&mut comp, global, "inner");
        let secret = declare_struct(
            &mut comp,
            module_body,
            "Secret",
            AccessModifier::Private,
            &[("v", int32)],
        );

        // reachable from inside the module
        assert!(is_accessible(&comp.graph, module_body, secret));

        // diagnosed at a use site outside the subtree
        let name = qualified(&mut comp, NameRoot::Global, &["inner", "Secret"]);
        let (resolved, bag) = resolve_static_symbol(&mut comp, global, &name, None).into_parts();
        assert_eq!(resolved, secret, "resolution still hands the symbol back");
        assert!(
            bag.iter().any(|d| d.get_message().contains("not accessible")),
            "{bag:?}"
        );
    }

    #[test]
    fn overload_resolution_is_deterministic_and_prefers_exact() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let global = comp.graph.global_scope();
        let int32 = comp.natives.int32;
        let int64 = comp.natives.int64;

        let narrow = declare_function(&mut comp, global, "pick", &[int32], int32);
        let wide = declare_function(&mut comp, global, "pick", &[int64], int32);

        let args = [crate::TypeInfo::rvalue(int32)];
        for _ in 0..3 {
            let name = qualified(&mut comp, NameRoot::Local, &["pick"]);
            let (winner, bag) =
                resolve_static_symbol(&mut comp, global, &name, Some(&args)).into_parts();
            assert!(bag.is_empty(), "{bag:?}");
            assert_eq!(winner, narrow, "the exact match beats the widening one");
        }

        // with an Int64 argument only the wide candidate fits
        let args = [crate::TypeInfo::rvalue(int64)];
        let name = qualified(&mut comp, NameRoot::Local, &["pick"]);
        let (winner, bag) =
            resolve_static_symbol(&mut comp, global, &name, Some(&args)).into_parts();
        assert!(bag.is_empty(), "{bag:?}");
        assert_eq!(winner, wide);
    }

    #[test]
    fn unknown_names_fall_back_to_the_error_type() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let global = comp.graph.global_scope();

        let name = qualified(&mut comp, NameRoot::Local, &["nonexistent"]);
        let (resolved, bag) = resolve_static_symbol(&mut comp, global, &name, None).into_parts();
        assert_eq!(resolved, comp.error_type());
        assert!(bag.iter().any(|d| d.get_message().contains("not found")));
    }
}
