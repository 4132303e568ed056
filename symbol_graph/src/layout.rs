use crate::SymbolId;
use crate::scope::SymbolGraph;
use crate::symbols::{SizeState, Symbol};
use shared_context::diagnostics::{Diagnosed, Diagnostic, DiagnosticBag};

/// Whether values of a type can be laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKind {
    Sized,
    Unsized,
}

/// Resolves whether `ty` is sized, depth-first through struct fields.
///
/// Each struct carries a resolution state; reentering a struct that is
/// currently `Resolving` means its fields eventually contain the struct
/// itself by value. That emits exactly one layout-cycle diagnostic and the
/// struct is treated as unsized from then on.
pub fn type_size_kind(graph: &mut SymbolGraph, ty: SymbolId) -> Diagnosed<SizeKind> {
    let mut diagnostics = DiagnosticBag::new();
    let kind = resolve(graph, graph.unaliased(ty), &mut diagnostics);
    Diagnosed::new(kind, diagnostics)
}

/// Convenience wrapper for callers that only branch on the answer and
/// report through their own bag.
pub fn is_sized(graph: &mut SymbolGraph, ty: SymbolId, diagnostics: &mut DiagnosticBag) -> bool {
    diagnostics.collect(type_size_kind(graph, ty)) == SizeKind::Sized
}

fn resolve(graph: &mut SymbolGraph, ty: SymbolId, diagnostics: &mut DiagnosticBag) -> SizeKind {
    let (state, primitively_emittable, span, body_scope) = match graph.symbol(ty) {
        // Type parameters stand for sized types, so placeholder instances
        // formed inside generic bodies pass the sized-argument check.
        Symbol::TypeParam(_) | Symbol::TraitSelf(_) => return SizeKind::Sized,
        // The error type swallows follow-on diagnostics.
        Symbol::ErrorType(_) => return SizeKind::Sized,
        Symbol::Trait(_) => return SizeKind::Unsized,
        Symbol::Struct(data) => (
            data.size_state,
            data.primitively_emittable,
            data.name.get_span(),
            data.body_scope,
        ),
        _ => return SizeKind::Unsized,
    };

    match state {
        SizeState::Sized => SizeKind::Sized,
        SizeState::Unsized => SizeKind::Unsized,
        SizeState::Resolving => {
            // Reentered during its own resolution: a layout cycle.
            set_state(graph, ty, SizeState::Unsized);
            diagnostics.add(Diagnostic::error(
                span,
                "layout cycle: the struct contains itself by value",
            ));
            SizeKind::Unsized
        }
        SizeState::Unresolved => {
            if primitively_emittable {
                set_state(graph, ty, SizeState::Sized);
                return SizeKind::Sized;
            }

            set_state(graph, ty, SizeState::Resolving);

            let field_types: Vec<SymbolId> = graph
                .collect_symbols(body_scope, |s| matches!(s, Symbol::Field(_)))
                .iter()
                .map(|&f| graph.symbol(f).get_var_type().expect("field has a type"))
                .collect();

            let mut kind = SizeKind::Sized;
            for field_ty in field_types {
                let field_ty = graph.unaliased(field_ty);
                if resolve(graph, field_ty, diagnostics) == SizeKind::Unsized {
                    kind = SizeKind::Unsized;
                }
            }

            // The cycle path may already have forced Unsized while the
            // fields were being walked.
            let current = match graph.symbol(ty) {
                Symbol::Struct(data) => data.size_state,
                _ => return SizeKind::Unsized,
            };
            if current == SizeState::Resolving {
                let state = match kind {
                    SizeKind::Sized => SizeState::Sized,
                    SizeKind::Unsized => SizeState::Unsized,
                };
                set_state(graph, ty, state);
                kind
            } else {
                SizeKind::Unsized
            }
        }
    }
}

fn set_state(graph: &mut SymbolGraph, ty: SymbolId, state: SizeState) {
    if let Symbol::Struct(data) = graph.symbol_mut(ty) {
        data.size_state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccessModifier;
    use crate::compilation::Compilation;
    use crate::test_support::declare_struct;
    use shared_context::Bump;

    #[test]
    fn struct_of_primitives_is_sized() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let global = comp.graph.global_scope();
        let int32 = comp.natives.int32;

        let point = declare_struct(
            &mut comp,
            global,
            "Point",
            AccessModifier::Public,
            &[("x", int32), ("y", int32)],
        );
        let (kind, bag) = type_size_kind(&mut comp.graph, point).into_parts();
        assert_eq!(kind, SizeKind::Sized);
        assert!(bag.is_empty());
    }

    #[test]
    fn mutually_recursive_structs_report_one_cycle() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let global = comp.graph.global_scope();

        // struct A { b: B } and struct B { a: A }, both by value, so the
        // layout can never bottom out
        let a = declare_struct(&mut comp, global, "A", AccessModifier::Public, &[]);
        let b = declare_struct(
            &mut comp,
            global,
            "B",
            AccessModifier::Public,
            &[("a", a)],
        );
        // patch A's body with the field after B exists
        let a_body = comp.graph.symbol(a).get_body_scope().unwrap();
        let ident = comp.intern_ident("b", shared_context::Span::default());
        comp.graph
            .declare_symbol_unchecked(crate::symbols::Symbol::Field(
                crate::symbols::FieldVarSymbol {
                    scope: a_body,
                    name: ident,
                    access: AccessModifier::Public,
                    var_type: b,
                    index: 0,
                },
            ));

        let mut diagnostics = shared_context::diagnostics::DiagnosticBag::new();
        let first = diagnostics.collect(type_size_kind(&mut comp.graph, a));
        let second = diagnostics.collect(type_size_kind(&mut comp.graph, b));

        assert_eq!(first, SizeKind::Unsized);
        assert_eq!(second, SizeKind::Unsized);
        let cycles = diagnostics
            .iter()
            .filter(|d| d.get_message().contains("layout cycle"))
            .count();
        assert_eq!(cycles, 1, "{diagnostics:?}");
    }
}
