// The conversion rules: whether an expression of one type-info can become
// another, and through which steps. The sema type checker applies the
// resulting plan by wrapping expressions; overload resolution uses the
// cost to rank candidates.

use crate::natives::Natives;
use crate::scope::SymbolGraph;
use crate::symbols::Symbol;
use crate::{SymbolId, TypeInfo, ValueKind};
use shared_context::interner::Interner;

/// User-defined conversion operator names, looked up on the target type.
pub const OP_IMPLICIT_FROM: &str = "op_implicit_from";
pub const OP_EXPLICIT_FROM: &str = "op_explicit_from";

/// Implicit conversions are inserted by the type checker; explicit ones
/// only happen under a user-written cast. Explicit mode also admits every
/// implicit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    Implicit,
    Explicit,
}

/// A reference-level adjustment applied before any operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefAdjust {
    /// `&T` -> `T`
    Deref,
    /// `T` -> `&T`
    Ref,
}

/// How much a conversion costs during overload ranking:
/// exact > numeric widening > user-defined implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionCost {
    Exact,
    Widening,
    User,
}

/// The steps needed to perform one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionPlan {
    pub adjust: Option<RefAdjust>,
    pub operator: Option<SymbolId>,
    pub cost: ConversionCost,
}

impl ConversionPlan {
    fn identity() -> Self {
        Self {
            adjust: None,
            operator: None,
            cost: ConversionCost::Exact,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.adjust.is_none() && self.operator.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionFailure {
    /// An rvalue cannot be bound where an lvalue is required.
    ValueKind,
    NoConversion,
}

/// Decides how to convert `from` into `target`, or why it cannot be done.
pub fn find_conversion(
    graph: &SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    from: TypeInfo,
    target: TypeInfo,
    mode: ConversionMode,
) -> Result<ConversionPlan, ConversionFailure> {
    if target.value_kind == ValueKind::L && from.value_kind == ValueKind::R {
        return Err(ConversionFailure::ValueKind);
    }

    let from_ty = graph.unaliased(from.symbol);
    let target_ty = graph.unaliased(target.symbol);

    // The error type converts to and from everything, silently; its
    // diagnostics were already reported where it was introduced.
    if is_error(graph, from_ty) || is_error(graph, target_ty) {
        return Ok(ConversionPlan::identity());
    }

    if from_ty == target_ty {
        return Ok(ConversionPlan::identity());
    }

    // Reference adjustment: implicit deref of `&T` where `T` is wanted,
    // implicit ref of `T` where `&T` is wanted.
    if let Some(pointee) = ref_pointee(graph, natives, from_ty) {
        if graph.unaliased(pointee) == target_ty {
            return Ok(ConversionPlan {
                adjust: Some(RefAdjust::Deref),
                operator: None,
                cost: ConversionCost::Exact,
            });
        }
    }
    if let Some(pointee) = ref_pointee(graph, natives, target_ty) {
        if graph.unaliased(pointee) == from_ty {
            return Ok(ConversionPlan {
                adjust: Some(RefAdjust::Ref),
                operator: None,
                cost: ConversionCost::Exact,
            });
        }
    }

    // Conversion operators, on the type itself and after the reference
    // adjustment the target calls for, in either direction.
    if let Some((operator, cost)) = find_operator(graph, natives, interner, from_ty, target_ty, mode)
    {
        return Ok(ConversionPlan {
            adjust: None,
            operator: Some(operator),
            cost,
        });
    }
    if let Some(pointee) = ref_pointee(graph, natives, from_ty) {
        let pointee = graph.unaliased(pointee);
        if let Some((operator, cost)) =
            find_operator(graph, natives, interner, pointee, target_ty, mode)
        {
            return Ok(ConversionPlan {
                adjust: Some(RefAdjust::Deref),
                operator: Some(operator),
                cost,
            });
        }
    }
    // A reference target retries with the source wrapped in a reference,
    // mirroring the deref branch above. Only an existing `&From` instance
    // can be meant here: an operator taking `&From` declared that
    // instance with its own signature.
    if ref_pointee(graph, natives, target_ty).is_some() {
        if let Some(wrapped) = existing_ref_instance(graph, natives, from_ty) {
            if let Some((operator, cost)) =
                find_operator(graph, natives, interner, wrapped, target_ty, mode)
            {
                return Ok(ConversionPlan {
                    adjust: Some(RefAdjust::Ref),
                    operator: Some(operator),
                    cost,
                });
            }
        }
    }

    Err(ConversionFailure::NoConversion)
}

/// Whether each of `from` converts implicitly to the corresponding
/// `target`. The arity must already match.
pub fn types_convertible(
    graph: &SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    from: &[TypeInfo],
    target: &[TypeInfo],
) -> bool {
    from.len() == target.len()
        && from.iter().zip(target).all(|(&f, &t)| {
            find_conversion(graph, natives, interner, f, t, ConversionMode::Implicit).is_ok()
        })
}

fn is_error(graph: &SymbolGraph, ty: SymbolId) -> bool {
    matches!(graph.symbol(ty), Symbol::ErrorType(_))
}

fn ref_pointee(graph: &SymbolGraph, natives: &Natives, ty: SymbolId) -> Option<SymbolId> {
    let symbol = graph.symbol(ty);
    let is_ref = ty == natives.ref_root
        || symbol.get_generic_root_hint() == Some(natives.ref_root);
    if is_ref {
        symbol.get_type_args().first().copied()
    } else {
        None
    }
}

/// The already-materialized `&Pointee` instance, if any. Conversion
/// planning never instantiates; it only reuses what a declaration has
/// put next to the reference root.
fn existing_ref_instance(
    graph: &SymbolGraph,
    natives: &Natives,
    pointee: SymbolId,
) -> Option<SymbolId> {
    let root = natives.ref_root;
    let scope = graph.symbol(root).get_scope();
    let name = graph.symbol(root).get_name().get_name();
    let pointee = graph.unaliased(pointee);

    graph
        .scope(scope)
        .get_symbols_named(name)
        .iter()
        .copied()
        .find(|&candidate| {
            candidate != root
                && graph.symbol(candidate).get_generic_root_hint() == Some(root)
                && graph
                    .symbol(candidate)
                    .get_type_args()
                    .first()
                    .is_some_and(|&arg| graph.unaliased(arg) == pointee)
        })
}

/// The native ladder first, then user-defined operators on the target
/// type. Explicit mode falls back to implicit operators.
fn find_operator(
    graph: &SymbolGraph,
    natives: &Natives,
    interner: &Interner<'_>,
    from: SymbolId,
    target: SymbolId,
    mode: ConversionMode,
) -> Option<(SymbolId, ConversionCost)> {
    if let Some(op) = natives
        .implicit_from_ops
        .get(&target)
        .and_then(|m| m.get(&from))
    {
        return Some((*op, ConversionCost::Widening));
    }

    if mode == ConversionMode::Explicit {
        if let Some(op) = natives
            .explicit_from_ops
            .get(&target)
            .and_then(|m| m.get(&from))
        {
            return Some((*op, ConversionCost::Widening));
        }
    }

    let names: &[&str] = match mode {
        ConversionMode::Implicit => &[OP_IMPLICIT_FROM],
        ConversionMode::Explicit => &[OP_EXPLICIT_FROM, OP_IMPLICIT_FROM],
    };
    for name in names {
        if let Some(op) = find_user_operator(graph, interner, target, name, from) {
            return Some((op, ConversionCost::User));
        }
    }
    None
}

/// A user conversion operator is a one-parameter associated function named
/// `op_implicit_from` / `op_explicit_from` on the target type whose
/// parameter matches the source.
fn find_user_operator(
    graph: &SymbolGraph,
    interner: &Interner<'_>,
    target: SymbolId,
    name: &str,
    from: SymbolId,
) -> Option<SymbolId> {
    let name_id = interner.get(name)?;
    let body = graph.symbol(target).get_body_scope()?;

    let mut scopes = vec![body];
    scopes.extend_from_slice(graph.scope(body).get_associations());

    for scope in scopes {
        for &candidate in graph.scope(scope).get_symbols_named(name_id) {
            let Symbol::Function(function) = graph.symbol(candidate) else {
                continue;
            };
            if function.params.len() != 1 {
                continue;
            }
            let param_type = graph
                .symbol(function.params[0])
                .get_var_type()
                .expect("param has a type");
            if graph.unaliased(param_type) == from {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compilation::Compilation;
    use shared_context::Bump;

    fn plan(
        comp: &Compilation<'_>,
        from: SymbolId,
        to: SymbolId,
        mode: ConversionMode,
    ) -> Result<ConversionPlan, ConversionFailure> {
        find_conversion(
            &comp.graph,
            &comp.natives,
            &comp.interner,
            TypeInfo::rvalue(from),
            TypeInfo::rvalue(to),
            mode,
        )
    }

    #[test]
    fn widening_within_a_signedness_is_implicit() {
        let arena = Bump::new();
        let comp = Compilation::new(&arena, "t", "");
        let n = &comp.natives;

        let widened = plan(&comp, n.int8, n.int32, ConversionMode::Implicit).unwrap();
        assert!(widened.operator.is_some());
        assert_eq!(widened.cost, ConversionCost::Widening);

        let unsigned = plan(&comp, n.uint16, n.uint64, ConversionMode::Implicit).unwrap();
        assert!(unsigned.operator.is_some());

        let float = plan(&comp, n.float32, n.float64, ConversionMode::Implicit).unwrap();
        assert!(float.operator.is_some());
    }

    #[test]
    fn narrowing_and_crossings_need_an_explicit_cast() {
        let arena = Bump::new();
        let comp = Compilation::new(&arena, "t", "");
        let n = &comp.natives;

        // narrowing
        assert_eq!(
            plan(&comp, n.int64, n.int8, ConversionMode::Implicit),
            Err(ConversionFailure::NoConversion)
        );
        assert!(plan(&comp, n.int64, n.int8, ConversionMode::Explicit).is_ok());

        // cross-signedness
        assert_eq!(
            plan(&comp, n.int32, n.uint32, ConversionMode::Implicit),
            Err(ConversionFailure::NoConversion)
        );
        assert!(plan(&comp, n.int32, n.uint32, ConversionMode::Explicit).is_ok());

        // float <-> int
        assert_eq!(
            plan(&comp, n.float32, n.int32, ConversionMode::Implicit),
            Err(ConversionFailure::NoConversion)
        );
        assert!(plan(&comp, n.int8, n.float32, ConversionMode::Explicit).is_ok());
    }

    #[test]
    fn identity_needs_no_conversion() {
        let arena = Bump::new();
        let comp = Compilation::new(&arena, "t", "");
        let got = plan(&comp, comp.natives.int32, comp.natives.int32, ConversionMode::Implicit)
            .unwrap();
        assert!(got.is_identity());
        assert_eq!(got.cost, ConversionCost::Exact);
    }

    #[test]
    fn references_adjust_in_both_directions() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let int32 = comp.natives.int32;
        let ref_root = comp.natives.ref_root;
        let (ref_int, bag) = comp
            .instantiate(shared_context::Span::default(), ref_root, vec![int32])
            .into_parts();
        assert!(bag.is_empty());

        let deref = plan(&comp, ref_int, int32, ConversionMode::Implicit).unwrap();
        assert_eq!(deref.adjust, Some(RefAdjust::Deref));

        let reference = plan(&comp, int32, ref_int, ConversionMode::Implicit).unwrap();
        assert_eq!(reference.adjust, Some(RefAdjust::Ref));
    }

    #[test]
    fn ref_targets_retry_operators_with_a_wrapped_source() {
        use crate::AccessModifier;
        use crate::test_support::{declare_function, declare_struct};

        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let global = comp.graph.global_scope();

        let a = declare_struct(&mut comp, global, "A", AccessModifier::Public, &[]);
        let b = declare_struct(&mut comp, global, "B", AccessModifier::Public, &[]);
        comp.finish_body_deferment();

        let ref_root = comp.natives.ref_root;
        let (ref_a, bag) = comp
            .instantiate(shared_context::Span::default(), ref_root, vec![a])
            .into_parts();
        assert!(bag.is_empty());
        let (ref_b, bag) = comp
            .instantiate(shared_context::Span::default(), ref_root, vec![b])
            .into_parts();
        assert!(bag.is_empty());

        // `&B` provides op_implicit_from(&A); a plain `A` source must
        // ref-wrap before the operator matches
        let ref_b_body = comp.graph.symbol(ref_b).get_body_scope().unwrap();
        let op = declare_function(&mut comp, ref_b_body, OP_IMPLICIT_FROM, &[ref_a], ref_b);

        let got = plan(&comp, a, ref_b, ConversionMode::Implicit).unwrap();
        assert_eq!(got.adjust, Some(RefAdjust::Ref));
        assert_eq!(got.operator, Some(op));
        assert_eq!(got.cost, ConversionCost::User);
    }

    #[test]
    fn rvalues_do_not_bind_to_lvalue_targets() {
        let arena = Bump::new();
        let comp = Compilation::new(&arena, "t", "");
        let int32 = comp.natives.int32;
        let failure = find_conversion(
            &comp.graph,
            &comp.natives,
            &comp.interner,
            TypeInfo::rvalue(int32),
            TypeInfo::lvalue(int32),
            ConversionMode::Implicit,
        );
        assert_eq!(failure, Err(ConversionFailure::ValueKind));
    }
}
