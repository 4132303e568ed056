// Applies the conversion rules to sema expressions: the decision comes
// from `symbol_graph::conversions`, the wrapping (deref, ref, operator
// call) happens here.

use crate::nodes::{DerefExpr, ExprSema, RefExpr, StaticCallExpr};
use shared_context::diagnostics::{Diagnostic, DiagnosticBag};
use std::rc::Rc;
use symbol_graph::conversions::{ConversionFailure, ConversionMode, ConversionPlan, RefAdjust};
use symbol_graph::{Compilation, TypeInfo, conversions};

/// Converts `expr` to `target` implicitly, wrapping it as the plan
/// demands. Converting to the same type returns the original expression
/// untouched. Failures are diagnosed and the expression is returned
/// unchanged so analysis can continue.
pub fn create_implicitly_converted(
    comp: &mut Compilation<'_>,
    expr: &Rc<ExprSema>,
    target: TypeInfo,
    diagnostics: &mut DiagnosticBag,
) -> Rc<ExprSema> {
    convert(comp, expr, target, ConversionMode::Implicit, diagnostics)
}

/// Converts `expr` to `target` under an explicit cast.
pub fn create_explicitly_converted(
    comp: &mut Compilation<'_>,
    expr: &Rc<ExprSema>,
    target: TypeInfo,
    diagnostics: &mut DiagnosticBag,
) -> Rc<ExprSema> {
    convert(comp, expr, target, ConversionMode::Explicit, diagnostics)
}

fn convert(
    comp: &mut Compilation<'_>,
    expr: &Rc<ExprSema>,
    target: TypeInfo,
    mode: ConversionMode,
    diagnostics: &mut DiagnosticBag,
) -> Rc<ExprSema> {
    let from = expr.type_info(comp);

    match conversions::find_conversion(&comp.graph, &comp.natives, &comp.interner, from, target, mode)
    {
        Ok(plan) => apply_plan(comp, expr, from, plan),
        Err(ConversionFailure::ValueKind) => {
            diagnostics.add(Diagnostic::error(
                expr.span(),
                "an rvalue cannot be bound where an lvalue is required",
            ));
            expr.clone()
        }
        Err(ConversionFailure::NoConversion) => {
            let what = match mode {
                ConversionMode::Implicit => "no implicit conversion",
                ConversionMode::Explicit => "no explicit conversion",
            };
            diagnostics.add(Diagnostic::error(
                expr.span(),
                format!(
                    "{} from {} to {}",
                    what,
                    comp.symbol_phrase(from.symbol),
                    comp.symbol_phrase(target.symbol),
                ),
            ));
            expr.clone()
        }
    }
}

fn apply_plan(
    comp: &mut Compilation<'_>,
    expr: &Rc<ExprSema>,
    from: TypeInfo,
    plan: ConversionPlan,
) -> Rc<ExprSema> {
    if plan.is_identity() {
        return expr.clone();
    }

    let span = expr.span();
    let mut result = expr.clone();

    match plan.adjust {
        Some(RefAdjust::Deref) => {
            let pointee = comp
                .pointee_type(from.symbol)
                .unwrap_or_else(|| comp.error_type());
            result = Rc::new(ExprSema::Deref(DerefExpr {
                span,
                operand: result,
                ty: pointee,
            }));
        }
        Some(RefAdjust::Ref) => {
            let mut bag = DiagnosticBag::new();
            let ref_type =
                bag.collect(comp.instantiate(span, comp.natives.ref_root, vec![from.symbol]));
            // the ref instance always exists by the time a plan chose it
            debug_assert!(!bag.has_errors());
            result = Rc::new(ExprSema::Ref(RefExpr {
                span,
                operand: result,
                ref_type,
            }));
        }
        None => {}
    }

    if let Some(operator) = plan.operator {
        result = Rc::new(ExprSema::StaticCall(StaticCallExpr {
            span,
            function: operator,
            args: vec![result],
        }));
    }

    result
}
