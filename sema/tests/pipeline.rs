// End-to-end checks over the sema pipeline: binding, conversion insertion,
// lowering rewrites, generic instantiation, constraint diagnostics, dyn
// dispatch eligibility and glue demands.

mod common;

use common::*;
use emitter::recording::Instruction;
use emitter::{Emitter, IrConstant, RecordingEmitter};
use pretty_assertions::assert_eq;
use sema::nodes::{ExprSema, ItemSema, StmtSema};
use shared_context::Bump;
use shared_context::diagnostics::DiagnosticBag;
use std::rc::Rc;
use symbol_graph::symbols::Symbol;
use symbol_graph::{Compilation, SymbolId, TypeInfo, ValueKind, resolution};
use syntax::{BinaryOp, FieldInit, LiteralKind, NameSection};

fn first_return_value(function: &sema::nodes::FunctionSema) -> Rc<ExprSema> {
    let StmtSema::Block(block) = function.body.as_ref() else {
        panic!("function body is a block");
    };
    for stmt in &block.stmts {
        if let StmtSema::Return(ret) = stmt.as_ref() {
            return ret.value.clone().expect("return has a value");
        }
    }
    panic!("no return statement found");
}

/// spec scenario: `1.0 + 2.0` lowers to a static call of the float
/// `op_add`, typed `Float32` with rvalue kind.
#[test]
fn user_operator_lowers_to_static_call() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let float32 = comp.natives.float32;

    let function = declare_function(&mut comp, global, "f", &[], float32);
    let body = block_of(
        vec![ret_stmt(
            Some(binary(
                BinaryOp::Add,
                literal(LiteralKind::FLOAT32, "1.0", 1),
                literal(LiteralKind::FLOAT32, "2.0", 2),
                3,
            )),
            4,
        )],
        0,
    );

    comp.finish_body_deferment();
    let mut diagnostics = DiagnosticBag::new();
    let bound = diagnostics.collect(sema::bind::bind_function_body(&mut comp, function, &body));

    let mut checker = sema::typecheck::TypeChecker::new(&mut comp);
    let checked = checker.typecheck_function(&bound);
    diagnostics.merge(checker.into_diagnostics());
    assert!(!diagnostics.has_errors(), "{diagnostics:?}");

    let mut lowerer = sema::lower::Lowerer::new(&mut comp, function);
    let lowered = lowerer.lower_function(&checked);

    let value = first_return_value(&lowered);
    let ExprSema::StaticCall(call) = value.as_ref() else {
        panic!("expected a static call after lowering, got {value:?}");
    };
    assert_eq!(comp.symbol_signature(call.function), "Float32::op_add");
    assert_eq!(call.args.len(), 2);

    let info = value.type_info(&comp);
    assert_eq!(info.symbol, comp.natives.float32);
    assert_eq!(info.value_kind, ValueKind::R);
}

/// Lowering runs to a fixed point: re-lowering a lowered body returns the
/// same allocation.
#[test]
fn lowering_is_idempotent() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let int32 = comp.natives.int32;

    let function = declare_function(&mut comp, global, "f", &[("a", int32)], int32);
    let body = block_of(
        vec![ret_stmt(
            Some(binary(
                BinaryOp::Mul,
                name_expr(&mut comp, "a", 1),
                literal(LiteralKind::INT32, "3", 2),
                3,
            )),
            4,
        )],
        0,
    );

    comp.finish_body_deferment();
    let mut diagnostics = DiagnosticBag::new();
    let bound = diagnostics.collect(sema::bind::bind_function_body(&mut comp, function, &body));
    let mut checker = sema::typecheck::TypeChecker::new(&mut comp);
    let checked = checker.typecheck_function(&bound);
    diagnostics.merge(checker.into_diagnostics());

    let mut lowerer = sema::lower::Lowerer::new(&mut comp, function);
    let once = lowerer.lower_function(&checked);
    let twice = lowerer.lower_function(&once);
    assert!(
        Rc::ptr_eq(&once.body, &twice.body),
        "lowering must be a fixed point"
    );
}

/// Converting an expression to its own type is a no-op that returns the
/// original allocation.
#[test]
fn identity_conversion_returns_the_original() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");

    let expr: Rc<ExprSema> = Rc::new(ExprSema::Literal(sema::nodes::LiteralExpr {
        span: sp(0),
        kind: LiteralKind::INT32,
        text: "7".to_string(),
        ty: comp.natives.int32,
    }));

    let mut diagnostics = DiagnosticBag::new();
    let int32_ty = TypeInfo::rvalue(comp.natives.int32);
    let converted = sema::conversions::create_implicitly_converted(
        &mut comp,
        &expr,
        int32_ty,
        &mut diagnostics,
    );
    assert!(Rc::ptr_eq(&expr, &converted));
    assert!(diagnostics.is_empty());
}

/// spec scenario: `a and b` emits an alloca seeded with false, evaluates
/// the left side, and only a true left side reaches the right side.
#[test]
fn and_short_circuits_at_emission() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let bool_ = comp.natives.bool_;

    let function = declare_function(&mut comp, global, "f", &[("a", bool_), ("b", bool_)], bool_);
    let lhs = name_expr(&mut comp, "a", 1);
    let rhs = name_expr(&mut comp, "b", 2);
    let body = block_of(vec![ret_stmt(Some(and_expr(lhs, rhs, 3)), 4)], 0);

    comp.finish_body_deferment();
    let mut diagnostics = DiagnosticBag::new();
    let bound = diagnostics.collect(sema::bind::bind_function_body(&mut comp, function, &body));
    let mut checker = sema::typecheck::TypeChecker::new(&mut comp);
    let checked = checker.typecheck_function(&bound);
    diagnostics.merge(checker.into_diagnostics());
    assert!(!diagnostics.has_errors(), "{diagnostics:?}");

    let mut lowerer = sema::lower::Lowerer::new(&mut comp, function);
    let lowered = lowerer.lower_function(&checked);

    let mut emitter = RecordingEmitter::new();
    emitter.begin_function(function);
    sema::emit::emit_function(&comp, &lowered, &mut emitter);

    let instructions = emitter.instructions();
    let seeded_false = instructions.windows(2).any(|pair| {
        matches!(
            (&pair[0], &pair[1]),
            (
                Instruction::Const {
                    constant: IrConstant::Bool(false),
                    dst,
                },
                Instruction::Store { value, .. },
            ) if value == dst
        )
    });
    assert!(seeded_false, "result slot is seeded with false:\n{}", emitter.dump());
    assert!(
        instructions
            .iter()
            .any(|i| matches!(i, Instruction::CondBr { .. })),
        "the right side is behind a conditional branch"
    );
}

/// spec scenario: calling `id(42)` materializes `id[Int32]`, elaborates
/// its body, and the call site points at the instance.
#[test]
fn generic_call_materializes_an_instance() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let int32 = comp.natives.int32;

    let id_fn = declare_identity_fn(&mut comp, global);
    let caller = declare_function(&mut comp, global, "caller", &[], int32);

    let id_body = block_of(vec![ret_stmt(Some(name_expr(&mut comp, "x", 1)), 2)], 0);
    let id_call = {
        let target = name_expr(&mut comp, "id", 3);
        call_expr(target, vec![literal(LiteralKind::INT32, "42", 4)], 5)
    };
    let caller_body = block_of(vec![ret_stmt(Some(id_call), 6)], 0);

    let bindings = vec![
        sema::FunctionBinding::new(id_fn, id_body),
        sema::FunctionBinding::new(caller, caller_body),
    ];
    let (program, diagnostics) = sema::analyze(&mut comp, bindings, &NullGlueBodies).into_parts();
    assert!(!diagnostics.has_errors(), "{diagnostics:?}");

    let instance = program
        .functions
        .keys()
        .copied()
        .find(|&f| f != id_fn && f != caller)
        .expect("an id instance was bound");
    assert_eq!(comp.symbol_signature(instance), "id[Int32]");
    assert_eq!(
        symbol_graph::instantiator::generic_root_of(&comp.graph, instance),
        id_fn
    );

    let call = first_return_value(program.function(caller).expect("caller analyzed"));
    let ExprSema::StaticCall(call) = call.as_ref() else {
        panic!("caller returns a call");
    };
    assert_eq!(call.function, instance);

    // the item tree lists every analyzed function, the instance included
    let listed: Vec<SymbolId> = program
        .items
        .iter()
        .filter_map(|item| match item {
            ItemSema::Function(f) => Some(f.symbol),
            _ => None,
        })
        .collect();
    assert!(listed.contains(&caller));
    assert!(listed.contains(&instance));

    // instantiation is idempotent: asking again yields the same symbol
    let mut bag = DiagnosticBag::new();
    let again = bag.collect(comp.instantiate(sp(9), id_fn, vec![int32]));
    assert_eq!(again, instance);
    assert_eq!(comp.partial_signature(again), comp.partial_signature(instance));
}

/// spec scenario: an unsatisfied constraint is reported exactly once, at
/// the call site, with a note pointing at the constraint declaration.
#[test]
fn unsatisfied_constraint_is_reported_once() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();

    let void = comp.natives.void;
    let (add_trait, _, _) = declare_trait(&mut comp, global, "Add");
    let f = declare_constrained_fn(&mut comp, global, "f", add_trait);
    let caller = declare_function(&mut comp, global, "g", &[], void);

    let call = {
        let target = name_expr(&mut comp, "f", 1);
        call_expr(
            target,
            vec![
                literal(LiteralKind::STRING, "x", 2),
                literal(LiteralKind::STRING, "y", 3),
            ],
            4,
        )
    };
    let caller_body = block_of(vec![expr_stmt(call, 5)], 0);

    comp.finish_body_deferment();
    let mut diagnostics = DiagnosticBag::new();
    diagnostics.collect(sema::bind::bind_function_body(&mut comp, caller, &caller_body));

    let unsatisfied: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.get_message().contains("unsatisfied constraint"))
        .collect();
    assert_eq!(unsatisfied.len(), 1, "{diagnostics:?}");
    assert!(
        !unsatisfied[0].get_notes().is_empty(),
        "the diagnostic points back at the constraint"
    );
    let _ = f;
}

/// spec scenario: a prototype returning `Self` cannot be reached through a
/// dyn reference; one with a concrete signature can.
#[test]
fn self_typed_prototype_is_not_dyn_dispatchable() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let int32 = comp.natives.int32;

    let (cloneable, trait_body, trait_self) = declare_trait(&mut comp, global, "Cloneable");
    let cloned = declare_prototype(&mut comp, trait_body, cloneable, trait_self, "cloned", trait_self);
    let tag = declare_prototype(&mut comp, trait_body, cloneable, trait_self, "tag", int32);

    assert!(!resolution::is_dyn_dispatchable(&comp.graph, cloned));
    assert!(resolution::is_dyn_dispatchable(&comp.graph, tag));

    let mut bag = DiagnosticBag::new();
    let dyn_ref = bag.collect(comp.instantiate(sp(8), comp.natives.ref_root, vec![cloneable]));

    let section = NameSection::plain(ident(&mut comp, "cloned", 9));
    let mut diagnostics = DiagnosticBag::new();
    let resolved = diagnostics.collect(resolution::resolve_instance_symbol(
        &mut comp,
        global,
        dyn_ref,
        &section,
        Some(&[]),
    ));
    assert_eq!(comp.graph.unaliased(resolved), comp.graph.unaliased(cloned));
    assert!(
        diagnostics
            .iter()
            .any(|d| d.get_message().contains("dyn reference")),
        "{diagnostics:?}"
    );

    let section = NameSection::plain(ident(&mut comp, "tag", 10));
    let mut diagnostics = DiagnosticBag::new();
    diagnostics.collect(resolution::resolve_instance_symbol(
        &mut comp,
        global,
        dyn_ref,
        &section,
        Some(&[]),
    ));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

/// spec scenario: a struct of trivially copyable fields is itself trivial
/// and its demanded copy glue loads `other` by value and stores into
/// `self`.
#[test]
fn trivial_struct_gets_load_store_copy_glue() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let int32 = comp.natives.int32;

    let point = declare_struct(&mut comp, global, "Point", &[("x", int32), ("y", int32)]);

    comp.finish_body_deferment();

    struct LoadStoreGlue;
    impl sema::glue::GlueBodyProvider for LoadStoreGlue {
        fn create_copy_glue_body(
            &self,
            _comp: &Compilation<'_>,
            ty: SymbolId,
            _glue: SymbolId,
        ) -> sema::glue::GlueBody {
            Rc::new(move |comp, em| {
                let ir_ty = em.get_type(ty);
                let self_ptr = em.emit_load_arg(0, ir_ty);
                let other_ptr = em.emit_load_arg(1, ir_ty);
                if sema::glue::is_trivially_copyable(comp, ty) {
                    let value = em.load(ir_ty, other_ptr);
                    em.store(value, self_ptr);
                }
                em.create_ret_void();
            })
        }

        fn create_drop_glue_body(
            &self,
            _comp: &Compilation<'_>,
            _ty: SymbolId,
            _glue: SymbolId,
        ) -> sema::glue::GlueBody {
            Rc::new(|_, em| em.create_ret_void())
        }
    }

    let (glue_map, diagnostics) = sema::glue::generate_glue(&mut comp, &LoadStoreGlue).into_parts();
    assert!(!diagnostics.has_errors(), "{diagnostics:?}");

    let Symbol::Struct(data) = comp.graph.symbol(point) else {
        panic!("point is a struct");
    };
    assert!(data.trivially_copyable, "all-int struct is trivially copyable");
    let copy_glue = data.copy_glue.expect("copy glue was bound");
    assert!(data.drop_glue.is_some(), "drop glue was bound");

    let body = glue_map.bodies.get(&copy_glue).expect("copy body provided");
    let mut emitter = RecordingEmitter::new();
    emitter.begin_function(copy_glue);
    body(&comp, &mut emitter);

    let instructions = emitter.instructions();
    let loads_other_stores_self = instructions.windows(2).any(|pair| {
        matches!(
            (&pair[0], &pair[1]),
            (Instruction::Load { dst, .. }, Instruction::Store { value, .. }) if value == dst
        )
    });
    assert!(
        loads_other_stores_self,
        "copy glue is a load/store pair:\n{}",
        emitter.dump()
    );
}

/// Struct construction demands every field exactly once, and the lowered
/// arguments sit in field-index order.
#[test]
fn struct_construction_checks_fields() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let int32 = comp.natives.int32;

    let point = declare_struct(&mut comp, global, "Point", &[("x", int32), ("y", int32)]);
    let function = declare_function(&mut comp, global, "f", &[], point);

    // `Point { y: 2, x: 1 }` is written out of order but bound in order
    let ctor = {
        let type_name = local_name(&mut comp, "Point", 1);
        let y = FieldInit::new(ident(&mut comp, "y", 2), literal(LiteralKind::INT32, "2", 3));
        let x = FieldInit::new(ident(&mut comp, "x", 4), literal(LiteralKind::INT32, "1", 5));
        construction(type_name, vec![y, x], 6)
    };
    let body = block_of(vec![ret_stmt(Some(ctor), 7)], 0);

    comp.finish_body_deferment();
    let mut diagnostics = DiagnosticBag::new();
    let bound = diagnostics.collect(sema::bind::bind_function_body(&mut comp, function, &body));
    assert!(!diagnostics.has_errors(), "{diagnostics:?}");

    let value = first_return_value(&bound);
    let ExprSema::StructConstruction(con) = value.as_ref() else {
        panic!("expected a struct construction");
    };
    let fields = comp.struct_fields(point);
    let arg_fields: Vec<SymbolId> = con.args.iter().map(|a| a.field).collect();
    assert_eq!(arg_fields, fields, "arguments follow field-index order");

    // a duplicate initializer is a bind-time error
    let bad = {
        let type_name = local_name(&mut comp, "Point", 8);
        let x1 = FieldInit::new(ident(&mut comp, "x", 9), literal(LiteralKind::INT32, "1", 10));
        let x2 = FieldInit::new(ident(&mut comp, "x", 11), literal(LiteralKind::INT32, "2", 12));
        construction(type_name, vec![x1, x2], 13)
    };
    let bad_body = block_of(vec![ret_stmt(Some(bad), 14)], 0);
    let mut diagnostics = DiagnosticBag::new();
    diagnostics.collect(sema::bind::bind_function_body(&mut comp, function, &bad_body));
    assert!(
        diagnostics
            .iter()
            .any(|d| d.get_message().contains("initialized twice")),
        "{diagnostics:?}"
    );
    assert!(
        diagnostics
            .iter()
            .any(|d| d.get_message().contains("is not initialized")),
        "y is reported missing: {diagnostics:?}"
    );
}

/// After type checking, every static call's argument count matches its
/// target's parameter count.
#[test]
fn checked_calls_match_their_parameters() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let int32 = comp.natives.int32;
    let int64 = comp.natives.int64;

    let callee = declare_function(&mut comp, global, "wide", &[("v", int64)], int64);
    let caller = declare_function(&mut comp, global, "caller", &[], int64);

    // the Int32 argument widens implicitly to Int64
    let call = {
        let target = name_expr(&mut comp, "wide", 1);
        call_expr(target, vec![literal(LiteralKind::INT32, "5", 2)], 3)
    };
    let body = block_of(vec![ret_stmt(Some(call), 4)], 0);

    comp.finish_body_deferment();
    let mut diagnostics = DiagnosticBag::new();
    let bound = diagnostics.collect(sema::bind::bind_function_body(&mut comp, caller, &body));
    let mut checker = sema::typecheck::TypeChecker::new(&mut comp);
    let checked = checker.typecheck_function(&bound);
    diagnostics.merge(checker.into_diagnostics());
    assert!(!diagnostics.has_errors(), "{diagnostics:?}");

    fn assert_calls(comp: &Compilation<'_>, expr: &Rc<ExprSema>) {
        if let ExprSema::StaticCall(call) = expr.as_ref() {
            let params = comp
                .graph
                .symbol(comp.graph.unaliased(call.function))
                .callable_params()
                .unwrap_or(&[])
                .len();
            assert_eq!(call.args.len(), params);
        }
        for child in expr.children() {
            assert_calls(comp, child);
        }
    }
    fn walk(comp: &Compilation<'_>, stmt: &Rc<StmtSema>) {
        for expr in stmt.child_exprs() {
            assert_calls(comp, expr);
        }
        for child in stmt.child_stmts() {
            walk(comp, child);
        }
    }
    walk(&comp, &checked.body);
    let _ = callee;
}

/// Missing returns and unreachable statements surface from the control
/// flow analysis of the lowered body.
#[test]
fn cfa_reports_missing_return_and_unreachable_code() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let int32 = comp.natives.int32;

    // fn f() -> Int32 { 1; } falls off the end
    let function = declare_function(&mut comp, global, "f", &[], int32);
    let body = block_of(
        vec![expr_stmt(literal(LiteralKind::INT32, "1", 1), 2)],
        0,
    );

    comp.finish_body_deferment();
    let mut diagnostics = DiagnosticBag::new();
    let bound = diagnostics.collect(sema::bind::bind_function_body(&mut comp, function, &body));
    let mut lowerer = sema::lower::Lowerer::new(&mut comp, function);
    let lowered = lowerer.lower_function(&bound);
    let (_, cfa) = sema::cfa::analyze_function(&comp, &lowered).into_parts();
    assert!(
        cfa.iter().any(|d| d.get_message().contains("return a value")),
        "{cfa:?}"
    );

    // fn g() -> Int32 { return 1; 2; } has a dead trailing statement
    let function = declare_function(&mut comp, global, "g", &[], int32);
    let body = block_of(
        vec![
            ret_stmt(Some(literal(LiteralKind::INT32, "1", 3)), 4),
            expr_stmt(literal(LiteralKind::INT32, "2", 5), 6),
        ],
        0,
    );
    let mut diagnostics = DiagnosticBag::new();
    let bound = diagnostics.collect(sema::bind::bind_function_body(&mut comp, function, &body));
    let mut lowerer = sema::lower::Lowerer::new(&mut comp, function);
    let lowered = lowerer.lower_function(&bound);
    let (_, cfa) = sema::cfa::analyze_function(&comp, &lowered).into_parts();
    assert!(
        cfa.iter().any(|d| d.get_message().contains("unreachable")),
        "{cfa:?}"
    );
}

/// Compound assignment lowers to a plain assignment over the operator
/// call; an instance-field target goes through a temporary reference so
/// the base is evaluated once.
#[test]
fn compound_assignment_lowers_to_normal_assignment() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let int32 = comp.natives.int32;

    // fn f(a: Int32) -> Int32 { let x: Int32 = a; x += a; return x; }
    let function = declare_function(&mut comp, global, "f", &[("a", int32)], int32);
    let body = {
        let x_decl = {
            let init = name_expr(&mut comp, "a", 1);
            let x = ident(&mut comp, "x", 2);
            let ty = local_name(&mut comp, "Int32", 3);
            var_stmt(x, Some(ty), Some(init), 4)
        };
        let update = {
            let lhs = name_expr(&mut comp, "x", 5);
            let rhs = name_expr(&mut comp, "a", 6);
            compound_stmt(lhs, BinaryOp::Add, rhs, 7)
        };
        let result = ret_stmt(Some(name_expr(&mut comp, "x", 8)), 9);
        block_of(vec![x_decl, update, result], 0)
    };

    comp.finish_body_deferment();
    let mut diagnostics = DiagnosticBag::new();
    let bound = diagnostics.collect(sema::bind::bind_function_body(&mut comp, function, &body));
    let mut checker = sema::typecheck::TypeChecker::new(&mut comp);
    let checked = checker.typecheck_function(&bound);
    diagnostics.merge(checker.into_diagnostics());
    assert!(!diagnostics.has_errors(), "{diagnostics:?}");

    let mut lowerer = sema::lower::Lowerer::new(&mut comp, function);
    let lowered = lowerer.lower_function(&checked);

    fn collect_flat(stmt: &Rc<StmtSema>, out: &mut Vec<Rc<StmtSema>>) {
        match stmt.as_ref() {
            StmtSema::Block(b) => b.stmts.iter().for_each(|s| collect_flat(s, out)),
            StmtSema::Group(g) => g.stmts.iter().for_each(|s| collect_flat(s, out)),
            _ => out.push(stmt.clone()),
        }
    }
    let mut flat = Vec::new();
    collect_flat(&lowered.body, &mut flat);

    assert!(
        !flat
            .iter()
            .any(|s| matches!(s.as_ref(), StmtSema::CompoundAssignment(_))),
        "no compound assignment survives lowering"
    );
    let rewritten = flat.iter().find_map(|s| match s.as_ref() {
        StmtSema::NormalAssignment(assign) => match assign.rhs.as_ref() {
            ExprSema::StaticCall(call) => Some(call.function),
            _ => None,
        },
        _ => None,
    });
    let op = rewritten.expect("x = Int32::op_add(x, a) appears");
    assert_eq!(comp.symbol_signature(op), "Int32::op_add");
}

/// A compound assignment to an instance field introduces a reference
/// temporary so the base expression is evaluated once.
#[test]
fn field_compound_assignment_goes_through_a_temp_ref() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let int32 = comp.natives.int32;

    let point = declare_struct(&mut comp, global, "Point", &[("x", int32), ("y", int32)]);
    let function = declare_function(&mut comp, global, "f", &[("p", point)], int32);

    // p.x += 1; return p.x;
    let body = {
        let update = {
            let base = name_expr(&mut comp, "p", 1);
            let lhs = member_expr(base, ident(&mut comp, "x", 2));
            compound_stmt(lhs, BinaryOp::Add, literal(LiteralKind::INT32, "1", 3), 4)
        };
        let result = {
            let base = name_expr(&mut comp, "p", 5);
            ret_stmt(Some(member_expr(base, ident(&mut comp, "x", 6))), 7)
        };
        block_of(vec![update, result], 0)
    };

    comp.finish_body_deferment();
    let mut diagnostics = DiagnosticBag::new();
    let bound = diagnostics.collect(sema::bind::bind_function_body(&mut comp, function, &body));
    let mut checker = sema::typecheck::TypeChecker::new(&mut comp);
    let checked = checker.typecheck_function(&bound);
    diagnostics.merge(checker.into_diagnostics());
    assert!(!diagnostics.has_errors(), "{diagnostics:?}");

    let mut lowerer = sema::lower::Lowerer::new(&mut comp, function);
    let lowered = lowerer.lower_function(&checked);

    fn find_temp_ref(comp: &Compilation<'_>, stmt: &Rc<StmtSema>) -> bool {
        let this = match stmt.as_ref() {
            StmtSema::Var(var) => {
                let name = comp.graph.symbol(var.symbol).get_name();
                let is_anon = comp.interner.lookup(name.get_name()).starts_with('$');
                let var_type = comp.graph.symbol(var.symbol).get_var_type();
                is_anon && var_type.is_some_and(|ty| comp.is_ref_type(ty))
            }
            _ => false,
        };
        this || stmt.child_stmts().iter().any(|s| find_temp_ref(comp, s))
    }
    assert!(
        find_temp_ref(&comp, &lowered.body),
        "a `$anon: &Point` temporary carries the base"
    );
}

/// `while` lowers to the label/jump core: the condition sits behind the
/// body and conditionally jumps back to it.
#[test]
fn while_lowers_to_labels_and_jumps() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let bool_ = comp.natives.bool_;
    let void = comp.natives.void;

    let function = declare_function(&mut comp, global, "f", &[("go", bool_)], void);
    let body = {
        let cond = name_expr(&mut comp, "go", 1);
        let inner = block_of(vec![], 2);
        block_of(vec![while_stmt(cond, inner, 3)], 0)
    };

    comp.finish_body_deferment();
    let mut diagnostics = DiagnosticBag::new();
    let bound = diagnostics.collect(sema::bind::bind_function_body(&mut comp, function, &body));
    let mut lowerer = sema::lower::Lowerer::new(&mut comp, function);
    let lowered = lowerer.lower_function(&bound);

    fn count_kinds(stmt: &Rc<StmtSema>, counts: &mut (usize, usize, usize, usize)) {
        match stmt.as_ref() {
            StmtSema::While(_) => counts.0 += 1,
            StmtSema::Jump(_) => counts.1 += 1,
            StmtSema::ConditionalJump(_) => counts.2 += 1,
            StmtSema::Label(_) => counts.3 += 1,
            _ => {}
        }
        for child in stmt.child_stmts() {
            count_kinds(child, counts);
        }
    }
    let mut counts = (0, 0, 0, 0);
    count_kinds(&lowered.body, &mut counts);
    let (whiles, jumps, cond_jumps, labels) = counts;
    assert_eq!(whiles, 0, "no structured loop survives lowering");
    assert_eq!(jumps, 1, "one jump to the condition");
    assert_eq!(cond_jumps, 1, "one conditional jump back to the body");
    assert_eq!(labels, 2, "body and condition labels");
}

/// Functions declared inside an impl body come back grouped under that
/// impl in the item tree, in agreement with the flat function map.
#[test]
fn item_tree_groups_impl_functions() {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "test.acl", "");
    let global = comp.graph.global_scope();
    let int32 = comp.natives.int32;

    let point = declare_struct(&mut comp, global, "Point", &[("x", int32)]);
    let (doubled_trait, trait_body, trait_self) = declare_trait(&mut comp, global, "Doubled");
    declare_prototype(&mut comp, trait_body, doubled_trait, trait_self, "doubled", int32);
    let impl_body = declare_trait_impl(&mut comp, global, point, doubled_trait);
    let method = declare_function(&mut comp, impl_body, "doubled", &[], int32);

    let body = block_of(
        vec![ret_stmt(Some(literal(LiteralKind::INT32, "1", 1)), 2)],
        0,
    );
    let (program, diagnostics) = sema::analyze(
        &mut comp,
        vec![sema::FunctionBinding::new(method, body)],
        &NullGlueBodies,
    )
    .into_parts();
    assert!(!diagnostics.has_errors(), "{diagnostics:?}");

    let impl_item = program
        .items
        .iter()
        .find_map(|item| match item {
            ItemSema::Impl(impl_sema) => Some(impl_sema),
            _ => None,
        })
        .expect("the trait impl appears as an item");
    assert_eq!(impl_item.functions.len(), 1);
    assert_eq!(impl_item.functions[0].symbol, method);
    assert!(
        program.function(method).is_some(),
        "the flat map and the item tree agree"
    );
}
