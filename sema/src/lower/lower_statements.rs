use crate::lower::Lowerer;
use crate::nodes::{
    BlockStmt, ConditionalJumpStmt, ExprSema, ExprStmt, GroupStmt, InstanceVarRefExpr, JumpStmt,
    LabelStmt, NormalAssignmentStmt, RefExpr, ReturnStmt, StaticCallExpr, StaticVarRefExpr,
    StmtSema, VarStmt,
};
use crate::typecheck::typecheck_statements::all_same_stmts;
use shared_context::Span;
use std::rc::Rc;
use symbol_graph::symbols::{LocalVarSymbol, Symbol};
use symbol_graph::{SymbolId, ValueKind};

impl Lowerer<'_, '_> {
    pub(crate) fn lower_stmt(&mut self, stmt: &Rc<StmtSema>) -> Rc<StmtSema> {
        match stmt.as_ref() {
            StmtSema::Block(s) => {
                let stmts: Vec<Rc<StmtSema>> =
                    s.stmts.iter().map(|child| self.lower_stmt(child)).collect();
                if all_same_stmts(&s.stmts, &stmts) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::Block(BlockStmt {
                        span: s.span,
                        scope: s.scope,
                        stmts,
                    }))
                }
            }

            StmtSema::Group(s) => {
                let stmts: Vec<Rc<StmtSema>> =
                    s.stmts.iter().map(|child| self.lower_stmt(child)).collect();
                if all_same_stmts(&s.stmts, &stmts) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::Group(GroupStmt {
                        span: s.span,
                        stmts,
                    }))
                }
            }

            StmtSema::Var(s) => {
                let Some(init) = &s.init else {
                    return stmt.clone();
                };
                let lowered = self.lower_expr(init);
                if Rc::ptr_eq(&lowered, init) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::Var(VarStmt {
                        span: s.span,
                        symbol: s.symbol,
                        init: Some(lowered),
                    }))
                }
            }

            StmtSema::NormalAssignment(s) => {
                let lhs = self.lower_expr(&s.lhs);
                let rhs = self.lower_expr(&s.rhs);
                if Rc::ptr_eq(&lhs, &s.lhs) && Rc::ptr_eq(&rhs, &s.rhs) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::NormalAssignment(NormalAssignmentStmt {
                        span: s.span,
                        lhs,
                        rhs,
                    }))
                }
            }

            StmtSema::CompoundAssignment(s) => {
                let lhs = self.lower_expr(&s.lhs);
                let rhs = self.lower_expr(&s.rhs);
                let group = self.lower_compound_assignment(s.span, lhs, rhs, s.op_symbol);
                self.lower_stmt(&group)
            }

            StmtSema::If(s) => {
                // cond-jump to each branch body in order; the fall-through
                // is the else body. Bodies follow behind labels, each
                // jumping to the shared end label.
                let end = self.fresh_label();
                let branch_labels: Vec<_> = s.branches.iter().map(|_| self.fresh_label()).collect();

                let mut stmts: Vec<Rc<StmtSema>> = Vec::new();
                for (branch, &label) in s.branches.iter().zip(&branch_labels) {
                    let condition = self.lower_expr(&branch.condition);
                    stmts.push(Rc::new(StmtSema::ConditionalJump(ConditionalJumpStmt {
                        span: branch.condition.span(),
                        condition,
                        label,
                    })));
                }
                if let Some(else_body) = &s.else_body {
                    stmts.push(self.lower_stmt(else_body));
                }
                stmts.push(Rc::new(StmtSema::Jump(JumpStmt {
                    span: s.span,
                    label: end,
                })));
                for (branch, &label) in s.branches.iter().zip(&branch_labels) {
                    stmts.push(Rc::new(StmtSema::Label(LabelStmt {
                        span: branch.body.span(),
                        label,
                    })));
                    stmts.push(self.lower_stmt(&branch.body));
                    stmts.push(Rc::new(StmtSema::Jump(JumpStmt {
                        span: branch.body.span(),
                        label: end,
                    })));
                }
                stmts.push(Rc::new(StmtSema::Label(LabelStmt {
                    span: s.span,
                    label: end,
                })));

                Rc::new(StmtSema::Group(GroupStmt {
                    span: s.span,
                    stmts,
                }))
            }

            StmtSema::While(s) => {
                // jump to the condition first, so the body runs only after
                // the condition held once.
                let body_label = self.fresh_label();
                let cond_label = self.fresh_label();

                let condition = self.lower_expr(&s.condition);
                let body = self.lower_stmt(&s.body);

                let stmts: Vec<Rc<StmtSema>> = vec![
                    Rc::new(StmtSema::Jump(JumpStmt {
                        span: s.span,
                        label: cond_label,
                    })),
                    Rc::new(StmtSema::Label(LabelStmt {
                        span: s.body.span(),
                        label: body_label,
                    })),
                    body,
                    Rc::new(StmtSema::Label(LabelStmt {
                        span: s.condition.span(),
                        label: cond_label,
                    })),
                    Rc::new(StmtSema::ConditionalJump(ConditionalJumpStmt {
                        span: s.condition.span(),
                        condition,
                        label: body_label,
                    })),
                ];

                Rc::new(StmtSema::Group(GroupStmt {
                    span: s.span,
                    stmts,
                }))
            }

            StmtSema::ConditionalJump(s) => {
                let condition = self.lower_expr(&s.condition);
                if Rc::ptr_eq(&condition, &s.condition) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::ConditionalJump(ConditionalJumpStmt {
                        span: s.span,
                        condition,
                        label: s.label,
                    }))
                }
            }

            StmtSema::Return(s) => {
                let Some(value) = &s.value else {
                    return stmt.clone();
                };
                let lowered = self.lower_expr(value);
                if Rc::ptr_eq(&lowered, value) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::Return(ReturnStmt {
                        span: s.span,
                        value: Some(lowered),
                    }))
                }
            }

            StmtSema::Expr(s) => {
                let expr = self.lower_expr(&s.expr);
                if Rc::ptr_eq(&expr, &s.expr) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::Expr(ExprStmt { span: s.span, expr }))
                }
            }

            StmtSema::Jump(_) | StmtSema::Label(_) => stmt.clone(),
        }
    }

    /// `lhs op= rhs` becomes `lhs = lhs op rhs`. When the left side is an
    /// instance field, the base is taken by reference into a temporary
    /// first so it is evaluated once:
    ///
    /// ```text
    /// { tmp: &Base = &base; tmp.field = Base::op(tmp.field, rhs); }
    /// ```
    ///
    /// An rvalue base is spilled into a local before the reference is
    /// formed.
    fn lower_compound_assignment(
        &mut self,
        span: Span,
        lhs: Rc<ExprSema>,
        rhs: Rc<ExprSema>,
        op_symbol: SymbolId,
    ) -> Rc<StmtSema> {
        let mut stmts: Vec<Rc<StmtSema>> = Vec::new();

        let store_target = match lhs.as_ref() {
            ExprSema::InstanceVarRef(field_ref) => {
                let base = field_ref.base.clone();
                let base_type = base.type_info(self.comp).symbol;

                let base_operand = if base.value_kind(self.comp) == ValueKind::R
                    && !self.comp.is_ref_type(base_type)
                {
                    let spill = self.declare_temp(span, base_type);
                    stmts.push(Rc::new(StmtSema::Var(VarStmt {
                        span,
                        symbol: spill,
                        init: Some(base),
                    })));
                    Rc::new(ExprSema::StaticVarRef(StaticVarRefExpr {
                        span,
                        var: spill,
                        ty: base_type,
                    }))
                } else {
                    base
                };

                // An already-by-reference base is reused as is; a direct
                // struct lvalue is wrapped in a fresh reference.
                let (ref_expr, ref_type) = if self.comp.is_ref_type(base_type) {
                    (base_operand, base_type)
                } else {
                    let mut bag = shared_context::diagnostics::DiagnosticBag::new();
                    let ref_type = bag.collect(self.comp.instantiate(
                        span,
                        self.comp.natives.ref_root,
                        vec![base_type],
                    ));
                    let ref_expr: Rc<ExprSema> = Rc::new(ExprSema::Ref(RefExpr {
                        span,
                        operand: base_operand,
                        ref_type,
                    }));
                    (ref_expr, ref_type)
                };

                let tmp_ref = self.declare_temp(span, ref_type);
                stmts.push(Rc::new(StmtSema::Var(VarStmt {
                    span,
                    symbol: tmp_ref,
                    init: Some(ref_expr),
                })));

                Rc::new(ExprSema::InstanceVarRef(InstanceVarRefExpr {
                    span,
                    base: Rc::new(ExprSema::StaticVarRef(StaticVarRefExpr {
                        span,
                        var: tmp_ref,
                        ty: ref_type,
                    })),
                    field: field_ref.field,
                    ty: field_ref.ty,
                }))
            }
            _ => lhs,
        };

        let operation = Rc::new(ExprSema::StaticCall(StaticCallExpr {
            span,
            function: op_symbol,
            args: vec![store_target.clone(), rhs],
        }));
        stmts.push(Rc::new(StmtSema::NormalAssignment(NormalAssignmentStmt {
            span,
            lhs: store_target,
            rhs: operation,
        })));

        Rc::new(StmtSema::Group(GroupStmt { span, stmts }))
    }

    fn declare_temp(&mut self, span: Span, var_type: SymbolId) -> SymbolId {
        let name = self.comp.next_anonymous_ident(span);
        self.comp
            .graph
            .declare_symbol_unchecked(Symbol::Local(LocalVarSymbol {
                scope: self.function_scope,
                name,
                var_type,
            }))
    }
}
