use crate::conversions::create_implicitly_converted;
use crate::nodes::{
    BlockStmt, CompoundAssignmentStmt, ConditionalJumpStmt, ExprStmt, GroupStmt, IfBranchSema,
    IfStmt, NormalAssignmentStmt, ReturnStmt, StmtSema, VarStmt, WhileStmt,
};
use crate::typecheck::{StmtContext, TypeChecker};
use shared_context::diagnostics::Diagnostic;
use std::rc::Rc;
use symbol_graph::{TypeInfo, ValueKind};

impl TypeChecker<'_, '_> {
    pub(crate) fn check_stmt(&mut self, stmt: &Rc<StmtSema>, ctx: &StmtContext) -> Rc<StmtSema> {
        match stmt.as_ref() {
            StmtSema::Block(s) => {
                let checked: Vec<Rc<StmtSema>> =
                    s.stmts.iter().map(|child| self.check_stmt(child, ctx)).collect();
                if all_same_stmts(&s.stmts, &checked) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::Block(BlockStmt {
                        span: s.span,
                        scope: s.scope,
                        stmts: checked,
                    }))
                }
            }

            StmtSema::Group(s) => {
                let checked: Vec<Rc<StmtSema>> =
                    s.stmts.iter().map(|child| self.check_stmt(child, ctx)).collect();
                if all_same_stmts(&s.stmts, &checked) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::Group(GroupStmt {
                        span: s.span,
                        stmts: checked,
                    }))
                }
            }

            StmtSema::Var(s) => {
                let Some(init) = &s.init else {
                    return stmt.clone();
                };
                let checked = self.check_expr(init);
                let var_type = self
                    .comp
                    .graph
                    .symbol(s.symbol)
                    .get_var_type()
                    .unwrap_or_else(|| self.comp.error_type());
                let converted = create_implicitly_converted(
                    self.comp,
                    &checked,
                    TypeInfo::rvalue(var_type),
                    &mut self.diagnostics,
                );
                if Rc::ptr_eq(&converted, init) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::Var(VarStmt {
                        span: s.span,
                        symbol: s.symbol,
                        init: Some(converted),
                    }))
                }
            }

            StmtSema::NormalAssignment(s) => {
                let lhs = self.check_expr(&s.lhs);
                let rhs = self.check_expr(&s.rhs);

                let lhs_info = lhs.type_info(self.comp);
                if lhs_info.value_kind != ValueKind::L {
                    self.diagnostics.add(Diagnostic::error(
                        s.span,
                        "the left-hand side of an assignment must be an lvalue",
                    ));
                }
                let rhs = create_implicitly_converted(
                    self.comp,
                    &rhs,
                    TypeInfo::rvalue(lhs_info.symbol),
                    &mut self.diagnostics,
                );

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
                let lhs = self.check_expr(&s.lhs);
                let rhs = self.check_expr(&s.rhs);

                // The operator was resolved during binding; checking only
                // needs the operands to fit its parameters. The left side
                // must stay an lvalue since it is also the store target.
                let (lhs, rhs) = {
                    let unaliased = self.comp.graph.unaliased(s.op_symbol);
                    if unaliased == self.comp.natives.error_function {
                        (lhs, rhs)
                    } else {
                        let params: Vec<_> = self
                            .comp
                            .graph
                            .symbol(unaliased)
                            .callable_params()
                            .unwrap_or(&[])
                            .iter()
                            .map(|&p| {
                                self.comp
                                    .graph
                                    .symbol(p)
                                    .get_var_type()
                                    .expect("param has a type")
                            })
                            .collect();
                        if params.len() == 2 {
                            let lhs = create_implicitly_converted(
                                self.comp,
                                &lhs,
                                TypeInfo::lvalue(params[0]),
                                &mut self.diagnostics,
                            );
                            let rhs = create_implicitly_converted(
                                self.comp,
                                &rhs,
                                TypeInfo::rvalue(params[1]),
                                &mut self.diagnostics,
                            );
                            (lhs, rhs)
                        } else {
                            (lhs, rhs)
                        }
                    }
                };

                if Rc::ptr_eq(&lhs, &s.lhs) && Rc::ptr_eq(&rhs, &s.rhs) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::CompoundAssignment(CompoundAssignmentStmt {
                        span: s.span,
                        lhs,
                        rhs,
                        op_symbol: s.op_symbol,
                    }))
                }
            }

            StmtSema::If(s) => {
                let bool_type = self.comp.natives.bool_;
                let mut changed = false;
                let branches: Vec<IfBranchSema> = s
                    .branches
                    .iter()
                    .map(|branch| {
                        let condition = self.check_expr(&branch.condition);
                        let condition = create_implicitly_converted(
                            self.comp,
                            &condition,
                            TypeInfo::rvalue(bool_type),
                            &mut self.diagnostics,
                        );
                        let body = self.check_stmt(&branch.body, ctx);
                        changed |= !Rc::ptr_eq(&condition, &branch.condition)
                            || !Rc::ptr_eq(&body, &branch.body);
                        IfBranchSema { condition, body }
                    })
                    .collect();
                let else_body = s.else_body.as_ref().map(|body| {
                    let checked = self.check_stmt(body, ctx);
                    changed |= !Rc::ptr_eq(&checked, body);
                    checked
                });

                if changed {
                    Rc::new(StmtSema::If(IfStmt {
                        span: s.span,
                        branches,
                        else_body,
                    }))
                } else {
                    stmt.clone()
                }
            }

            StmtSema::While(s) => {
                let bool_type = self.comp.natives.bool_;
                let condition = self.check_expr(&s.condition);
                let condition = create_implicitly_converted(
                    self.comp,
                    &condition,
                    TypeInfo::rvalue(bool_type),
                    &mut self.diagnostics,
                );
                let body = self.check_stmt(&s.body, ctx);
                if Rc::ptr_eq(&condition, &s.condition) && Rc::ptr_eq(&body, &s.body) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::While(WhileStmt {
                        span: s.span,
                        condition,
                        body,
                    }))
                }
            }

            StmtSema::ConditionalJump(s) => {
                let bool_type = self.comp.natives.bool_;
                let condition = self.check_expr(&s.condition);
                let condition = create_implicitly_converted(
                    self.comp,
                    &condition,
                    TypeInfo::rvalue(bool_type),
                    &mut self.diagnostics,
                );
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
                let is_void = self.comp.graph.unaliased(ctx.return_type)
                    == self.comp.graph.unaliased(self.comp.natives.void);

                match (&s.value, is_void) {
                    (Some(_), true) => {
                        self.diagnostics.add(Diagnostic::error(
                            s.span,
                            "a void function cannot return a value",
                        ));
                        stmt.clone()
                    }
                    (None, false) => {
                        self.diagnostics.add(Diagnostic::error(
                            s.span,
                            "this function must return a value",
                        ));
                        stmt.clone()
                    }
                    (None, true) => stmt.clone(),
                    (Some(value), false) => {
                        let checked = self.check_expr(value);
                        let converted = create_implicitly_converted(
                            self.comp,
                            &checked,
                            TypeInfo::rvalue(ctx.return_type),
                            &mut self.diagnostics,
                        );
                        if Rc::ptr_eq(&converted, value) {
                            stmt.clone()
                        } else {
                            Rc::new(StmtSema::Return(ReturnStmt {
                                span: s.span,
                                value: Some(converted),
                            }))
                        }
                    }
                }
            }

            StmtSema::Expr(s) => {
                let expr = self.check_expr(&s.expr);
                if Rc::ptr_eq(&expr, &s.expr) {
                    stmt.clone()
                } else {
                    Rc::new(StmtSema::Expr(ExprStmt { span: s.span, expr }))
                }
            }

            StmtSema::Jump(_) | StmtSema::Label(_) => stmt.clone(),
        }
    }
}

pub(crate) fn all_same_stmts(old: &[Rc<StmtSema>], new: &[Rc<StmtSema>]) -> bool {
    old.len() == new.len() && old.iter().zip(new).all(|(a, b)| Rc::ptr_eq(a, b))
}
