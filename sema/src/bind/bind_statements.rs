use crate::bind::Binder;
use crate::nodes::{
    BlockStmt, CompoundAssignmentStmt, ExprStmt, IfBranchSema, IfStmt, NormalAssignmentStmt,
    ReturnStmt, StmtSema, VarStmt, WhileStmt,
};
use shared_context::diagnostics::Diagnostic;
use std::rc::Rc;
use symbol_graph::scope::ScopeKind;
use symbol_graph::symbols::{LocalVarSymbol, Symbol};
use syntax::{Block, InnerStatement, Statement};

impl Binder<'_, '_> {
    /// Binds a block, opening a fresh lexical scope for its statements.
    pub(crate) fn bind_block(&mut self, block: &Block) -> Rc<StmtSema> {
        let scope = self
            .comp
            .graph
            .create_scope(self.current_scope, ScopeKind::Block, None);

        let outer = self.current_scope;
        self.current_scope = scope;

        let stmts = block
            .get_statements()
            .iter()
            .map(|stmt| self.bind_statement(stmt))
            .collect();

        self.current_scope = outer;

        Rc::new(StmtSema::Block(BlockStmt {
            span: block.get_span(),
            scope,
            stmts,
        }))
    }

    pub(crate) fn bind_statement(&mut self, stmt: &Statement) -> Rc<StmtSema> {
        let span = stmt.get_span();

        match stmt.get_inner() {
            InnerStatement::Block(block) => self.bind_block(block),

            InnerStatement::Var {
                name,
                type_name,
                init,
            } => {
                let bound_init = init.as_ref().map(|expr| self.bind_expression(expr));
                let declared_type = type_name.as_ref().map(|ty| self.resolve_type(ty));

                let var_type = match (declared_type, &bound_init) {
                    (Some(ty), _) => ty,
                    (None, Some(init)) => init.type_info(self.comp).symbol,
                    (None, None) => {
                        self.diagnostics.add(Diagnostic::error(
                            span,
                            "a variable needs a type annotation or an initializer",
                        ));
                        self.comp.error_type()
                    }
                };

                let symbol = self.diagnostics.collect(self.comp.graph.declare_symbol(
                    Symbol::Local(LocalVarSymbol {
                        scope: self.current_scope,
                        name: *name,
                        var_type,
                    }),
                ));

                Rc::new(StmtSema::Var(VarStmt {
                    span,
                    symbol,
                    init: bound_init,
                }))
            }

            InnerStatement::Assignment { lhs, rhs } => {
                let lhs = self.bind_expression(lhs);
                let rhs = self.bind_expression(rhs);
                Rc::new(StmtSema::NormalAssignment(NormalAssignmentStmt {
                    span,
                    lhs,
                    rhs,
                }))
            }

            InnerStatement::CompoundAssignment { lhs, op, rhs } => {
                let lhs = self.bind_expression(lhs);
                let rhs = self.bind_expression(rhs);

                let lhs_info = lhs.type_info(self.comp);
                let rhs_info = rhs.type_info(self.comp);
                let op_symbol = self.resolve_operator(
                    lhs_info.symbol,
                    op.op_name(),
                    &[lhs_info, rhs_info],
                    span,
                );

                Rc::new(StmtSema::CompoundAssignment(CompoundAssignmentStmt {
                    span,
                    lhs,
                    rhs,
                    op_symbol,
                }))
            }

            InnerStatement::If {
                branches,
                else_body,
            } => {
                let bound_branches = branches
                    .iter()
                    .map(|branch| IfBranchSema {
                        condition: self.bind_expression(branch.get_condition()),
                        body: self.bind_block(branch.get_body()),
                    })
                    .collect();
                let bound_else = else_body.as_ref().map(|block| self.bind_block(block));

                Rc::new(StmtSema::If(IfStmt {
                    span,
                    branches: bound_branches,
                    else_body: bound_else,
                }))
            }

            InnerStatement::While { condition, body } => {
                let condition = self.bind_expression(condition);
                let body = self.bind_block(body);
                Rc::new(StmtSema::While(WhileStmt {
                    span,
                    condition,
                    body,
                }))
            }

            InnerStatement::Return { value } => {
                let value = value.as_ref().map(|expr| self.bind_expression(expr));
                Rc::new(StmtSema::Return(ReturnStmt { span, value }))
            }

            InnerStatement::Expr(expr) => {
                let expr = self.bind_expression(expr);
                Rc::new(StmtSema::Expr(ExprStmt { span, expr }))
            }
        }
    }
}
