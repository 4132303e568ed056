use crate::lower::Lowerer;
use crate::nodes::{
    AddrOfExpr, AndExpr, BoxExpr, DerefAsExpr, DerefExpr, ExprSema, ExprWrapper, FieldInitSema,
    InstanceCallExpr, InstanceVarRefExpr, NotExpr, OrExpr, RefExpr, StaticCallExpr,
    StructConstructionExpr, UnboxExpr,
};
use crate::typecheck::typecheck_expressions::all_same;
use shared_context::interner::NameId;
use std::rc::Rc;
use symbol_graph::symbols::Symbol;
use symbol_graph::{ScopeId, SymbolId};

impl Lowerer<'_, '_> {
    /// Lowers one expression. Unchanged subtrees come back as the same
    /// allocation, so `lower(lower(e))` is `lower(e)` by pointer equality.
    pub(crate) fn lower_expr(&mut self, expr: &Rc<ExprSema>) -> Rc<ExprSema> {
        match expr.as_ref() {
            ExprSema::Literal(_)
            | ExprSema::StaticVarRef(_)
            | ExprSema::SizeOf(_)
            | ExprSema::ConversionPlaceholder(_) => expr.clone(),

            // lhs op rhs  ->  Type::op(lhs, rhs)
            ExprSema::UserBinary(e) => {
                let lhs = self.lower_expr(&e.lhs);
                let rhs = self.lower_expr(&e.rhs);
                Rc::new(ExprSema::StaticCall(StaticCallExpr {
                    span: e.span,
                    function: e.op_symbol,
                    args: vec![lhs, rhs],
                }))
            }

            ExprSema::UserUnary(e) => {
                let operand = self.lower_expr(&e.operand);
                Rc::new(ExprSema::StaticCall(StaticCallExpr {
                    span: e.span,
                    function: e.op_symbol,
                    args: vec![operand],
                }))
            }

            // box e  ->  StrongPtr[T]::new(e)
            ExprSema::Box_(e) => {
                let operand = self.lower_expr(&e.operand);
                match self.find_member_function(e.ptr_type, "new") {
                    Some(new_fn) => Rc::new(ExprSema::StaticCall(StaticCallExpr {
                        span: e.span,
                        function: new_fn,
                        args: vec![operand],
                    })),
                    None => {
                        if Rc::ptr_eq(&operand, &e.operand) {
                            expr.clone()
                        } else {
                            Rc::new(ExprSema::Box_(BoxExpr {
                                span: e.span,
                                operand,
                                ptr_type: e.ptr_type,
                            }))
                        }
                    }
                }
            }

            // unbox e  ->  StrongPtr[T]::value(e)
            ExprSema::Unbox(e) => {
                let operand = self.lower_expr(&e.operand);
                let ptr_type = operand.type_info(self.comp).symbol;
                match self.find_member_function(ptr_type, "value") {
                    Some(value_fn) => Rc::new(ExprSema::StaticCall(StaticCallExpr {
                        span: e.span,
                        function: value_fn,
                        args: vec![operand],
                    })),
                    None => {
                        if Rc::ptr_eq(&operand, &e.operand) {
                            expr.clone()
                        } else {
                            Rc::new(ExprSema::Unbox(UnboxExpr {
                                span: e.span,
                                operand,
                                value_type: e.value_type,
                            }))
                        }
                    }
                }
            }

            ExprSema::InstanceVarRef(e) => {
                let base = self.lower_expr(&e.base);
                if Rc::ptr_eq(&base, &e.base) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::InstanceVarRef(InstanceVarRefExpr {
                        span: e.span,
                        base,
                        field: e.field,
                        ty: e.ty,
                    }))
                }
            }

            ExprSema::StaticCall(e) => {
                let args: Vec<Rc<ExprSema>> = e.args.iter().map(|a| self.lower_expr(a)).collect();
                if all_same(&e.args, &args) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::StaticCall(StaticCallExpr {
                        span: e.span,
                        function: e.function,
                        args,
                    }))
                }
            }

            ExprSema::InstanceCall(e) => {
                let base = self.lower_expr(&e.base);
                let args: Vec<Rc<ExprSema>> = e.args.iter().map(|a| self.lower_expr(a)).collect();
                if Rc::ptr_eq(&base, &e.base) && all_same(&e.args, &args) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::InstanceCall(InstanceCallExpr {
                        span: e.span,
                        base,
                        function: e.function,
                        args,
                    }))
                }
            }

            ExprSema::And(e) => {
                let lhs = self.lower_expr(&e.lhs);
                let rhs = self.lower_expr(&e.rhs);
                if Rc::ptr_eq(&lhs, &e.lhs) && Rc::ptr_eq(&rhs, &e.rhs) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::And(AndExpr {
                        span: e.span,
                        lhs,
                        rhs,
                        bool_type: e.bool_type,
                    }))
                }
            }

            ExprSema::Or(e) => {
                let lhs = self.lower_expr(&e.lhs);
                let rhs = self.lower_expr(&e.rhs);
                if Rc::ptr_eq(&lhs, &e.lhs) && Rc::ptr_eq(&rhs, &e.rhs) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::Or(OrExpr {
                        span: e.span,
                        lhs,
                        rhs,
                        bool_type: e.bool_type,
                    }))
                }
            }

            ExprSema::Not(e) => {
                let operand = self.lower_expr(&e.operand);
                if Rc::ptr_eq(&operand, &e.operand) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::Not(NotExpr {
                        span: e.span,
                        operand,
                        bool_type: e.bool_type,
                    }))
                }
            }

            ExprSema::AddrOf(e) => {
                let operand = self.lower_expr(&e.operand);
                if Rc::ptr_eq(&operand, &e.operand) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::AddrOf(AddrOfExpr {
                        span: e.span,
                        operand,
                        ptr_type: e.ptr_type,
                    }))
                }
            }

            ExprSema::Deref(e) => {
                let operand = self.lower_expr(&e.operand);
                if Rc::ptr_eq(&operand, &e.operand) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::Deref(DerefExpr {
                        span: e.span,
                        operand,
                        ty: e.ty,
                    }))
                }
            }

            ExprSema::DerefAs(e) => {
                let operand = self.lower_expr(&e.operand);
                if Rc::ptr_eq(&operand, &e.operand) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::DerefAs(DerefAsExpr {
                        span: e.span,
                        operand,
                        target_type: e.target_type,
                    }))
                }
            }

            ExprSema::Ref(e) => {
                let operand = self.lower_expr(&e.operand);
                if Rc::ptr_eq(&operand, &e.operand) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::Ref(RefExpr {
                        span: e.span,
                        operand,
                        ref_type: e.ref_type,
                    }))
                }
            }

            ExprSema::StructConstruction(e) => {
                let mut changed = false;
                let args: Vec<FieldInitSema> = e
                    .args
                    .iter()
                    .map(|arg| {
                        let value = self.lower_expr(&arg.value);
                        changed |= !Rc::ptr_eq(&value, &arg.value);
                        FieldInitSema {
                            field: arg.field,
                            value,
                        }
                    })
                    .collect();
                if changed {
                    Rc::new(ExprSema::StructConstruction(StructConstructionExpr {
                        span: e.span,
                        struct_type: e.struct_type,
                        args,
                    }))
                } else {
                    expr.clone()
                }
            }

            ExprSema::Expr(e) => {
                let inner = self.lower_expr(&e.inner);
                if Rc::ptr_eq(&inner, &e.inner) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::Expr(ExprWrapper {
                        span: e.span,
                        inner,
                    }))
                }
            }
        }
    }

    /// An associated function declared in the type's body scope. For a
    /// placeholder instance whose body was never elaborated, the root's
    /// body provides the (placeholder) member instead.
    pub(crate) fn find_member_function(&self, ty: SymbolId, name: &str) -> Option<SymbolId> {
        let name_id = self.comp.interner.get(name)?;
        let ty = self.comp.graph.unaliased(ty);

        if let Some(found) = self.find_in_body(ty, name_id) {
            return Some(found);
        }
        let root = self.comp.graph.symbol(ty).get_generic_root_hint()?;
        self.find_in_body(root, name_id)
    }

    fn find_in_body(&self, ty: SymbolId, name: NameId) -> Option<SymbolId> {
        let body: ScopeId = self.comp.graph.symbol(ty).get_body_scope()?;
        self.comp
            .graph
            .scope(body)
            .get_symbols_named(name)
            .iter()
            .copied()
            .find(|&s| matches!(self.comp.graph.symbol(s), Symbol::Function(_)))
    }
}
