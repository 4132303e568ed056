use crate::conversions::create_implicitly_converted;
use crate::nodes::{
    AndExpr, BoxExpr, DerefAsExpr, DerefExpr, ExprSema, ExprWrapper, FieldInitSema,
    InstanceCallExpr, InstanceVarRefExpr, NotExpr, OrExpr, RefExpr, StaticCallExpr,
    StructConstructionExpr, UnboxExpr, UserBinaryExpr, UserUnaryExpr, AddrOfExpr,
};
use crate::typecheck::TypeChecker;
use shared_context::diagnostics::Diagnostic;
use std::rc::Rc;
use symbol_graph::symbols::Symbol;
use symbol_graph::{SymbolId, TypeInfo};

impl TypeChecker<'_, '_> {
    /// Checks one expression, returning the same `Rc` when nothing below
    /// it changed.
    pub(crate) fn check_expr(&mut self, expr: &Rc<ExprSema>) -> Rc<ExprSema> {
        match expr.as_ref() {
            ExprSema::Literal(_)
            | ExprSema::StaticVarRef(_)
            | ExprSema::SizeOf(_)
            | ExprSema::ConversionPlaceholder(_) => expr.clone(),

            ExprSema::InstanceVarRef(e) => {
                let base = self.check_expr(&e.base);
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
                let checked: Vec<Rc<ExprSema>> =
                    e.args.iter().map(|a| self.check_expr(a)).collect();
                let converted = self.convert_call_args(e.function, &checked);
                if all_same(&e.args, &converted) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::StaticCall(StaticCallExpr {
                        span: e.span,
                        function: e.function,
                        args: converted,
                    }))
                }
            }

            ExprSema::InstanceCall(e) => {
                let base = self.check_expr(&e.base);
                let base = self.convert_call_base(e.function, &base);
                let checked: Vec<Rc<ExprSema>> =
                    e.args.iter().map(|a| self.check_expr(a)).collect();
                let converted = self.convert_call_args(e.function, &checked);
                if Rc::ptr_eq(&base, &e.base) && all_same(&e.args, &converted) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::InstanceCall(InstanceCallExpr {
                        span: e.span,
                        base,
                        function: e.function,
                        args: converted,
                    }))
                }
            }

            ExprSema::UserUnary(e) => {
                let operand = self.check_expr(&e.operand);
                let converted = self.convert_call_args(e.op_symbol, &[operand]);
                let operand = converted.into_iter().next().expect("one operand");
                if Rc::ptr_eq(&operand, &e.operand) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::UserUnary(UserUnaryExpr {
                        span: e.span,
                        operand,
                        op_symbol: e.op_symbol,
                    }))
                }
            }

            ExprSema::UserBinary(e) => {
                let lhs = self.check_expr(&e.lhs);
                let rhs = self.check_expr(&e.rhs);
                let converted = self.convert_call_args(e.op_symbol, &[lhs, rhs]);
                let mut it = converted.into_iter();
                let lhs = it.next().expect("lhs");
                let rhs = it.next().expect("rhs");
                if Rc::ptr_eq(&lhs, &e.lhs) && Rc::ptr_eq(&rhs, &e.rhs) {
                    expr.clone()
                } else {
                    Rc::new(ExprSema::UserBinary(UserBinaryExpr {
                        span: e.span,
                        lhs,
                        rhs,
                        op_symbol: e.op_symbol,
                    }))
                }
            }

            ExprSema::And(e) => {
                let lhs = self.check_bool_operand(&e.lhs, e.bool_type);
                let rhs = self.check_bool_operand(&e.rhs, e.bool_type);
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
                let lhs = self.check_bool_operand(&e.lhs, e.bool_type);
                let rhs = self.check_bool_operand(&e.rhs, e.bool_type);
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
                let operand = self.check_bool_operand(&e.operand, e.bool_type);
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
                let operand = self.check_expr(&e.operand);
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
                let operand = self.check_expr(&e.operand);
                let operand_type = operand.type_info(self.comp).symbol;
                if !self.comp.is_ref_type(operand_type)
                    && !self.comp.is_strong_ptr_type(operand_type)
                    && !self.comp.is_error_type(operand_type)
                {
                    self.diagnostics.add(Diagnostic::error(
                        e.span,
                        format!(
                            "cannot dereference {}",
                            self.comp.symbol_phrase(operand_type)
                        ),
                    ));
                }
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
                let operand = self.check_expr(&e.operand);
                let operand_type = operand.type_info(self.comp).symbol;
                if !self.comp.is_ptr_type(operand_type)
                    && !self.comp.is_ref_type(operand_type)
                    && !self.comp.is_error_type(operand_type)
                {
                    self.diagnostics.add(Diagnostic::error(
                        e.span,
                        "deref_as needs a Ptr or reference operand",
                    ));
                }
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
                let operand = self.check_expr(&e.operand);
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

            ExprSema::Box_(e) => {
                let operand = self.check_expr(&e.operand);
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

            ExprSema::Unbox(e) => {
                let operand = self.check_expr(&e.operand);
                let operand_type = operand.type_info(self.comp).symbol;
                if !self.comp.is_strong_ptr_type(operand_type)
                    && !self.comp.is_error_type(operand_type)
                {
                    self.diagnostics.add(Diagnostic::error(
                        e.span,
                        format!(
                            "unbox needs a strong pointer, got {}",
                            self.comp.symbol_phrase(operand_type)
                        ),
                    ));
                }
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

            ExprSema::StructConstruction(e) => {
                let mut changed = false;
                let mut args = Vec::with_capacity(e.args.len());
                for arg in &e.args {
                    let value = self.check_expr(&arg.value);
                    let field_type = self
                        .comp
                        .graph
                        .symbol(arg.field)
                        .get_var_type()
                        .unwrap_or_else(|| self.comp.error_type());
                    let value = create_implicitly_converted(
                        self.comp,
                        &value,
                        TypeInfo::rvalue(field_type),
                        &mut self.diagnostics,
                    );
                    changed |= !Rc::ptr_eq(&value, &arg.value);
                    args.push(FieldInitSema {
                        field: arg.field,
                        value,
                    });
                }
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
                let inner = self.check_expr(&e.inner);
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

    /// Converts each call argument to its parameter type. Calls through
    /// the error function skip conversions; their failure was already
    /// reported.
    pub(crate) fn convert_call_args(
        &mut self,
        function: SymbolId,
        args: &[Rc<ExprSema>],
    ) -> Vec<Rc<ExprSema>> {
        let unaliased = self.comp.graph.unaliased(function);
        if matches!(self.comp.graph.symbol(unaliased), Symbol::ErrorType(_))
            || unaliased == self.comp.natives.error_function
        {
            return args.to_vec();
        }

        let param_types: Vec<SymbolId> = self
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

        if param_types.len() != args.len() {
            self.diagnostics.add(Diagnostic::fatal_internal(
                args.first().map(|a| a.span()).unwrap_or_default(),
                "argument count does not match the resolved callable",
            ));
            return args.to_vec();
        }

        args.iter()
            .zip(param_types)
            .map(|(arg, param_type)| {
                create_implicitly_converted(
                    self.comp,
                    arg,
                    TypeInfo::rvalue(param_type),
                    &mut self.diagnostics,
                )
            })
            .collect()
    }

    /// Converts an instance call's base to the callee's self parameter
    /// type (`&T`), which inserts the auto-ref or auto-deref.
    fn convert_call_base(&mut self, function: SymbolId, base: &Rc<ExprSema>) -> Rc<ExprSema> {
        let unaliased = self.comp.graph.unaliased(function);

        // Prototype dispatch keeps the base as the trait object.
        if matches!(self.comp.graph.symbol(unaliased), Symbol::Prototype(_)) {
            return base.clone();
        }

        let Some(self_param) = self.comp.graph.symbol(unaliased).callable_self_param() else {
            return base.clone();
        };
        let self_type = self
            .comp
            .graph
            .symbol(self_param)
            .get_var_type()
            .expect("self param has a type");

        create_implicitly_converted(
            self.comp,
            base,
            TypeInfo::rvalue(self_type),
            &mut self.diagnostics,
        )
    }

    fn check_bool_operand(&mut self, operand: &Rc<ExprSema>, bool_type: SymbolId) -> Rc<ExprSema> {
        let operand = self.check_expr(operand);
        create_implicitly_converted(
            self.comp,
            &operand,
            TypeInfo::rvalue(bool_type),
            &mut self.diagnostics,
        )
    }
}

pub(crate) fn all_same(old: &[Rc<ExprSema>], new: &[Rc<ExprSema>]) -> bool {
    old.len() == new.len() && old.iter().zip(new).all(|(a, b)| Rc::ptr_eq(a, b))
}
