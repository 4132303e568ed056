use crate::bind::Binder;
use crate::conversions;
use crate::nodes::{
    AddrOfExpr, AndExpr, BoxExpr, DerefAsExpr, ExprSema, ExprWrapper, FieldInitSema,
    InstanceCallExpr, InstanceVarRefExpr, LiteralExpr, NotExpr, OrExpr, SizeOfExpr,
    StaticCallExpr, StaticVarRefExpr, StructConstructionExpr, UnboxExpr, UserBinaryExpr,
    UserUnaryExpr,
};
use shared_context::Span;
use shared_context::diagnostics::Diagnostic;
use std::collections::HashMap;
use std::rc::Rc;
use symbol_graph::symbols::Symbol;
use symbol_graph::{SymbolId, TypeInfo, resolution};
use syntax::{Expression, InnerExpression, NameSection};

impl Binder<'_, '_> {
    pub(crate) fn bind_expression(&mut self, expr: &Expression) -> Rc<ExprSema> {
        let span = expr.get_span();

        match expr.get_inner() {
            InnerExpression::Literal { kind, text } => {
                let ty = self.comp.natives.literal_type(*kind);
                Rc::new(ExprSema::Literal(LiteralExpr {
                    span,
                    kind: *kind,
                    text: text.clone(),
                    ty,
                }))
            }

            InnerExpression::SymbolName(name) => {
                let symbol = self.resolve_static(name, None);
                self.bind_symbol_as_value(symbol, span)
            }

            InnerExpression::MemberAccess { base, member } => {
                let bound_base = self.bind_expression(base);
                let base_info = bound_base.type_info(self.comp);
                let symbol = self.diagnostics.collect(resolution::resolve_instance_symbol(
                    self.comp,
                    self.current_scope,
                    base_info.symbol,
                    member,
                    None,
                ));

                match self.comp.graph.symbol(self.comp.graph.unaliased(symbol)) {
                    Symbol::Field(field) => {
                        let ty = field.var_type;
                        Rc::new(ExprSema::InstanceVarRef(InstanceVarRefExpr {
                            span,
                            base: bound_base,
                            field: symbol,
                            ty,
                        }))
                    }
                    Symbol::ErrorType(_) => self.error_expr(span),
                    _ => {
                        self.diagnostics.add(Diagnostic::error(
                            span,
                            format!(
                                "{} cannot be used as a value",
                                self.comp.symbol_phrase(symbol)
                            ),
                        ));
                        self.error_expr(span)
                    }
                }
            }

            InnerExpression::FunctionCall { target, args } => self.bind_call(target, args, span),

            InnerExpression::StructConstruction { type_name, fields } => {
                self.bind_struct_construction(type_name, fields, span)
            }

            InnerExpression::Unary { op, operand } => {
                let operand = self.bind_expression(operand);
                let info = operand.type_info(self.comp);
                let op_symbol = self.resolve_operator(info.symbol, op.op_name(), &[info], span);
                Rc::new(ExprSema::UserUnary(UserUnaryExpr {
                    span,
                    operand,
                    op_symbol,
                }))
            }

            InnerExpression::Binary { op, lhs, rhs } => {
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
                Rc::new(ExprSema::UserBinary(UserBinaryExpr {
                    span,
                    lhs,
                    rhs,
                    op_symbol,
                }))
            }

            InnerExpression::And { lhs, rhs } => Rc::new(ExprSema::And(AndExpr {
                span,
                lhs: self.bind_expression(lhs),
                rhs: self.bind_expression(rhs),
                bool_type: self.comp.natives.bool_,
            })),

            InnerExpression::Or { lhs, rhs } => Rc::new(ExprSema::Or(OrExpr {
                span,
                lhs: self.bind_expression(lhs),
                rhs: self.bind_expression(rhs),
                bool_type: self.comp.natives.bool_,
            })),

            InnerExpression::Not { operand } => Rc::new(ExprSema::Not(NotExpr {
                span,
                operand: self.bind_expression(operand),
                bool_type: self.comp.natives.bool_,
            })),

            InnerExpression::AddrOf { operand } => Rc::new(ExprSema::AddrOf(AddrOfExpr {
                span,
                operand: self.bind_expression(operand),
                ptr_type: self.comp.natives.ptr,
            })),

            InnerExpression::Box { operand } => {
                let operand = self.bind_expression(operand);
                let value_type = operand.type_info(self.comp).symbol;
                let ptr_type = if self.comp.is_error_type(value_type) {
                    self.comp.error_type()
                } else {
                    let root = self.comp.natives.strong_ptr_root;
                    self.diagnostics
                        .collect(self.comp.instantiate(span, root, vec![value_type]))
                };
                Rc::new(ExprSema::Box_(BoxExpr {
                    span,
                    operand,
                    ptr_type,
                }))
            }

            InnerExpression::Unbox { operand } => {
                let operand = self.bind_expression(operand);
                let operand_type = operand.type_info(self.comp).symbol;
                // the strong-pointer requirement itself is a type-check
                // invariant; binding just records the best-known pointee
                let value_type = if self.comp.is_strong_ptr_type(operand_type) {
                    self.comp
                        .pointee_type(operand_type)
                        .unwrap_or_else(|| self.comp.error_type())
                } else {
                    self.comp.error_type()
                };
                Rc::new(ExprSema::Unbox(UnboxExpr {
                    span,
                    operand,
                    value_type,
                }))
            }

            InnerExpression::Cast { type_name, operand } => {
                let operand = self.bind_expression(operand);
                let target = self.resolve_type(type_name);
                conversions::create_explicitly_converted(
                    self.comp,
                    &operand,
                    TypeInfo::rvalue(target),
                    &mut self.diagnostics,
                )
            }

            InnerExpression::DerefAs { type_name, operand } => {
                let operand = self.bind_expression(operand);
                let target_type = self.resolve_type(type_name);
                Rc::new(ExprSema::DerefAs(DerefAsExpr {
                    span,
                    operand,
                    target_type,
                }))
            }

            InnerExpression::SizeOf { type_name } => {
                let target_type = self.resolve_type(type_name);
                Rc::new(ExprSema::SizeOf(SizeOfExpr {
                    span,
                    target_type,
                    int_type: self.comp.natives.int,
                }))
            }

            InnerExpression::Paren { operand } => Rc::new(ExprSema::Expr(ExprWrapper {
                span,
                inner: self.bind_expression(operand),
            })),
        }
    }

    /// A resolved name used in value position: variables become static var
    /// references, anything else is diagnosed.
    fn bind_symbol_as_value(&mut self, symbol: SymbolId, span: Span) -> Rc<ExprSema> {
        let unaliased = self.comp.graph.unaliased(symbol);
        match self.comp.graph.symbol(unaliased) {
            Symbol::Local(_) | Symbol::Param(_) | Symbol::SelfParam(_) | Symbol::StaticVar(_) => {
                let ty = self
                    .comp
                    .graph
                    .symbol(unaliased)
                    .get_var_type()
                    .unwrap_or_else(|| self.comp.error_type());
                Rc::new(ExprSema::StaticVarRef(StaticVarRefExpr {
                    span,
                    var: symbol,
                    ty,
                }))
            }
            Symbol::Field(_) => {
                self.diagnostics.add(Diagnostic::error(
                    span,
                    "an instance field needs a value to be accessed on",
                ));
                self.error_expr(span)
            }
            Symbol::ErrorType(_) => self.error_expr(span),
            _ => {
                self.diagnostics.add(Diagnostic::error(
                    span,
                    format!(
                        "{} cannot be used as a value",
                        self.comp.symbol_phrase(symbol)
                    ),
                ));
                self.error_expr(span)
            }
        }
    }

    /// Calls dispatch on the shape of the callee: a plain name is a static
    /// call, a member access an instance call.
    fn bind_call(&mut self, target: &Expression, args: &[Expression], span: Span) -> Rc<ExprSema> {
        let bound_args: Vec<Rc<ExprSema>> = args.iter().map(|a| self.bind_expression(a)).collect();
        let arg_infos: Vec<TypeInfo> = bound_args
            .iter()
            .map(|a| a.type_info(self.comp))
            .collect();

        match target.get_inner() {
            InnerExpression::SymbolName(name) => {
                let function = self.resolve_static(name, Some(&arg_infos));
                Rc::new(ExprSema::StaticCall(StaticCallExpr {
                    span,
                    function,
                    args: bound_args,
                }))
            }
            InnerExpression::MemberAccess { base, member } => {
                let bound_base = self.bind_expression(base);
                let base_info = bound_base.type_info(self.comp);
                let function = self.diagnostics.collect(resolution::resolve_instance_symbol(
                    self.comp,
                    self.current_scope,
                    base_info.symbol,
                    member,
                    Some(&arg_infos),
                ));
                Rc::new(ExprSema::InstanceCall(InstanceCallExpr {
                    span,
                    base: bound_base,
                    function,
                    args: bound_args,
                }))
            }
            _ => {
                self.bind_expression(target);
                self.diagnostics
                    .add(Diagnostic::error(span, "this expression is not callable"));
                self.error_expr(span)
            }
        }
    }

    /// Struct construction: every declared field initialized exactly once,
    /// every named field unique and known, arguments ordered by field
    /// index.
    fn bind_struct_construction(
        &mut self,
        type_name: &syntax::QualifiedName,
        field_inits: &[syntax::FieldInit],
        span: Span,
    ) -> Rc<ExprSema> {
        let struct_type = self.resolve_type(type_name);
        if self.comp.is_error_type(struct_type) {
            return self.error_expr(span);
        }
        if !matches!(
            self.comp.graph.symbol(self.comp.graph.unaliased(struct_type)),
            Symbol::Struct(_)
        ) {
            self.diagnostics.add(Diagnostic::error(
                span,
                format!("{} is not a struct", self.comp.symbol_phrase(struct_type)),
            ));
            return self.error_expr(span);
        }

        let fields = self.comp.struct_fields(struct_type);

        // Bind the written initializers, diagnosing duplicates and unknown
        // names as they appear.
        let mut seen: HashMap<shared_context::interner::NameId, Span> = HashMap::new();
        let mut by_name: HashMap<shared_context::interner::NameId, Rc<ExprSema>> = HashMap::new();

        for init in field_inits {
            let name = init.get_name().get_name();
            let init_span = init.get_name().get_span();

            if let Some(&first) = seen.get(&name) {
                self.diagnostics.add(
                    Diagnostic::error(
                        init_span,
                        format!(
                            "field `{}` is initialized twice",
                            self.comp.interner.lookup(name)
                        ),
                    )
                    .with_note(shared_context::diagnostics::DiagnosticNote::new(
                        "first initialized here",
                        Some(first),
                    )),
                );
                continue;
            }
            seen.insert(name, init_span);

            let known = fields
                .iter()
                .any(|&f| self.comp.graph.symbol(f).get_name().get_name() == name);
            if !known {
                self.diagnostics.add(Diagnostic::error(
                    init_span,
                    format!(
                        "struct has no field named `{}`",
                        self.comp.interner.lookup(name)
                    ),
                ));
                continue;
            }

            let value = self.bind_expression(init.get_value());
            by_name.insert(name, value);
        }

        // Emit the arguments in field-index order, diagnosing anything the
        // construction left out.
        let mut args = Vec::with_capacity(fields.len());
        for field in fields {
            let field_name = self.comp.graph.symbol(field).get_name().get_name();
            match by_name.remove(&field_name) {
                Some(value) => args.push(FieldInitSema { field, value }),
                None => {
                    self.diagnostics.add(Diagnostic::error(
                        span,
                        format!(
                            "field `{}` is not initialized",
                            self.comp.interner.lookup(field_name)
                        ),
                    ));
                    let placeholder = self.error_expr(span);
                    args.push(FieldInitSema {
                        field,
                        value: placeholder,
                    });
                }
            }
        }

        Rc::new(ExprSema::StructConstruction(StructConstructionExpr {
            span,
            struct_type,
            args,
        }))
    }

    /// Resolves an `op_*` associated function on the (dereferenced) type
    /// of the operand. Native types carry these in their own body scopes;
    /// user types provide them through impls.
    pub(crate) fn resolve_operator(
        &mut self,
        operand_type: SymbolId,
        op_name: &str,
        arg_infos: &[TypeInfo],
        span: Span,
    ) -> SymbolId {
        if self.comp.is_error_type(operand_type) {
            return self.comp.natives.error_function;
        }
        let ident = self.comp.intern_ident(op_name, span);
        let section = NameSection::plain(ident);
        self.diagnostics.collect(resolution::resolve_instance_symbol(
            self.comp,
            self.current_scope,
            operand_type,
            &section,
            Some(arg_infos),
        ))
    }
}
