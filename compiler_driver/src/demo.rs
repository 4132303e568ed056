// The demo program the driver stages run. The parser and the declaration
// binder live outside this workspace, so this module plays their part:
// it declares the top-level symbols through the symbol graph API and
// hands the function bodies over as syntax blocks.

use shared_context::diagnostics::DiagnosticBag;
use shared_context::{Ident, Span};
use sema::FunctionBinding;
use symbol_graph::scope::ScopeKind;
use symbol_graph::symbols::{
    BodyKind, FieldVarSymbol, FunctionSymbol, ParamVarSymbol, PrototypeSymbol, SelfParamVarSymbol,
    StructSymbol, Symbol, TraitImplSymbol, TraitSelfSymbol, TraitSymbol, TypeParamSymbol,
};
use symbol_graph::{AccessModifier, Compilation, ScopeId, SymbolCategory, SymbolId};
use syntax::{
    BinaryOp, Block, Expression, FieldInit, IfBranch, InnerExpression, InnerStatement, LiteralKind,
    NameRoot, NameSection, QualifiedName, Statement,
};

/// The source text the spans below point into, so rendered diagnostics
/// line up with something readable.
pub const SOURCE: &str = "\
struct Point { x: Int32, y: Int32 }

impl Point {
    fn op_add(a: Point, b: Point) -> Point {
        return Point { x: a.x + b.x, y: a.y + b.y };
    }
}

trait Doubled {
    fn doubled(self) -> Int32;
}

impl Doubled for Point {
    fn doubled(self) -> Int32 {
        return self.x + self.x;
    }
}

fn id[T](x: T) -> T {
    return x;
}

fn main() -> Int32 {
    let p: Point = Point { x: 1, y: 2 };
    let q: Point = p + p;
    let d: Int32 = q.doubled();
    let n: Int32 = id(d);
    let keep: Bool = true and n < 100;
    let boxed: StrongPtr[Int32] = box n;
    let total: Int32 = unbox boxed;
    if keep {
        return total;
    }
    return 0;
}
";

/// Declares the demo program into the compilation and returns the
/// function-body bindings the sema pipeline consumes.
pub fn declare_program(comp: &mut Compilation<'_>) -> (Vec<FunctionBinding>, DiagnosticBag) {
    let mut declarer = Declarer {
        comp,
        diagnostics: DiagnosticBag::new(),
    };
    let bindings = declarer.run();
    (bindings, declarer.diagnostics)
}

struct Declarer<'c, 'a> {
    comp: &'c mut Compilation<'a>,
    diagnostics: DiagnosticBag,
}

impl Declarer<'_, '_> {
    fn run(&mut self) -> Vec<FunctionBinding> {
        let global = self.comp.graph.global_scope();
        let int32 = self.comp.natives.int32;

        // struct Point { x: Int32, y: Int32 }
        let point = self.declare_struct(global, "Point", 1, &[("x", int32), ("y", int32)]);

        // impl Point { fn op_add(a: Point, b: Point) -> Point }
        let impl_scope = self.declare_inherent_impl(global, point, 3);
        let op_add = self.declare_function(
            impl_scope,
            "op_add",
            4,
            &[("a", point), ("b", point)],
            None,
            point,
        );

        // trait Doubled { fn doubled(self) -> Int32; }
        let (doubled_trait, trait_scope, trait_self) = self.declare_trait(global, "Doubled", 9);
        self.declare_prototype(trait_scope, doubled_trait, trait_self, "doubled", 10, int32);

        // impl Doubled for Point { fn doubled(self) -> Int32 }
        let trait_impl_scope = self.declare_trait_impl(global, point, doubled_trait, 13);
        let doubled_fn =
            self.declare_method(trait_impl_scope, "doubled", 14, point, &[], int32);

        // fn id[T](x: T) -> T
        let id_fn = self.declare_generic_identity(global, 19);

        // fn main() -> Int32
        let main_fn = self.declare_function(global, "main", 23, &[], None, int32);

        vec![
            FunctionBinding::new(op_add, self.op_add_body()),
            FunctionBinding::new(doubled_fn, self.doubled_body()),
            FunctionBinding::new(id_fn, self.id_body()),
            FunctionBinding::new(main_fn, self.main_body()),
        ]
    }

    // ---- declarations -------------------------------------------------

    fn declare_struct(
        &mut self,
        scope: ScopeId,
        name: &str,
        line: usize,
        fields: &[(&str, SymbolId)],
    ) -> SymbolId {
        let ident = self.ident(name, line);
        let body = self
            .comp
            .graph
            .create_scope(scope, ScopeKind::TypeBody, Some(ident.get_name()));

        for (index, &(field_name, field_type)) in fields.iter().enumerate() {
            let field_ident = self.ident(field_name, line);
            let declared = self.comp.graph.declare_symbol(Symbol::Field(FieldVarSymbol {
                scope: body,
                name: field_ident,
                access: AccessModifier::Public,
                var_type: field_type,
                index,
            }));
            self.diagnostics.collect(declared);
        }

        let declared = self.comp.graph.declare_symbol(Symbol::Struct(StructSymbol::new(
            scope,
            body,
            ident,
            AccessModifier::Public,
            Vec::new(),
            Vec::new(),
        )));
        self.diagnostics.collect(declared)
    }

    fn declare_inherent_impl(&mut self, scope: ScopeId, target: SymbolId, line: usize) -> ScopeId {
        let target_name = self.comp.graph.symbol(target).get_name();
        let body = self
            .comp
            .graph
            .create_scope(scope, ScopeKind::ImplBody, Some(target_name.get_name()));

        let ident = self.ident("$impl", line);
        let declared = self.comp.graph.declare_symbol(Symbol::InherentImpl(
            symbol_graph::symbols::InherentImplSymbol {
                scope,
                body_scope: body,
                name: ident,
                target_type: target,
            },
        ));
        self.diagnostics.collect(declared);

        let target_body = self
            .comp
            .graph
            .symbol(target)
            .get_body_scope()
            .expect("struct has a body scope");
        self.comp.graph.associate(target_body, body);
        body
    }

    fn declare_trait(
        &mut self,
        scope: ScopeId,
        name: &str,
        line: usize,
    ) -> (SymbolId, ScopeId, SymbolId) {
        let ident = self.ident(name, line);
        let body = self
            .comp
            .graph
            .create_scope(scope, ScopeKind::TypeBody, Some(ident.get_name()));

        let self_ident = self.ident("Self", line);
        let trait_placeholder = self.comp.natives.error_type;
        let self_type = self
            .comp
            .graph
            .declare_symbol_unchecked(Symbol::TraitSelf(TraitSelfSymbol {
                scope: body,
                name: self_ident,
                parent_trait: trait_placeholder,
            }));

        let declared = self.comp.graph.declare_symbol(Symbol::Trait(TraitSymbol {
            scope,
            body_scope: body,
            name: ident,
            access: AccessModifier::Public,
            type_params: Vec::new(),
            type_args: Vec::new(),
            generic_root: None,
            self_type,
        }));
        let trait_id = self.diagnostics.collect(declared);

        if let Symbol::TraitSelf(data) = self.comp.graph.symbol_mut(self_type) {
            data.parent_trait = trait_id;
        }

        (trait_id, body, self_type)
    }

    fn declare_prototype(
        &mut self,
        trait_scope: ScopeId,
        parent_trait: SymbolId,
        trait_self: SymbolId,
        name: &str,
        line: usize,
        return_type: SymbolId,
    ) -> SymbolId {
        let span = line_span(line);
        let body = self
            .comp
            .graph
            .create_scope(trait_scope, ScopeKind::FunctionBody, None);

        let self_ref = self
            .diagnostics
            .collect(self.comp.instantiate(span, self.comp.natives.ref_root, vec![trait_self]));
        let self_ident = self.ident("self", line);
        let self_param = self
            .comp
            .graph
            .declare_symbol_unchecked(Symbol::SelfParam(SelfParamVarSymbol {
                scope: body,
                name: self_ident,
                var_type: self_ref,
            }));

        let ident = self.ident(name, line);
        let declared = self.comp.graph.declare_symbol(Symbol::Prototype(PrototypeSymbol {
            scope: trait_scope,
            body_scope: body,
            name: ident,
            access: AccessModifier::Public,
            return_type,
            params: Vec::new(),
            self_param: Some(self_param),
            type_params: Vec::new(),
            type_args: Vec::new(),
            generic_root: None,
            parent_trait,
            self_type: trait_self,
        }));
        self.diagnostics.collect(declared)
    }

    fn declare_trait_impl(
        &mut self,
        scope: ScopeId,
        target: SymbolId,
        implemented_trait: SymbolId,
        line: usize,
    ) -> ScopeId {
        let trait_name = self.comp.graph.symbol(implemented_trait).get_name();
        let body = self
            .comp
            .graph
            .create_scope(scope, ScopeKind::ImplBody, Some(trait_name.get_name()));

        let ident = self.ident("$trait_impl", line);
        let declared = self
            .comp
            .graph
            .declare_symbol(Symbol::TraitImpl(TraitImplSymbol {
                scope,
                body_scope: body,
                name: ident,
                target_type: target,
                implemented_trait,
                constraints_scope: None,
            }));
        self.diagnostics.collect(declared);

        let target_body = self
            .comp
            .graph
            .symbol(target)
            .get_body_scope()
            .expect("struct has a body scope");
        self.comp.graph.associate(target_body, body);
        body
    }

    fn declare_function(
        &mut self,
        scope: ScopeId,
        name: &str,
        line: usize,
        params: &[(&str, SymbolId)],
        self_type: Option<SymbolId>,
        return_type: SymbolId,
    ) -> SymbolId {
        let span = line_span(line);
        let body = self
            .comp
            .graph
            .create_scope(scope, ScopeKind::FunctionBody, None);

        let self_param = self_type.map(|ty| {
            let self_ref = self
                .diagnostics
                .collect(self.comp.instantiate(span, self.comp.natives.ref_root, vec![ty]));
            let self_ident = self.ident("self", line);
            self.comp
                .graph
                .declare_symbol_unchecked(Symbol::SelfParam(SelfParamVarSymbol {
                    scope: body,
                    name: self_ident,
                    var_type: self_ref,
                }))
        });

        let mut param_ids = Vec::with_capacity(params.len());
        for (index, &(param_name, param_type)) in params.iter().enumerate() {
            let param_ident = self.ident(param_name, line);
            param_ids.push(self.comp.graph.declare_symbol_unchecked(Symbol::Param(
                ParamVarSymbol {
                    scope: body,
                    name: param_ident,
                    var_type: param_type,
                    index,
                },
            )));
        }

        let ident = self.ident(name, line);
        let category = if self_param.is_some() {
            SymbolCategory::Instance
        } else {
            SymbolCategory::Static
        };
        let mut function = FunctionSymbol::new(
            scope,
            body,
            ident,
            AccessModifier::Public,
            category,
            return_type,
            param_ids,
            self_param,
        );
        function.body = BodyKind::User;
        let declared = self.comp.graph.declare_symbol(Symbol::Function(function));
        self.diagnostics.collect(declared)
    }

    fn declare_method(
        &mut self,
        impl_scope: ScopeId,
        name: &str,
        line: usize,
        self_type: SymbolId,
        params: &[(&str, SymbolId)],
        return_type: SymbolId,
    ) -> SymbolId {
        self.declare_function(impl_scope, name, line, params, Some(self_type), return_type)
    }

    /// `fn id[T](x: T) -> T`: the type parameter lives in the body scope
    /// and doubles as the root's type argument, which is what registers
    /// the function as a generic root.
    fn declare_generic_identity(&mut self, scope: ScopeId, line: usize) -> SymbolId {
        let body = self
            .comp
            .graph
            .create_scope(scope, ScopeKind::FunctionBody, None);

        let param_ident = self.ident("T", line);
        let type_param = self
            .comp
            .graph
            .declare_symbol_unchecked(Symbol::TypeParam(TypeParamSymbol {
                scope: body,
                name: param_ident,
                index: 0,
            }));

        let x_ident = self.ident("x", line);
        let x_param = self
            .comp
            .graph
            .declare_symbol_unchecked(Symbol::Param(ParamVarSymbol {
                scope: body,
                name: x_ident,
                var_type: type_param,
                index: 0,
            }));

        let ident = self.ident("id", line);
        let mut function = FunctionSymbol::new(
            scope,
            body,
            ident,
            AccessModifier::Public,
            SymbolCategory::Static,
            type_param,
            vec![x_param],
            None,
        );
        function.body = BodyKind::User;
        function.type_params = vec![type_param];
        function.type_args = vec![type_param];
        let declared = self.comp.graph.declare_symbol(Symbol::Function(function));
        self.diagnostics.collect(declared)
    }

    // ---- bodies -------------------------------------------------------

    fn op_add_body(&mut self) -> Block {
        // return Point { x: a.x + b.x, y: a.y + b.y };
        let line = 5;
        let value = struct_construction(
            self.name("Point", line),
            vec![
                FieldInit::new(
                    self.ident("x", line),
                    binary(
                        BinaryOp::Add,
                        member(self.name_expr("a", line), self.ident("x", line)),
                        member(self.name_expr("b", line), self.ident("x", line)),
                        line,
                    ),
                ),
                FieldInit::new(
                    self.ident("y", line),
                    binary(
                        BinaryOp::Add,
                        member(self.name_expr("a", line), self.ident("y", line)),
                        member(self.name_expr("b", line), self.ident("y", line)),
                        line,
                    ),
                ),
            ],
            line,
        );
        block(vec![ret(Some(value), line)], 4)
    }

    fn doubled_body(&mut self) -> Block {
        // return self.x + self.x;
        let line = 15;
        let value = binary(
            BinaryOp::Add,
            member(self.name_expr("self", line), self.ident("x", line)),
            member(self.name_expr("self", line), self.ident("x", line)),
            line,
        );
        block(vec![ret(Some(value), line)], 14)
    }

    fn id_body(&mut self) -> Block {
        let line = 20;
        block(vec![ret(Some(self.name_expr("x", line)), line)], 19)
    }

    fn main_body(&mut self) -> Block {
        let stmts = vec![
            // let p: Point = Point { x: 1, y: 2 };
            var(
                self.ident("p", 24),
                Some(self.name("Point", 24)),
                Some(struct_construction(
                    self.name("Point", 24),
                    vec![
                        FieldInit::new(self.ident("x", 24), int_lit("1", 24)),
                        FieldInit::new(self.ident("y", 24), int_lit("2", 24)),
                    ],
                    24,
                )),
                24,
            ),
            // let q: Point = p + p;
            var(
                self.ident("q", 25),
                Some(self.name("Point", 25)),
                Some(binary(
                    BinaryOp::Add,
                    self.name_expr("p", 25),
                    self.name_expr("p", 25),
                    25,
                )),
                25,
            ),
            // let d: Int32 = q.doubled();
            var(
                self.ident("d", 26),
                Some(self.name("Int32", 26)),
                Some(call(
                    member(self.name_expr("q", 26), self.ident("doubled", 26)),
                    vec![],
                    26,
                )),
                26,
            ),
            // let n: Int32 = id(d);
            var(
                self.ident("n", 27),
                Some(self.name("Int32", 27)),
                Some(call(self.name_expr("id", 27), vec![self.name_expr("d", 27)], 27)),
                27,
            ),
            // let keep: Bool = true and n < 100;
            var(
                self.ident("keep", 28),
                Some(self.name("Bool", 28)),
                Some(and(
                    bool_lit(true, 28),
                    binary(BinaryOp::Less, self.name_expr("n", 28), int_lit("100", 28), 28),
                    28,
                )),
                28,
            ),
            // let boxed: StrongPtr[Int32] = box n;
            var(
                self.ident("boxed", 29),
                Some(self.generic_name("StrongPtr", &["Int32"], 29)),
                Some(box_expr(self.name_expr("n", 29), 29)),
                29,
            ),
            // let total: Int32 = unbox boxed;
            var(
                self.ident("total", 30),
                Some(self.name("Int32", 30)),
                Some(unbox_expr(self.name_expr("boxed", 30), 30)),
                30,
            ),
            // if keep { return total; }
            if_stmt(
                self.name_expr("keep", 31),
                block(vec![ret(Some(self.name_expr("total", 32)), 32)], 31),
                31,
            ),
            ret(Some(int_lit("0", 34)), 34),
        ];
        block(stmts, 23)
    }

    fn ident(&mut self, name: &str, line: usize) -> Ident {
        self.comp.intern_ident(name, line_span(line))
    }

    fn name(&mut self, text: &str, line: usize) -> QualifiedName {
        QualifiedName::new(
            NameRoot::Local,
            vec![NameSection::plain(self.ident(text, line))],
        )
    }

    fn generic_name(&mut self, base: &str, args: &[&str], line: usize) -> QualifiedName {
        let type_args = args.iter().map(|arg| self.name(arg, line)).collect();
        QualifiedName::new(
            NameRoot::Local,
            vec![NameSection::new(self.ident(base, line), type_args)],
        )
    }

    fn name_expr(&mut self, text: &str, line: usize) -> Expression {
        Expression::new(
            InnerExpression::SymbolName(self.name(text, line)),
            line_span(line),
        )
    }
}

// ---- span + syntax shorthands ----------------------------------------

/// The span of one line of the demo source.
fn line_span(line: usize) -> Span {
    let mut start = 0usize;
    for (index, text) in SOURCE.lines().enumerate() {
        if index + 1 == line {
            let leading = text.len() - text.trim_start().len();
            return Span::new(start + leading, start + text.len(), line);
        }
        start += text.len() + 1;
    }
    Span::new(0, 0, line)
}

fn member(base: Expression, member: Ident) -> Expression {
    let span = base.get_span();
    Expression::new(
        InnerExpression::MemberAccess {
            base: Box::new(base),
            member: NameSection::plain(member),
        },
        span,
    )
}

fn call(target: Expression, args: Vec<Expression>, line: usize) -> Expression {
    Expression::new(
        InnerExpression::FunctionCall {
            target: Box::new(target),
            args,
        },
        line_span(line),
    )
}

fn binary(op: BinaryOp, lhs: Expression, rhs: Expression, line: usize) -> Expression {
    Expression::new(
        InnerExpression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        line_span(line),
    )
}

fn and(lhs: Expression, rhs: Expression, line: usize) -> Expression {
    Expression::new(
        InnerExpression::And {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        line_span(line),
    )
}

fn box_expr(operand: Expression, line: usize) -> Expression {
    Expression::new(
        InnerExpression::Box {
            operand: Box::new(operand),
        },
        line_span(line),
    )
}

fn unbox_expr(operand: Expression, line: usize) -> Expression {
    Expression::new(
        InnerExpression::Unbox {
            operand: Box::new(operand),
        },
        line_span(line),
    )
}

fn int_lit(text: &str, line: usize) -> Expression {
    Expression::new(
        InnerExpression::Literal {
            kind: LiteralKind::INT32,
            text: text.to_string(),
        },
        line_span(line),
    )
}

fn bool_lit(value: bool, line: usize) -> Expression {
    let kind = if value {
        LiteralKind::TRUE
    } else {
        LiteralKind::FALSE
    };
    Expression::new(
        InnerExpression::Literal {
            kind,
            text: value.to_string(),
        },
        line_span(line),
    )
}

fn struct_construction(type_name: QualifiedName, fields: Vec<FieldInit>, line: usize) -> Expression {
    Expression::new(
        InnerExpression::StructConstruction { type_name, fields },
        line_span(line),
    )
}

fn var(
    name: Ident,
    type_name: Option<QualifiedName>,
    init: Option<Expression>,
    line: usize,
) -> Statement {
    Statement::new(
        InnerStatement::Var {
            name,
            type_name,
            init,
        },
        line_span(line),
    )
}

fn ret(value: Option<Expression>, line: usize) -> Statement {
    Statement::new(InnerStatement::Return { value }, line_span(line))
}

fn if_stmt(condition: Expression, body: Block, line: usize) -> Statement {
    Statement::new(
        InnerStatement::If {
            branches: vec![IfBranch::new(condition, body)],
            else_body: None,
        },
        line_span(line),
    )
}

fn block(stmts: Vec<Statement>, line: usize) -> Block {
    Block::new(stmts, line_span(line))
}
