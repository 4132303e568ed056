// Shared builders for the pipeline tests: they play the part of the
// external parser and declaration binder, declaring symbols through the
// graph API and assembling syntax trees by hand.

#![allow(dead_code)]

use shared_context::diagnostics::DiagnosticBag;
use shared_context::{Ident, Span};
use symbol_graph::scope::ScopeKind;
use symbol_graph::symbols::{
    BodyKind, ConstraintSymbol, FieldVarSymbol, FunctionSymbol, ParamVarSymbol, PrototypeSymbol,
    SelfParamVarSymbol, StructSymbol, Symbol, TraitImplSymbol, TraitSelfSymbol, TraitSymbol,
    TypeParamSymbol,
};
use symbol_graph::{AccessModifier, Compilation, ScopeId, SymbolCategory, SymbolId};
use syntax::{
    BinaryOp, Block, Expression, FieldInit, InnerExpression, InnerStatement, LiteralKind, NameRoot,
    NameSection, QualifiedName, Statement,
};

pub fn sp(offset: usize) -> Span {
    Span::new(offset, offset + 1, 1)
}

pub fn ident(comp: &mut Compilation<'_>, name: &str, offset: usize) -> Ident {
    comp.intern_ident(name, sp(offset))
}

pub fn declare_struct(
    comp: &mut Compilation<'_>,
    scope: ScopeId,
    name: &str,
    fields: &[(&str, SymbolId)],
) -> SymbolId {
    let mut bag = DiagnosticBag::new();
    let struct_ident = ident(comp, name, 0);
    let body = comp
        .graph
        .create_scope(scope, ScopeKind::TypeBody, Some(struct_ident.get_name()));

    for (index, &(field_name, field_type)) in fields.iter().enumerate() {
        let field_ident = ident(comp, field_name, index + 1);
        bag.collect(comp.graph.declare_symbol(Symbol::Field(FieldVarSymbol {
            scope: body,
            name: field_ident,
            access: AccessModifier::Public,
            var_type: field_type,
            index,
        })));
    }

    bag.collect(comp.graph.declare_symbol(Symbol::Struct(StructSymbol::new(
        scope,
        body,
        struct_ident,
        AccessModifier::Public,
        Vec::new(),
        Vec::new(),
    ))))
}

pub fn declare_function(
    comp: &mut Compilation<'_>,
    scope: ScopeId,
    name: &str,
    params: &[(&str, SymbolId)],
    return_type: SymbolId,
) -> SymbolId {
    let body = comp.graph.create_scope(scope, ScopeKind::FunctionBody, None);

    let mut param_ids = Vec::with_capacity(params.len());
    for (index, &(param_name, param_type)) in params.iter().enumerate() {
        let param_ident = ident(comp, param_name, index);
        param_ids.push(
            comp.graph
                .declare_symbol_unchecked(Symbol::Param(ParamVarSymbol {
                    scope: body,
                    name: param_ident,
                    var_type: param_type,
                    index,
                })),
        );
    }

    let fn_ident = ident(comp, name, 0);
    let mut function = FunctionSymbol::new(
        scope,
        body,
        fn_ident,
        AccessModifier::Public,
        SymbolCategory::Static,
        return_type,
        param_ids,
        None,
    );
    function.body = BodyKind::User;
    let mut bag = DiagnosticBag::new();
    bag.collect(comp.graph.declare_symbol(Symbol::Function(function)))
}

/// `fn id[T](x: T) -> T`
pub fn declare_identity_fn(comp: &mut Compilation<'_>, scope: ScopeId) -> SymbolId {
    let body = comp.graph.create_scope(scope, ScopeKind::FunctionBody, None);

    let t_ident = ident(comp, "T", 0);
    let type_param = comp
        .graph
        .declare_symbol_unchecked(Symbol::TypeParam(TypeParamSymbol {
            scope: body,
            name: t_ident,
            index: 0,
        }));
    let x_ident = ident(comp, "x", 1);
    let x_param = comp
        .graph
        .declare_symbol_unchecked(Symbol::Param(ParamVarSymbol {
            scope: body,
            name: x_ident,
            var_type: type_param,
            index: 0,
        }));

    let fn_ident = ident(comp, "id", 2);
    let mut function = FunctionSymbol::new(
        scope,
        body,
        fn_ident,
        AccessModifier::Public,
        SymbolCategory::Static,
        type_param,
        vec![x_param],
        None,
    );
    function.body = BodyKind::User;
    function.type_params = vec![type_param];
    function.type_args = vec![type_param];
    let mut bag = DiagnosticBag::new();
    bag.collect(comp.graph.declare_symbol(Symbol::Function(function)))
}

/// `fn <name>[T: <bound>](a: T, b: T) -> T`
pub fn declare_constrained_fn(
    comp: &mut Compilation<'_>,
    scope: ScopeId,
    name: &str,
    bound: SymbolId,
) -> SymbolId {
    let body = comp.graph.create_scope(scope, ScopeKind::FunctionBody, None);

    let t_ident = ident(comp, "T", 0);
    let type_param = comp
        .graph
        .declare_symbol_unchecked(Symbol::TypeParam(TypeParamSymbol {
            scope: body,
            name: t_ident,
            index: 0,
        }));
    comp.graph
        .declare_symbol_unchecked(Symbol::Constraint(ConstraintSymbol {
            scope: body,
            name: t_ident,
            type_param,
            traits: vec![bound],
            span: sp(40),
        }));

    let mut param_ids = Vec::new();
    for (index, param_name) in ["a", "b"].iter().enumerate() {
        let param_ident = ident(comp, param_name, index + 1);
        param_ids.push(
            comp.graph
                .declare_symbol_unchecked(Symbol::Param(ParamVarSymbol {
                    scope: body,
                    name: param_ident,
                    var_type: type_param,
                    index,
                })),
        );
    }

    let fn_ident = ident(comp, name, 3);
    let mut function = FunctionSymbol::new(
        scope,
        body,
        fn_ident,
        AccessModifier::Public,
        SymbolCategory::Static,
        type_param,
        param_ids,
        None,
    );
    function.body = BodyKind::User;
    function.type_params = vec![type_param];
    function.type_args = vec![type_param];
    let mut bag = DiagnosticBag::new();
    bag.collect(comp.graph.declare_symbol(Symbol::Function(function)))
}

pub fn declare_trait(
    comp: &mut Compilation<'_>,
    scope: ScopeId,
    name: &str,
) -> (SymbolId, ScopeId, SymbolId) {
    let trait_ident = ident(comp, name, 0);
    let body = comp
        .graph
        .create_scope(scope, ScopeKind::TypeBody, Some(trait_ident.get_name()));

    let self_ident = ident(comp, "Self", 0);
    let placeholder = comp.natives.error_type;
    let self_type = comp
        .graph
        .declare_symbol_unchecked(Symbol::TraitSelf(TraitSelfSymbol {
            scope: body,
            name: self_ident,
            parent_trait: placeholder,
        }));

    let mut bag = DiagnosticBag::new();
    let trait_id = bag.collect(comp.graph.declare_symbol(Symbol::Trait(TraitSymbol {
        scope,
        body_scope: body,
        name: trait_ident,
        access: AccessModifier::Public,
        type_params: Vec::new(),
        type_args: Vec::new(),
        generic_root: None,
        self_type,
    })));
    if let Symbol::TraitSelf(data) = comp.graph.symbol_mut(self_type) {
        data.parent_trait = trait_id;
    }
    (trait_id, body, self_type)
}

/// Declares a prototype `fn <name>(self) -> <return_type>` on a trait. A
/// `Self` return type (pass the trait's self symbol) makes the prototype
/// non-dyn-dispatchable.
pub fn declare_prototype(
    comp: &mut Compilation<'_>,
    trait_body: ScopeId,
    parent_trait: SymbolId,
    trait_self: SymbolId,
    name: &str,
    return_type: SymbolId,
) -> SymbolId {
    let body = comp
        .graph
        .create_scope(trait_body, ScopeKind::FunctionBody, None);

    let mut bag = DiagnosticBag::new();
    let self_ref = bag.collect(comp.instantiate(sp(10), comp.natives.ref_root, vec![trait_self]));
    let self_ident = ident(comp, "self", 0);
    let self_param = comp
        .graph
        .declare_symbol_unchecked(Symbol::SelfParam(SelfParamVarSymbol {
            scope: body,
            name: self_ident,
            var_type: self_ref,
        }));

    let proto_ident = ident(comp, name, 0);
    bag.collect(comp.graph.declare_symbol(Symbol::Prototype(PrototypeSymbol {
        scope: trait_body,
        body_scope: body,
        name: proto_ident,
        access: AccessModifier::Public,
        return_type,
        params: Vec::new(),
        self_param: Some(self_param),
        type_params: Vec::new(),
        type_args: Vec::new(),
        generic_root: None,
        parent_trait,
        self_type: trait_self,
    })))
}

pub fn declare_trait_impl(
    comp: &mut Compilation<'_>,
    scope: ScopeId,
    target: SymbolId,
    implemented_trait: SymbolId,
) -> ScopeId {
    let trait_name = comp.graph.symbol(implemented_trait).get_name();
    let body = comp
        .graph
        .create_scope(scope, ScopeKind::ImplBody, Some(trait_name.get_name()));

    let impl_ident = ident(comp, "$trait_impl", 0);
    let mut bag = DiagnosticBag::new();
    bag.collect(comp.graph.declare_symbol(Symbol::TraitImpl(TraitImplSymbol {
        scope,
        body_scope: body,
        name: impl_ident,
        target_type: target,
        implemented_trait,
        constraints_scope: None,
    })));

    let target_body = comp
        .graph
        .symbol(target)
        .get_body_scope()
        .expect("target has a body scope");
    comp.graph.associate(target_body, body);
    body
}

// ---- syntax shorthands ------------------------------------------------

pub fn local_name(comp: &mut Compilation<'_>, text: &str, offset: usize) -> QualifiedName {
    QualifiedName::new(
        NameRoot::Local,
        vec![NameSection::plain(ident(comp, text, offset))],
    )
}

pub fn name_expr(comp: &mut Compilation<'_>, text: &str, offset: usize) -> Expression {
    let name = local_name(comp, text, offset);
    Expression::new(InnerExpression::SymbolName(name), sp(offset))
}

pub fn literal(kind: LiteralKind, text: &str, offset: usize) -> Expression {
    Expression::new(
        InnerExpression::Literal {
            kind,
            text: text.to_string(),
        },
        sp(offset),
    )
}

pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression, offset: usize) -> Expression {
    Expression::new(
        InnerExpression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        sp(offset),
    )
}

pub fn and_expr(lhs: Expression, rhs: Expression, offset: usize) -> Expression {
    Expression::new(
        InnerExpression::And {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        sp(offset),
    )
}

pub fn call_expr(target: Expression, args: Vec<Expression>, offset: usize) -> Expression {
    Expression::new(
        InnerExpression::FunctionCall {
            target: Box::new(target),
            args,
        },
        sp(offset),
    )
}

pub fn construction(
    type_name: QualifiedName,
    fields: Vec<FieldInit>,
    offset: usize,
) -> Expression {
    Expression::new(
        InnerExpression::StructConstruction { type_name, fields },
        sp(offset),
    )
}

pub fn member_expr(base: Expression, field: Ident) -> Expression {
    let span = base.get_span();
    Expression::new(
        InnerExpression::MemberAccess {
            base: Box::new(base),
            member: NameSection::plain(field),
        },
        span,
    )
}

pub fn var_stmt(
    name: Ident,
    type_name: Option<QualifiedName>,
    init: Option<Expression>,
    offset: usize,
) -> Statement {
    Statement::new(
        InnerStatement::Var {
            name,
            type_name,
            init,
        },
        sp(offset),
    )
}

pub fn compound_stmt(lhs: Expression, op: BinaryOp, rhs: Expression, offset: usize) -> Statement {
    Statement::new(
        InnerStatement::CompoundAssignment { lhs, op, rhs },
        sp(offset),
    )
}

pub fn while_stmt(condition: Expression, body: Block, offset: usize) -> Statement {
    Statement::new(InnerStatement::While { condition, body }, sp(offset))
}

pub fn ret_stmt(value: Option<Expression>, offset: usize) -> Statement {
    Statement::new(InnerStatement::Return { value }, sp(offset))
}

pub fn expr_stmt(expr: Expression, offset: usize) -> Statement {
    Statement::new(InnerStatement::Expr(expr), sp(offset))
}

pub fn block_of(stmts: Vec<Statement>, offset: usize) -> Block {
    Block::new(stmts, sp(offset))
}

/// A provider for tests that do not inspect glue bodies.
pub struct NullGlueBodies;

impl sema::glue::GlueBodyProvider for NullGlueBodies {
    fn create_copy_glue_body(
        &self,
        _comp: &Compilation<'_>,
        _ty: SymbolId,
        _glue: SymbolId,
    ) -> sema::glue::GlueBody {
        std::rc::Rc::new(|_, _| {})
    }

    fn create_drop_glue_body(
        &self,
        _comp: &Compilation<'_>,
        _ty: SymbolId,
        _glue: SymbolId,
    ) -> sema::glue::GlueBody {
        std::rc::Rc::new(|_, _| {})
    }
}
