use shared_context::Span;
use std::rc::Rc;
use symbol_graph::{Compilation, SymbolId, TypeInfo, ValueKind};
use syntax::LiteralKind;

/// A sema expression. Every variant knows its source span and can report
/// its type info; children are shared `Rc`s and the tree is acyclic.
#[derive(Debug, PartialEq)]
pub enum ExprSema {
    Literal(LiteralExpr),
    StaticVarRef(StaticVarRefExpr),
    InstanceVarRef(InstanceVarRefExpr),
    StaticCall(StaticCallExpr),
    InstanceCall(InstanceCallExpr),
    UserUnary(UserUnaryExpr),
    UserBinary(UserBinaryExpr),
    And(AndExpr),
    Or(OrExpr),
    Not(NotExpr),
    AddrOf(AddrOfExpr),
    Deref(DerefExpr),
    DerefAs(DerefAsExpr),
    Ref(RefExpr),
    Box_(BoxExpr),
    Unbox(UnboxExpr),
    StructConstruction(StructConstructionExpr),
    SizeOf(SizeOfExpr),
    /// Stands in for an expression of a known type during convertibility
    /// probing. Never survives into an emitted tree.
    ConversionPlaceholder(ConversionPlaceholderExpr),
    /// A parenthesized wrapper, kept so spans survive binding.
    Expr(ExprWrapper),
}

#[derive(Debug, PartialEq)]
pub struct LiteralExpr {
    pub span: Span,
    pub kind: LiteralKind,
    pub text: String,
    pub ty: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct StaticVarRefExpr {
    pub span: Span,
    pub var: SymbolId,
    pub ty: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct InstanceVarRefExpr {
    pub span: Span,
    pub base: Rc<ExprSema>,
    pub field: SymbolId,
    pub ty: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct StaticCallExpr {
    pub span: Span,
    pub function: SymbolId,
    pub args: Vec<Rc<ExprSema>>,
}

#[derive(Debug, PartialEq)]
pub struct InstanceCallExpr {
    pub span: Span,
    pub base: Rc<ExprSema>,
    pub function: SymbolId,
    pub args: Vec<Rc<ExprSema>>,
}

#[derive(Debug, PartialEq)]
pub struct UserUnaryExpr {
    pub span: Span,
    pub operand: Rc<ExprSema>,
    pub op_symbol: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct UserBinaryExpr {
    pub span: Span,
    pub lhs: Rc<ExprSema>,
    pub rhs: Rc<ExprSema>,
    pub op_symbol: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct AndExpr {
    pub span: Span,
    pub lhs: Rc<ExprSema>,
    pub rhs: Rc<ExprSema>,
    pub bool_type: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct OrExpr {
    pub span: Span,
    pub lhs: Rc<ExprSema>,
    pub rhs: Rc<ExprSema>,
    pub bool_type: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct NotExpr {
    pub span: Span,
    pub operand: Rc<ExprSema>,
    pub bool_type: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct AddrOfExpr {
    pub span: Span,
    pub operand: Rc<ExprSema>,
    pub ptr_type: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct DerefExpr {
    pub span: Span,
    pub operand: Rc<ExprSema>,
    /// The pointee the dereference yields.
    pub ty: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct DerefAsExpr {
    pub span: Span,
    pub operand: Rc<ExprSema>,
    pub target_type: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct RefExpr {
    pub span: Span,
    pub operand: Rc<ExprSema>,
    /// The `Ref[T]` instance this reference has.
    pub ref_type: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct BoxExpr {
    pub span: Span,
    pub operand: Rc<ExprSema>,
    /// The `StrongPtr[T]` instance boxing produces.
    pub ptr_type: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct UnboxExpr {
    pub span: Span,
    pub operand: Rc<ExprSema>,
    /// The pointee unboxing yields.
    pub value_type: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct StructConstructionExpr {
    pub span: Span,
    pub struct_type: SymbolId,
    /// One entry per declared field, in field-index order.
    pub args: Vec<FieldInitSema>,
}

#[derive(Debug, PartialEq)]
pub struct FieldInitSema {
    pub field: SymbolId,
    pub value: Rc<ExprSema>,
}

#[derive(Debug, PartialEq)]
pub struct SizeOfExpr {
    pub span: Span,
    pub target_type: SymbolId,
    pub int_type: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct ConversionPlaceholderExpr {
    pub span: Span,
    pub info: TypeInfo,
}

#[derive(Debug, PartialEq)]
pub struct ExprWrapper {
    pub span: Span,
    pub inner: Rc<ExprSema>,
}

impl ExprSema {
    pub fn span(&self) -> Span {
        match self {
            ExprSema::Literal(e) => e.span,
            ExprSema::StaticVarRef(e) => e.span,
            ExprSema::InstanceVarRef(e) => e.span,
            ExprSema::StaticCall(e) => e.span,
            ExprSema::InstanceCall(e) => e.span,
            ExprSema::UserUnary(e) => e.span,
            ExprSema::UserBinary(e) => e.span,
            ExprSema::And(e) => e.span,
            ExprSema::Or(e) => e.span,
            ExprSema::Not(e) => e.span,
            ExprSema::AddrOf(e) => e.span,
            ExprSema::Deref(e) => e.span,
            ExprSema::DerefAs(e) => e.span,
            ExprSema::Ref(e) => e.span,
            ExprSema::Box_(e) => e.span,
            ExprSema::Unbox(e) => e.span,
            ExprSema::StructConstruction(e) => e.span,
            ExprSema::SizeOf(e) => e.span,
            ExprSema::ConversionPlaceholder(e) => e.span,
            ExprSema::Expr(e) => e.span,
        }
    }

    /// The type and value kind of the expression. Never null: error
    /// placeholders carry the error type instead.
    ///
    /// Variable references and dereferences are lvalues; everything else
    /// yields a transient rvalue.
    pub fn type_info(&self, comp: &Compilation<'_>) -> TypeInfo {
        match self {
            ExprSema::Literal(e) => TypeInfo::rvalue(e.ty),
            ExprSema::StaticVarRef(e) => TypeInfo::lvalue(e.ty),
            ExprSema::InstanceVarRef(e) => TypeInfo::lvalue(e.ty),
            ExprSema::StaticCall(e) => TypeInfo::rvalue(
                comp.graph
                    .symbol(comp.graph.unaliased(e.function))
                    .callable_return_type()
                    .unwrap_or_else(|| comp.error_type()),
            ),
            ExprSema::InstanceCall(e) => TypeInfo::rvalue(
                comp.graph
                    .symbol(comp.graph.unaliased(e.function))
                    .callable_return_type()
                    .unwrap_or_else(|| comp.error_type()),
            ),
            ExprSema::UserUnary(e) => TypeInfo::rvalue(
                comp.graph
                    .symbol(comp.graph.unaliased(e.op_symbol))
                    .callable_return_type()
                    .unwrap_or_else(|| comp.error_type()),
            ),
            ExprSema::UserBinary(e) => TypeInfo::rvalue(
                comp.graph
                    .symbol(comp.graph.unaliased(e.op_symbol))
                    .callable_return_type()
                    .unwrap_or_else(|| comp.error_type()),
            ),
            ExprSema::And(e) => TypeInfo::rvalue(e.bool_type),
            ExprSema::Or(e) => TypeInfo::rvalue(e.bool_type),
            ExprSema::Not(e) => TypeInfo::rvalue(e.bool_type),
            ExprSema::AddrOf(e) => TypeInfo::rvalue(e.ptr_type),
            ExprSema::Deref(e) => TypeInfo::lvalue(e.ty),
            ExprSema::DerefAs(e) => TypeInfo::lvalue(e.target_type),
            ExprSema::Ref(e) => TypeInfo::rvalue(e.ref_type),
            ExprSema::Box_(e) => TypeInfo::rvalue(e.ptr_type),
            ExprSema::Unbox(e) => TypeInfo::rvalue(e.value_type),
            ExprSema::StructConstruction(e) => TypeInfo::rvalue(e.struct_type),
            ExprSema::SizeOf(e) => TypeInfo::rvalue(e.int_type),
            ExprSema::ConversionPlaceholder(e) => e.info,
            ExprSema::Expr(e) => e.inner.type_info(comp),
        }
    }

    /// Immediate children, for generic walks (mono collection, the unused
    /// binding scan).
    pub fn children(&self) -> Vec<&Rc<ExprSema>> {
        match self {
            ExprSema::Literal(_)
            | ExprSema::StaticVarRef(_)
            | ExprSema::SizeOf(_)
            | ExprSema::ConversionPlaceholder(_) => Vec::new(),
            ExprSema::InstanceVarRef(e) => vec![&e.base],
            ExprSema::StaticCall(e) => e.args.iter().collect(),
            ExprSema::InstanceCall(e) => {
                let mut children = vec![&e.base];
                children.extend(e.args.iter());
                children
            }
            ExprSema::UserUnary(e) => vec![&e.operand],
            ExprSema::UserBinary(e) => vec![&e.lhs, &e.rhs],
            ExprSema::And(e) => vec![&e.lhs, &e.rhs],
            ExprSema::Or(e) => vec![&e.lhs, &e.rhs],
            ExprSema::Not(e) => vec![&e.operand],
            ExprSema::AddrOf(e) => vec![&e.operand],
            ExprSema::Deref(e) => vec![&e.operand],
            ExprSema::DerefAs(e) => vec![&e.operand],
            ExprSema::Ref(e) => vec![&e.operand],
            ExprSema::Box_(e) => vec![&e.operand],
            ExprSema::Unbox(e) => vec![&e.operand],
            ExprSema::StructConstruction(e) => e.args.iter().map(|a| &a.value).collect(),
            ExprSema::Expr(e) => vec![&e.inner],
        }
    }

    /// The symbols this node references directly (not through children).
    pub fn referenced_symbols(&self) -> Vec<SymbolId> {
        match self {
            ExprSema::StaticVarRef(e) => vec![e.var],
            ExprSema::InstanceVarRef(e) => vec![e.field],
            ExprSema::StaticCall(e) => vec![e.function],
            ExprSema::InstanceCall(e) => vec![e.function],
            ExprSema::UserUnary(e) => vec![e.op_symbol],
            ExprSema::UserBinary(e) => vec![e.op_symbol],
            ExprSema::Box_(e) => vec![e.ptr_type],
            ExprSema::StructConstruction(e) => vec![e.struct_type],
            ExprSema::SizeOf(e) => vec![e.target_type],
            ExprSema::DerefAs(e) => vec![e.target_type],
            ExprSema::Ref(e) => vec![e.ref_type],
            _ => Vec::new(),
        }
    }

    pub fn value_kind(&self, comp: &Compilation<'_>) -> ValueKind {
        self.type_info(comp).value_kind
    }
}
