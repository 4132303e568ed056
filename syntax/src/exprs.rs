use crate::names::{NameSection, QualifiedName};
use bitflags::bitflags;
use shared_context::{Ident, Span};

bitflags! {
    /// What kind of literal the lexer produced, as a bitmask so groups of
    /// kinds can be tested in one operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LiteralKind: u32 {
        const INT8    = 1 << 0;
        const INT16   = 1 << 1;
        const INT32   = 1 << 2;
        const INT64   = 1 << 3;
        const UINT8   = 1 << 4;
        const UINT16  = 1 << 5;
        const UINT32  = 1 << 6;
        const UINT64  = 1 << 7;
        const INT     = 1 << 8;
        const FLOAT32 = 1 << 9;
        const FLOAT64 = 1 << 10;
        const TRUE    = 1 << 11;
        const FALSE   = 1 << 12;
        const STRING  = 1 << 13;

        const SIGNED_INT = Self::INT8.bits()
            | Self::INT16.bits()
            | Self::INT32.bits()
            | Self::INT64.bits()
            | Self::INT.bits();
        const UNSIGNED_INT = Self::UINT8.bits()
            | Self::UINT16.bits()
            | Self::UINT32.bits()
            | Self::UINT64.bits();
        const FLOAT = Self::FLOAT32.bits() | Self::FLOAT64.bits();
        const NUMBER = Self::SIGNED_INT.bits()
            | Self::UNSIGNED_INT.bits()
            | Self::FLOAT.bits();
        const BOOL = Self::TRUE.bits() | Self::FALSE.bits();
    }
}

/// Binary operators as written in source. Besides the comparisons, each of
/// these resolves to an `op_*` associated function during binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl BinaryOp {
    /// The associated-function name the operator resolves to.
    pub fn op_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "op_add",
            BinaryOp::Sub => "op_sub",
            BinaryOp::Mul => "op_mul",
            BinaryOp::Div => "op_div",
            BinaryOp::Rem => "op_rem",
            BinaryOp::Eq => "op_eq",
            BinaryOp::NotEq => "op_not_eq",
            BinaryOp::Less => "op_less",
            BinaryOp::LessEq => "op_less_eq",
            BinaryOp::Greater => "op_greater",
            BinaryOp::GreaterEq => "op_greater_eq",
        }
    }
}

/// Unary operators. Logical `not` is separate: it short-circuits nothing
/// but always types as Bool, so it gets a dedicated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
}

impl UnaryOp {
    pub fn op_name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "op_neg",
        }
    }
}

/// A named field initializer inside a struct construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInit {
    name: Ident,
    value: Expression,
}

impl FieldInit {
    pub fn new(name: Ident, value: Expression) -> Self {
        Self { name, value }
    }

    pub fn get_name(&self) -> Ident {
        self.name
    }

    pub fn get_value(&self) -> &Expression {
        &self.value
    }

    pub fn into_parts(self) -> (Ident, Expression) {
        (self.name, self.value)
    }
}

/// An expression node together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    inner: InnerExpression,
    span: Span,
}

impl Expression {
    pub fn new(inner: InnerExpression, span: Span) -> Self {
        Self { inner, span }
    }

    pub fn get_inner(&self) -> &InnerExpression {
        &self.inner
    }

    pub fn get_span(&self) -> Span {
        self.span
    }

    pub fn into_parts(self) -> (InnerExpression, Span) {
        (self.inner, self.span)
    }
}

/// The expression forms the parser produces.
#[derive(Debug, Clone, PartialEq)]
pub enum InnerExpression {
    /// A literal; the original text is kept so the emitter can materialize
    /// the constant without the middle end re-parsing it.
    Literal { kind: LiteralKind, text: String },

    /// A (possibly qualified) name used as an expression: a variable
    /// reference or a call target.
    SymbolName(QualifiedName),

    /// `base.member` or `base.member[TypeArgs]`.
    MemberAccess {
        base: Box<Expression>,
        member: NameSection,
    },

    /// `target(arg, ...)`.
    FunctionCall {
        target: Box<Expression>,
        args: Vec<Expression>,
    },

    /// `TypeName { field: value, ... }`.
    StructConstruction {
        type_name: QualifiedName,
        fields: Vec<FieldInit>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },

    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    /// Short-circuiting `lhs and rhs`.
    And {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    /// Short-circuiting `lhs or rhs`.
    Or {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    /// `not operand`.
    Not { operand: Box<Expression> },

    /// `&operand`, producing a `Ptr`.
    AddrOf { operand: Box<Expression> },

    /// `box operand`, producing a `StrongPtr[T]`.
    Box { operand: Box<Expression> },

    /// `unbox operand`, unwrapping a `StrongPtr[T]`.
    Unbox { operand: Box<Expression> },

    /// `operand as TypeName`, an explicit conversion.
    Cast {
        type_name: QualifiedName,
        operand: Box<Expression>,
    },

    /// `deref_as[T](operand)`; the operand must be a `Ptr` or a reference.
    DerefAs {
        type_name: QualifiedName,
        operand: Box<Expression>,
    },

    /// `size_of[T]`.
    SizeOf { type_name: QualifiedName },

    /// A parenthesized expression, kept so spans survive.
    Paren { operand: Box<Expression> },
}
