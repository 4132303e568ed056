use crate::exprs::{BinaryOp, Expression};
use crate::names::QualifiedName;
use shared_context::{Ident, Span};

/// A brace-delimited list of statements. Opens a fresh lexical scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    statements: Vec<Statement>,
    span: Span,
}

impl Block {
    pub fn new(statements: Vec<Statement>, span: Span) -> Self {
        Self { statements, span }
    }

    pub fn get_statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn get_span(&self) -> Span {
        self.span
    }

    pub fn into_parts(self) -> (Vec<Statement>, Span) {
        (self.statements, self.span)
    }
}

/// A statement node together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    inner: InnerStatement,
    span: Span,
}

impl Statement {
    pub fn new(inner: InnerStatement, span: Span) -> Self {
        Self { inner, span }
    }

    pub fn get_inner(&self) -> &InnerStatement {
        &self.inner
    }

    pub fn get_span(&self) -> Span {
        self.span
    }

    pub fn into_parts(self) -> (InnerStatement, Span) {
        (self.inner, self.span)
    }
}

/// One arm of an `if` / `elif` chain.
#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    condition: Expression,
    body: Block,
}

impl IfBranch {
    pub fn new(condition: Expression, body: Block) -> Self {
        Self { condition, body }
    }

    pub fn get_condition(&self) -> &Expression {
        &self.condition
    }

    pub fn get_body(&self) -> &Block {
        &self.body
    }

    pub fn into_parts(self) -> (Expression, Block) {
        (self.condition, self.body)
    }
}

/// The statement forms the parser produces. Jumps and labels never appear
/// here; lowering introduces them.
#[derive(Debug, Clone, PartialEq)]
pub enum InnerStatement {
    Block(Block),

    /// `let name: Type = init;` with both the type and the initializer
    /// optional (but not both absent).
    Var {
        name: Ident,
        type_name: Option<QualifiedName>,
        init: Option<Expression>,
    },

    /// `lhs = rhs;`
    Assignment { lhs: Expression, rhs: Expression },

    /// `lhs op= rhs;`
    CompoundAssignment {
        lhs: Expression,
        op: BinaryOp,
        rhs: Expression,
    },

    If {
        branches: Vec<IfBranch>,
        else_body: Option<Block>,
    },

    While { condition: Expression, body: Block },

    Return { value: Option<Expression> },

    Expr(Expression),
}
