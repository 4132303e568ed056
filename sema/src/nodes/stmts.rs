use crate::nodes::{ExprSema, LabelId};
use shared_context::Span;
use std::rc::Rc;
use symbol_graph::{ScopeId, SymbolId};

/// A sema statement. `If` and `While` only exist between binding and
/// lowering; the lowered core is blocks, vars, assignments, jumps, labels,
/// returns and expression statements.
#[derive(Debug, PartialEq)]
pub enum StmtSema {
    Block(BlockStmt),
    Var(VarStmt),
    NormalAssignment(NormalAssignmentStmt),
    CompoundAssignment(CompoundAssignmentStmt),
    If(IfStmt),
    While(WhileStmt),
    Jump(JumpStmt),
    ConditionalJump(ConditionalJumpStmt),
    Label(LabelStmt),
    Return(ReturnStmt),
    Expr(ExprStmt),
    /// Statements spliced into the surrounding block without opening a
    /// scope; lowering rewrites expand into these.
    Group(GroupStmt),
}

#[derive(Debug, PartialEq)]
pub struct BlockStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub stmts: Vec<Rc<StmtSema>>,
}

#[derive(Debug, PartialEq)]
pub struct VarStmt {
    pub span: Span,
    pub symbol: SymbolId,
    pub init: Option<Rc<ExprSema>>,
}

#[derive(Debug, PartialEq)]
pub struct NormalAssignmentStmt {
    pub span: Span,
    pub lhs: Rc<ExprSema>,
    pub rhs: Rc<ExprSema>,
}

#[derive(Debug, PartialEq)]
pub struct CompoundAssignmentStmt {
    pub span: Span,
    pub lhs: Rc<ExprSema>,
    pub rhs: Rc<ExprSema>,
    pub op_symbol: SymbolId,
}

#[derive(Debug, PartialEq)]
pub struct IfBranchSema {
    pub condition: Rc<ExprSema>,
    pub body: Rc<StmtSema>,
}

#[derive(Debug, PartialEq)]
pub struct IfStmt {
    pub span: Span,
    pub branches: Vec<IfBranchSema>,
    pub else_body: Option<Rc<StmtSema>>,
}

#[derive(Debug, PartialEq)]
pub struct WhileStmt {
    pub span: Span,
    pub condition: Rc<ExprSema>,
    pub body: Rc<StmtSema>,
}

#[derive(Debug, PartialEq)]
pub struct JumpStmt {
    pub span: Span,
    pub label: LabelId,
}

#[derive(Debug, PartialEq)]
pub struct ConditionalJumpStmt {
    pub span: Span,
    pub condition: Rc<ExprSema>,
    pub label: LabelId,
}

#[derive(Debug, PartialEq)]
pub struct LabelStmt {
    pub span: Span,
    pub label: LabelId,
}

#[derive(Debug, PartialEq)]
pub struct ReturnStmt {
    pub span: Span,
    pub value: Option<Rc<ExprSema>>,
}

#[derive(Debug, PartialEq)]
pub struct ExprStmt {
    pub span: Span,
    pub expr: Rc<ExprSema>,
}

#[derive(Debug, PartialEq)]
pub struct GroupStmt {
    pub span: Span,
    pub stmts: Vec<Rc<StmtSema>>,
}

impl StmtSema {
    pub fn span(&self) -> Span {
        match self {
            StmtSema::Block(s) => s.span,
            StmtSema::Var(s) => s.span,
            StmtSema::NormalAssignment(s) => s.span,
            StmtSema::CompoundAssignment(s) => s.span,
            StmtSema::If(s) => s.span,
            StmtSema::While(s) => s.span,
            StmtSema::Jump(s) => s.span,
            StmtSema::ConditionalJump(s) => s.span,
            StmtSema::Label(s) => s.span,
            StmtSema::Return(s) => s.span,
            StmtSema::Expr(s) => s.span,
            StmtSema::Group(s) => s.span,
        }
    }

    /// Child statements, for generic walks.
    pub fn child_stmts(&self) -> Vec<&Rc<StmtSema>> {
        match self {
            StmtSema::Block(s) => s.stmts.iter().collect(),
            StmtSema::Group(s) => s.stmts.iter().collect(),
            StmtSema::If(s) => {
                let mut children: Vec<&Rc<StmtSema>> =
                    s.branches.iter().map(|b| &b.body).collect();
                if let Some(else_body) = &s.else_body {
                    children.push(else_body);
                }
                children
            }
            StmtSema::While(s) => vec![&s.body],
            _ => Vec::new(),
        }
    }

    /// Direct child expressions, for generic walks.
    pub fn child_exprs(&self) -> Vec<&Rc<ExprSema>> {
        match self {
            StmtSema::Var(s) => s.init.iter().collect(),
            StmtSema::NormalAssignment(s) => vec![&s.lhs, &s.rhs],
            StmtSema::CompoundAssignment(s) => vec![&s.lhs, &s.rhs],
            StmtSema::If(s) => s.branches.iter().map(|b| &b.condition).collect(),
            StmtSema::While(s) => vec![&s.condition],
            StmtSema::ConditionalJump(s) => vec![&s.condition],
            StmtSema::Return(s) => s.value.iter().collect(),
            StmtSema::Expr(s) => vec![&s.expr],
            _ => Vec::new(),
        }
    }
}
