// The syntax tree the semantic middle end consumes.
//
// This crate only models the tree: producing it is the parser's job, which
// lives outside this workspace. Nodes carry spans and nothing else; types
// and symbols only appear once the sema passes have run.

pub mod exprs;
pub mod names;
pub mod stmts;

pub use exprs::{BinaryOp, Expression, FieldInit, InnerExpression, LiteralKind, UnaryOp};
pub use names::{NameRoot, NameSection, QualifiedName};
pub use stmts::{Block, IfBranch, InnerStatement, Statement};
