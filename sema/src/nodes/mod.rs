// The semantic tree: type-decorated, symbol-resolved counterparts of the
// syntax nodes. Nodes are immutable and shared through `Rc`; a pass that
// changes nothing hands back the same allocation, which is what makes the
// lowering fixed point observable by pointer equality.

mod exprs;
mod items;
mod stmts;

pub use exprs::*;
pub use items::*;
pub use stmts::*;

/// A label introduced by lowering. Only jump statements reference labels;
/// they never appear in bound-but-unlowered trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(pub u32);
