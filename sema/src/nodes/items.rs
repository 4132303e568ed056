use crate::nodes::StmtSema;
use std::rc::Rc;
use symbol_graph::SymbolId;

/// A function with its elaborated body block.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSema {
    pub symbol: SymbolId,
    pub body: Rc<StmtSema>,
}

impl FunctionSema {
    pub fn new(symbol: SymbolId, body: Rc<StmtSema>) -> Self {
        Self { symbol, body }
    }
}

/// An impl block and the function bodies declared inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplSema {
    pub symbol: SymbolId,
    pub functions: Vec<FunctionSema>,
}

/// A module and its items.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSema {
    pub symbol: SymbolId,
    pub items: Vec<ItemSema>,
}

/// A top-level sema item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemSema {
    Function(FunctionSema),
    Impl(ImplSema),
    Module(ModuleSema),
}
