// The type-check pass: verifies the invariants of every sema node and
// inserts the implicit conversions the tree needs. Nodes are immutable;
// an unchanged subtree is returned as the same allocation.

use crate::nodes::FunctionSema;
use shared_context::diagnostics::DiagnosticBag;
use symbol_graph::{Compilation, SymbolId};
use tracing::debug;

pub(crate) mod typecheck_expressions;
pub(crate) mod typecheck_statements;

/// What the statement checks need from their surroundings: the enclosing
/// function's return type.
#[derive(Debug, Clone, Copy)]
pub struct StmtContext {
    pub return_type: SymbolId,
}

pub struct TypeChecker<'c, 'a> {
    pub(crate) comp: &'c mut Compilation<'a>,
    pub(crate) diagnostics: DiagnosticBag,
}

impl<'c, 'a> TypeChecker<'c, 'a> {
    pub fn new(comp: &'c mut Compilation<'a>) -> Self {
        Self {
            comp,
            diagnostics: DiagnosticBag::new(),
        }
    }

    pub fn into_diagnostics(self) -> DiagnosticBag {
        self.diagnostics
    }

    pub fn typecheck_function(&mut self, function: &FunctionSema) -> FunctionSema {
        debug!(
            function = %self.comp.symbol_signature(function.symbol),
            "type checking"
        );

        let return_type = self
            .comp
            .graph
            .symbol(self.comp.graph.unaliased(function.symbol))
            .callable_return_type()
            .unwrap_or_else(|| self.comp.error_type());
        let ctx = StmtContext { return_type };

        let body = self.check_stmt(&function.body, &ctx);
        FunctionSema::new(function.symbol, body)
    }
}
