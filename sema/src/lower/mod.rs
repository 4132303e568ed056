// The lowering pass: desugars the sema tree to its smaller core. User
// operators become static calls, box/unbox become strong-pointer calls,
// compound assignment becomes a plain assignment over a temporary
// reference, and structured control flow becomes labels and jumps.
//
// Lowering is idempotent: re-lowering an already lowered tree hands back
// the same allocations.

use crate::nodes::{FunctionSema, LabelId};
use symbol_graph::{Compilation, ScopeId, SymbolId};
use tracing::debug;

mod lower_expressions;
mod lower_statements;

pub struct Lowerer<'c, 'a> {
    pub(crate) comp: &'c mut Compilation<'a>,
    /// Scope receiving the compiler-introduced spill temporaries.
    pub(crate) function_scope: ScopeId,
    label_counter: u32,
}

impl<'c, 'a> Lowerer<'c, 'a> {
    pub fn new(comp: &'c mut Compilation<'a>, function: SymbolId) -> Self {
        let function_scope = comp
            .graph
            .symbol(function)
            .get_body_scope()
            .unwrap_or_else(|| comp.graph.global_scope());
        Self {
            comp,
            function_scope,
            label_counter: 0,
        }
    }

    pub fn lower_function(&mut self, function: &FunctionSema) -> FunctionSema {
        debug!(
            function = %self.comp.symbol_signature(function.symbol),
            "lowering"
        );
        let body = self.lower_stmt(&function.body);
        FunctionSema::new(function.symbol, body)
    }

    pub(crate) fn fresh_label(&mut self) -> LabelId {
        let label = LabelId(self.label_counter);
        self.label_counter += 1;
        label
    }
}
