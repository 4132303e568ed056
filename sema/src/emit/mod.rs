// The emit pass: walks a lowered function body and drives the external
// emitter contract. Values follow the address model: emitting an
// expression yields the address its value lives at, and statement
// boundaries run the drop glue of the temporaries the expression left
// behind.

use crate::nodes::{FunctionSema, LabelId, StmtSema};
use emitter::{Emitter, IrBlockId};
use std::collections::HashMap;
use std::rc::Rc;
use symbol_graph::{Compilation, SymbolId};
use tracing::debug;

mod emit_expressions;
mod emit_statements;

pub struct FunctionEmitter<'c, 'a, 'e> {
    pub(crate) comp: &'c Compilation<'a>,
    pub(crate) emitter: &'e mut dyn Emitter,
    pub(crate) labels: HashMap<LabelId, IrBlockId>,
}

/// Emits one function: argument slots, label blocks, then the body.
/// A void function that falls off the end gets its implicit return.
pub fn emit_function(
    comp: &Compilation<'_>,
    function: &FunctionSema,
    emitter: &mut dyn Emitter,
) {
    debug!(
        function = %comp.symbol_signature(function.symbol),
        "emitting"
    );

    let mut pass = FunctionEmitter {
        comp,
        emitter,
        labels: HashMap::new(),
    };

    pass.store_params(function.symbol);
    pass.create_label_blocks(&function.body);
    pass.emit_stmt(&function.body);

    let return_type = comp
        .graph
        .symbol(comp.graph.unaliased(function.symbol))
        .callable_return_type()
        .unwrap_or_else(|| comp.error_type());
    if comp.graph.unaliased(return_type) == comp.graph.unaliased(comp.natives.void) {
        pass.emitter.create_ret_void();
    }
}

impl FunctionEmitter<'_, '_, '_> {
    /// Loads every argument into its stack slot, self first.
    fn store_params(&mut self, function: SymbolId) {
        let unaliased = self.comp.graph.unaliased(function);
        let symbol = self.comp.graph.symbol(unaliased);

        let mut arg_index = 0usize;
        let mut params: Vec<SymbolId> = Vec::new();
        if let Some(self_param) = symbol.callable_self_param() {
            params.push(self_param);
        }
        params.extend_from_slice(symbol.callable_params().unwrap_or(&[]));

        for param in params {
            let var_type = self
                .comp
                .graph
                .symbol(param)
                .get_var_type()
                .expect("param has a type");
            let ir_type = self.emitter.get_type(var_type);
            let value = self.emitter.emit_load_arg(arg_index, ir_type);
            let slot = self.emitter.local_ptr(param, ir_type);
            self.emitter.store(value, slot);
            arg_index += 1;
        }
    }

    fn create_label_blocks(&mut self, body: &Rc<StmtSema>) {
        let mut labels: Vec<LabelId> = Vec::new();
        collect_labels(body, &mut labels);
        for label in labels {
            let block = self.emitter.create_block();
            self.labels.insert(label, block);
        }
    }
}

fn collect_labels(stmt: &Rc<StmtSema>, out: &mut Vec<LabelId>) {
    if let StmtSema::Label(label) = stmt.as_ref() {
        out.push(label.label);
    }
    for child in stmt.child_stmts() {
        collect_labels(child, out);
    }
}
