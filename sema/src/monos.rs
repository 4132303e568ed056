// Collects the placeholder generic instances a (root) function body
// references. The instantiator later re-materializes these for every
// concrete instance of the root.

use crate::nodes::{ExprSema, FunctionSema, StmtSema};
use std::collections::HashSet;
use std::rc::Rc;
use symbol_graph::{Compilation, SymbolId, instantiator};

pub fn collect_monos(comp: &Compilation<'_>, function: &FunctionSema) -> Vec<SymbolId> {
    let mut seen: HashSet<SymbolId> = HashSet::new();
    let mut monos: Vec<SymbolId> = Vec::new();
    walk_stmt(comp, &function.body, &mut seen, &mut monos);
    monos
}

fn note(comp: &Compilation<'_>, symbol: SymbolId, seen: &mut HashSet<SymbolId>, monos: &mut Vec<SymbolId>) {
    let unaliased = comp.graph.unaliased(symbol);
    if !seen.insert(unaliased) {
        return;
    }
    let data = comp.graph.symbol(unaliased);
    if data.is_generic() && instantiator::is_placeholder_symbol(&comp.graph, unaliased) {
        monos.push(unaliased);
    }
}

fn walk_stmt(
    comp: &Compilation<'_>,
    stmt: &Rc<StmtSema>,
    seen: &mut HashSet<SymbolId>,
    monos: &mut Vec<SymbolId>,
) {
    if let StmtSema::Var(var) = stmt.as_ref() {
        if let Some(var_type) = comp.graph.symbol(var.symbol).get_var_type() {
            note(comp, var_type, seen, monos);
        }
    }
    for expr in stmt.child_exprs() {
        walk_expr(comp, expr, seen, monos);
    }
    for child in stmt.child_stmts() {
        walk_stmt(comp, child, seen, monos);
    }
}

fn walk_expr(
    comp: &Compilation<'_>,
    expr: &Rc<ExprSema>,
    seen: &mut HashSet<SymbolId>,
    monos: &mut Vec<SymbolId>,
) {
    for symbol in expr.referenced_symbols() {
        note(comp, symbol, seen, monos);
    }
    for child in expr.children() {
        walk_expr(comp, child, seen, monos);
    }
}
