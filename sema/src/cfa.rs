// Control-flow analysis over lowered function bodies: a graph of the
// flattened statements with fall-through, jump and conditional-jump
// edges. Reports missing returns, unreachable statements, and unused
// bindings.

use crate::nodes::{ExprSema, FunctionSema, LabelId, StmtSema};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use shared_context::diagnostics::{Diagnosed, Diagnostic, DiagnosticBag};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use symbol_graph::{Compilation, SymbolId};
use tracing::debug;

pub fn analyze_function(comp: &Compilation<'_>, function: &FunctionSema) -> Diagnosed<()> {
    let mut diagnostics = DiagnosticBag::new();

    debug!(
        function = %comp.symbol_signature(function.symbol),
        "control flow analysis"
    );

    let mut flat: Vec<Rc<StmtSema>> = Vec::new();
    flatten(&function.body, &mut flat);

    let cfg = build_cfg(&flat);

    let return_type = comp
        .graph
        .symbol(comp.graph.unaliased(function.symbol))
        .callable_return_type()
        .unwrap_or_else(|| comp.error_type());
    let returns_value = comp.graph.unaliased(return_type)
        != comp.graph.unaliased(comp.natives.void)
        && !comp.is_error_type(return_type);

    let reachable = reachable_from_entry(&cfg);

    // Missing return: some path from entry falls off the end of a
    // non-void function.
    if returns_value && reachable.contains(&cfg.exit) {
        let span = comp
            .graph
            .symbol(function.symbol)
            .get_name()
            .get_span();
        diagnostics.add(Diagnostic::error(
            span,
            "not all control paths return a value",
        ));
    }

    // Unreachable code: the first statement of every unreachable run.
    let mut previous_reachable = true;
    for (index, stmt) in flat.iter().enumerate() {
        let is_reachable = reachable.contains(&cfg.stmt_nodes[index]);
        let synthetic = matches!(stmt.as_ref(), StmtSema::Label(_) | StmtSema::Jump(_));
        if !is_reachable && previous_reachable && !synthetic {
            diagnostics.add(Diagnostic::warning(stmt.span(), "unreachable code"));
        }
        previous_reachable = is_reachable;
    }

    report_unused_bindings(comp, function, &mut diagnostics);

    Diagnosed::new((), diagnostics)
}

struct Cfg {
    graph: DiGraph<(), ()>,
    entry: NodeIndex,
    exit: NodeIndex,
    stmt_nodes: Vec<NodeIndex>,
}

fn build_cfg(flat: &[Rc<StmtSema>]) -> Cfg {
    let mut graph = DiGraph::new();
    let entry = graph.add_node(());
    let exit = graph.add_node(());
    let stmt_nodes: Vec<NodeIndex> = flat.iter().map(|_| graph.add_node(())).collect();

    let mut label_positions: HashMap<LabelId, usize> = HashMap::new();
    for (index, stmt) in flat.iter().enumerate() {
        if let StmtSema::Label(label) = stmt.as_ref() {
            label_positions.insert(label.label, index);
        }
    }

    match stmt_nodes.first() {
        Some(&first) => graph.add_edge(entry, first, ()),
        None => {
            graph.add_edge(entry, exit, ());
            return Cfg {
                graph,
                entry,
                exit,
                stmt_nodes,
            };
        }
    };

    let successor = |index: usize| -> NodeIndex {
        flat.get(index + 1)
            .map(|_| stmt_nodes[index + 1])
            .unwrap_or(exit)
    };

    for (index, stmt) in flat.iter().enumerate() {
        let node = stmt_nodes[index];
        match stmt.as_ref() {
            StmtSema::Jump(jump) => {
                if let Some(&target) = label_positions.get(&jump.label) {
                    graph.add_edge(node, stmt_nodes[target], ());
                }
            }
            StmtSema::ConditionalJump(jump) => {
                if let Some(&target) = label_positions.get(&jump.label) {
                    graph.add_edge(node, stmt_nodes[target], ());
                }
                graph.add_edge(node, successor(index), ());
            }
            // Return leaves the function without falling off the end, so
            // it deliberately gets no edge to `exit`: reaching `exit`
            // means a fall-off path exists.
            StmtSema::Return(_) => {}
            _ => {
                graph.add_edge(node, successor(index), ());
            }
        }
    }

    Cfg {
        graph,
        entry,
        exit,
        stmt_nodes,
    }
}

fn reachable_from_entry(cfg: &Cfg) -> HashSet<NodeIndex> {
    let mut reachable = HashSet::new();
    let mut dfs = Dfs::new(&cfg.graph, cfg.entry);
    while let Some(node) = dfs.next(&cfg.graph) {
        reachable.insert(node);
    }
    reachable
}

/// Leaf statements in execution order. Blocks and groups are containers,
/// not control flow; structured `if`/`while` never survive lowering.
fn flatten(stmt: &Rc<StmtSema>, out: &mut Vec<Rc<StmtSema>>) {
    match stmt.as_ref() {
        StmtSema::Block(block) => {
            for child in &block.stmts {
                flatten(child, out);
            }
        }
        StmtSema::Group(group) => {
            for child in &group.stmts {
                flatten(child, out);
            }
        }
        _ => out.push(stmt.clone()),
    }
}

/// A binding with no reads after its initialization gets a warning.
/// Compiler-introduced temporaries are exempt.
fn report_unused_bindings(
    comp: &Compilation<'_>,
    function: &FunctionSema,
    diagnostics: &mut DiagnosticBag,
) {
    let mut declared: Vec<SymbolId> = Vec::new();
    let mut reads: HashSet<SymbolId> = HashSet::new();
    scan_stmt(&function.body, &mut declared, &mut reads);

    for symbol in declared {
        if reads.contains(&symbol) {
            continue;
        }
        let name = comp.graph.symbol(symbol).get_name();
        let text = comp.interner.lookup(name.get_name());
        if text.starts_with('$') {
            continue;
        }
        diagnostics.add(Diagnostic::warning(
            name.get_span(),
            format!("unused binding `{text}`"),
        ));
    }
}

fn scan_stmt(stmt: &Rc<StmtSema>, declared: &mut Vec<SymbolId>, reads: &mut HashSet<SymbolId>) {
    if let StmtSema::Var(var) = stmt.as_ref() {
        declared.push(var.symbol);
    }

    match stmt.as_ref() {
        // The assignment target itself is a write, not a read; anything
        // underneath it (a field's base) still reads.
        StmtSema::NormalAssignment(assign) => {
            if let ExprSema::StaticVarRef(_) = assign.lhs.as_ref() {
                for child in assign.lhs.children() {
                    scan_expr(child, reads);
                }
            } else {
                scan_expr(&assign.lhs, reads);
            }
            scan_expr(&assign.rhs, reads);
        }
        _ => {
            for expr in stmt.child_exprs() {
                scan_expr(expr, reads);
            }
        }
    }

    for child in stmt.child_stmts() {
        scan_stmt(child, declared, reads);
    }
}

fn scan_expr(expr: &Rc<ExprSema>, reads: &mut HashSet<SymbolId>) {
    if let ExprSema::StaticVarRef(var_ref) = expr.as_ref() {
        reads.insert(var_ref.var);
    }
    for child in expr.children() {
        scan_expr(child, reads);
    }
}
