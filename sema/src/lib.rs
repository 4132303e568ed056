// The sema pipeline: bind, type-check, lower, control-flow analysis, glue.
//
// Each pass consumes a tree and returns a transformed tree together with
// the diagnostics it produced; analysis always covers the whole input and
// error placeholders stand in for whatever failed to resolve. Code
// generation is gated on the accumulated bag containing no errors, but
// nothing here stops early.

use indexmap::IndexMap;
use nodes::{ImplSema, ModuleSema};
use shared_context::diagnostics::{Diagnosed, DiagnosticBag};
use std::collections::HashMap;
use symbol_graph::symbols::{BodyKind, Symbol};
use symbol_graph::{Compilation, ScopeId, SymbolId, instantiator};
use tracing::{debug, info_span};

pub mod bind;
pub mod cfa;
pub mod conversions;
pub mod emit;
pub mod glue;
pub mod lower;
pub mod monos;
pub mod nodes;
pub mod typecheck;
pub mod validate;

pub use nodes::{ExprSema, FunctionSema, ItemSema, StmtSema};

/// A function symbol paired with the syntax block that is its body. The
/// external binder hands one of these over for every function it declared
/// with a user-written body.
#[derive(Debug, Clone)]
pub struct FunctionBinding {
    pub symbol: SymbolId,
    pub block: syntax::Block,
}

impl FunctionBinding {
    pub fn new(symbol: SymbolId, block: syntax::Block) -> Self {
        Self { symbol, block }
    }
}

/// The fully elaborated output of the pipeline: one sema body per function
/// (roots and concrete instances alike), the same bodies grouped into the
/// item tree they were declared in, and the glue bindings.
pub struct SemaProgram {
    pub functions: IndexMap<SymbolId, FunctionSema>,
    pub items: Vec<ItemSema>,
    pub glue: glue::GlueMap,
    root_blocks: HashMap<SymbolId, syntax::Block>,
}

impl SemaProgram {
    pub fn function(&self, symbol: SymbolId) -> Option<&FunctionSema> {
        self.functions.get(&symbol)
    }

    /// The syntax block a generic root's instances are re-bound from.
    pub fn root_block(&self, root: SymbolId) -> Option<&syntax::Block> {
        self.root_blocks.get(&root)
    }

    /// Functions that should reach the emitter: concrete (non-placeholder)
    /// user bodies.
    pub fn emittable_functions(&self) -> Vec<SymbolId> {
        self.functions.keys().copied().collect()
    }
}

/// Runs the whole middle end over the bound declarations:
/// finish instance-body deferment, validate trait impls, bind every
/// function body (materializing instance bodies from their roots), then
/// type-check, lower, run control-flow analysis, propagate referenced
/// monos, and demand glue for every emittable type.
pub fn analyze(
    comp: &mut Compilation<'_>,
    bindings: Vec<FunctionBinding>,
    glue_provider: &dyn glue::GlueBodyProvider,
) -> Diagnosed<SemaProgram> {
    let span = info_span!("analyze");
    let _guard = span.enter();

    let mut diagnostics = DiagnosticBag::new();

    // Declarations are complete; elaborate every deferred instance body
    // and switch the instantiator to immediate mode.
    comp.finish_body_deferment();

    diagnostics.collect(validate::validate_trait_impls(comp));

    let mut root_blocks: HashMap<SymbolId, syntax::Block> = HashMap::new();
    let mut functions: IndexMap<SymbolId, FunctionSema> = IndexMap::new();

    for binding in &bindings {
        root_blocks.insert(
            instantiator::generic_root_of(&comp.graph, binding.symbol),
            binding.block.clone(),
        );
    }

    // Bind the given bodies first (roots bind as placeholders so their
    // monos can be collected), then keep binding the bodies of function
    // instances the previous round materialized, to a fixed point.
    for binding in &bindings {
        let function = diagnostics.collect(bind::bind_function_body(
            comp,
            binding.symbol,
            &binding.block,
        ));
        functions.insert(binding.symbol, function);
    }

    loop {
        let new_instances = unbound_function_instances(comp, &functions, &root_blocks);
        if new_instances.is_empty() {
            break;
        }
        debug!(count = new_instances.len(), "binding instance bodies");
        for instance in new_instances {
            let root = instantiator::generic_root_of(&comp.graph, instance);
            let block = root_blocks[&root].clone();
            let function = diagnostics.collect(bind::bind_function_body(comp, instance, &block));
            functions.insert(instance, function);
        }
    }

    // Type-check and lower every body, roots included: diagnostics on the
    // root surface even when it is never instantiated.
    for (_, function) in functions.iter_mut() {
        *function = {
            let checked = {
                let mut checker = typecheck::TypeChecker::new(comp);
                let checked = checker.typecheck_function(function);
                diagnostics.merge(checker.into_diagnostics());
                checked
            };
            let mut lowerer = lower::Lowerer::new(comp, checked.symbol);
            lowerer.lower_function(&checked)
        };
    }

    for (_, function) in functions.iter() {
        diagnostics.collect(cfa::analyze_function(comp, function));
    }

    // Roots report which placeholder instances their lowered bodies
    // reference; elaborated instances then re-materialize those monos in
    // their own type-argument context.
    for (&symbol, function) in functions.iter() {
        let root = instantiator::generic_root_of(&comp.graph, symbol);
        if root == symbol && instantiator::is_placeholder_symbol(&comp.graph, symbol) {
            let found = monos::collect_monos(comp, function);
            instantiator::set_root_monos(&mut comp.graph, symbol, found);
        }
    }
    diagnostics.collect(comp.instantiate_referenced_monos());

    // Mono propagation may have materialized function instances whose
    // bodies are not bound yet.
    loop {
        let new_instances = unbound_function_instances(comp, &functions, &root_blocks);
        if new_instances.is_empty() {
            break;
        }
        for instance in new_instances {
            let root = instantiator::generic_root_of(&comp.graph, instance);
            let block = root_blocks[&root].clone();
            let bound = diagnostics.collect(bind::bind_function_body(comp, instance, &block));
            let checked = {
                let mut checker = typecheck::TypeChecker::new(comp);
                let checked = checker.typecheck_function(&bound);
                diagnostics.merge(checker.into_diagnostics());
                checked
            };
            let mut lowerer = lower::Lowerer::new(comp, checked.symbol);
            let lowered = lowerer.lower_function(&checked);
            diagnostics.collect(cfa::analyze_function(comp, &lowered));
            functions.insert(instance, lowered);
        }
    }

    let glue_map = diagnostics.collect(glue::generate_glue(comp, glue_provider));

    let items = collect_items(comp, comp.graph.global_scope(), &functions);

    Diagnosed::new(
        SemaProgram {
            functions,
            items,
            glue: glue_map,
            root_blocks,
        },
        diagnostics,
    )
}

/// Groups the analyzed bodies into the item tree: functions declared in an
/// impl body hang off that impl, module bodies recurse, and everything
/// else is a top-level function item. Declaration order is preserved.
fn collect_items(
    comp: &Compilation<'_>,
    scope: ScopeId,
    functions: &IndexMap<SymbolId, FunctionSema>,
) -> Vec<ItemSema> {
    let mut items = Vec::new();

    for symbol in comp.graph.scope(scope).all_symbols() {
        match comp.graph.symbol(symbol) {
            Symbol::Function(_) => {
                if let Some(function) = functions.get(&symbol) {
                    items.push(ItemSema::Function(function.clone()));
                }
            }
            Symbol::InherentImpl(data) => {
                items.push(ItemSema::Impl(ImplSema {
                    symbol,
                    functions: impl_functions(comp, data.body_scope, functions),
                }));
            }
            Symbol::TraitImpl(data) => {
                items.push(ItemSema::Impl(ImplSema {
                    symbol,
                    functions: impl_functions(comp, data.body_scope, functions),
                }));
            }
            Symbol::Module(data) => {
                items.push(ItemSema::Module(ModuleSema {
                    symbol,
                    items: collect_items(comp, data.body_scope, functions),
                }));
            }
            _ => {}
        }
    }

    items
}

fn impl_functions(
    comp: &Compilation<'_>,
    impl_body: ScopeId,
    functions: &IndexMap<SymbolId, FunctionSema>,
) -> Vec<FunctionSema> {
    comp.graph
        .scope(impl_body)
        .all_symbols()
        .filter_map(|member| functions.get(&member).cloned())
        .collect()
}

/// Function instances with a user body binding whose sema body has not
/// been produced yet. Placeholder instances never qualify.
fn unbound_function_instances(
    comp: &Compilation<'_>,
    functions: &IndexMap<SymbolId, FunctionSema>,
    root_blocks: &HashMap<SymbolId, syntax::Block>,
) -> Vec<SymbolId> {
    comp.graph
        .collect_symbols_recursive(comp.graph.global_scope(), |s| {
            matches!(s, Symbol::Function(f) if f.body == BodyKind::User && f.generic_root.is_some())
        })
        .into_iter()
        .filter(|&f| !functions.contains_key(&f))
        .filter(|&f| !instantiator::is_placeholder_symbol(&comp.graph, f))
        .filter(|&f| root_blocks.contains_key(&instantiator::generic_root_of(&comp.graph, f)))
        .collect()
}
