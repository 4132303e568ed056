// Glue generation: every emittable type gets copy-glue and drop-glue
// function symbols under well-known names in its own scope. The bodies
// come from external glue-body emitters; the core only demands them and
// binds the resulting symbols onto the type.

use emitter::Emitter;
use shared_context::diagnostics::{Diagnosed, DiagnosticBag};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use symbol_graph::natives::{COPY_GLUE_NAME, DROP_GLUE_NAME};
use symbol_graph::scope::ScopeKind;
use symbol_graph::symbols::{BodyKind, FunctionSymbol, GlueKind, ParamVarSymbol, Symbol};
use symbol_graph::{AccessModifier, Compilation, SymbolCategory, SymbolId, instantiator, layout};
use tracing::debug;

/// An externally produced glue body, invoked when the glue function's IR
/// is requested. The closure only captures ids; it reads the compilation
/// at emission time.
pub type GlueBody = Rc<dyn Fn(&Compilation<'_>, &mut dyn Emitter)>;

/// The external glue-body emitters the core calls into.
pub trait GlueBodyProvider {
    fn create_copy_glue_body(&self, comp: &Compilation<'_>, ty: SymbolId, glue: SymbolId)
    -> GlueBody;
    fn create_drop_glue_body(&self, comp: &Compilation<'_>, ty: SymbolId, glue: SymbolId)
    -> GlueBody;
}

/// Glue-function symbol to its externally supplied body.
#[derive(Default)]
pub struct GlueMap {
    pub bodies: HashMap<SymbolId, GlueBody>,
}

/// Demands copy and drop glue for every emittable type: sized, concrete
/// (no placeholder type arguments) and not a reference. Binding is
/// idempotent; types that already carry glue are left alone.
pub fn generate_glue(
    comp: &mut Compilation<'_>,
    provider: &dyn GlueBodyProvider,
) -> Diagnosed<GlueMap> {
    let mut diagnostics = DiagnosticBag::new();
    let mut map = GlueMap::default();

    let structs = comp
        .graph
        .collect_symbols_recursive(comp.graph.global_scope(), |s| matches!(s, Symbol::Struct(_)));

    for &ty in &structs {
        derive_trivial_flags(comp, ty, &mut HashSet::new());
    }

    for &ty in &structs {
        if !is_emittable(comp, ty, &mut diagnostics) {
            continue;
        }

        let (body_scope, has_copy, has_drop) = match comp.graph.symbol(ty) {
            Symbol::Struct(data) => (
                data.body_scope,
                data.copy_glue.is_some(),
                data.drop_glue.is_some(),
            ),
            _ => continue,
        };

        debug!(ty = %comp.symbol_signature(ty), "demanding glue");

        if !has_copy {
            let glue = declare_glue_function(
                comp,
                ty,
                body_scope,
                COPY_GLUE_NAME,
                GlueKind::Copy,
                &mut diagnostics,
            );
            bind_copy_glue(comp, ty, glue);
            map.bodies
                .insert(glue, provider.create_copy_glue_body(comp, ty, glue));
        }
        if !has_drop {
            let glue = declare_glue_function(
                comp,
                ty,
                body_scope,
                DROP_GLUE_NAME,
                GlueKind::Drop,
                &mut diagnostics,
            );
            bind_drop_glue(comp, ty, glue);
            map.bodies
                .insert(glue, provider.create_drop_glue_body(comp, ty, glue));
        }
    }

    Diagnosed::new(map, diagnostics)
}

pub fn bind_copy_glue(comp: &mut Compilation<'_>, ty: SymbolId, glue: SymbolId) {
    if let Symbol::Struct(data) = comp.graph.symbol_mut(ty) {
        data.copy_glue = Some(glue);
    }
}

pub fn bind_drop_glue(comp: &mut Compilation<'_>, ty: SymbolId, glue: SymbolId) {
    if let Symbol::Struct(data) = comp.graph.symbol_mut(ty) {
        data.drop_glue = Some(glue);
    }
}

fn is_emittable(comp: &mut Compilation<'_>, ty: SymbolId, diagnostics: &mut DiagnosticBag) -> bool {
    if comp.is_ref_type(ty) {
        return false;
    }
    if instantiator::is_placeholder_symbol(&comp.graph, ty)
        || instantiator::is_placeholder_type(&comp.graph, ty)
    {
        return false;
    }
    layout::is_sized(&mut comp.graph, ty, diagnostics)
}

/// Copy glue takes `(self: &T, other: &T)`, drop glue takes `(self: &T)`;
/// both return void.
fn declare_glue_function(
    comp: &mut Compilation<'_>,
    ty: SymbolId,
    body_scope: symbol_graph::ScopeId,
    name: &str,
    kind: GlueKind,
    diagnostics: &mut DiagnosticBag,
) -> SymbolId {
    let span = comp.graph.symbol(ty).get_name().get_span();
    let ref_type = diagnostics.collect(comp.instantiate(span, comp.natives.ref_root, vec![ty]));

    let fn_scope = comp
        .graph
        .create_scope(body_scope, ScopeKind::FunctionBody, None);

    let param_names: &[&str] = match kind {
        GlueKind::Copy => &["self", "other"],
        GlueKind::Drop => &["self"],
    };
    let mut params = Vec::with_capacity(param_names.len());
    for (index, param_name) in param_names.iter().enumerate() {
        let ident = comp.intern_ident(param_name, span);
        params.push(
            comp.graph
                .declare_symbol_unchecked(Symbol::Param(ParamVarSymbol {
                    scope: fn_scope,
                    name: ident,
                    var_type: ref_type,
                    index,
                })),
        );
    }

    let ident = comp.intern_ident(name, span);
    let mut function = FunctionSymbol::new(
        body_scope,
        fn_scope,
        ident,
        AccessModifier::Public,
        SymbolCategory::Static,
        comp.natives.void,
        params,
        None,
    );
    function.body = BodyKind::Glue(kind);
    comp.graph.declare_symbol_unchecked(Symbol::Function(function))
}

/// A struct whose fields are all trivially copyable/droppable is itself
/// trivial; its copy glue degenerates to a load and store and its drop
/// glue to nothing. Natives come pre-flagged.
fn derive_trivial_flags(comp: &mut Compilation<'_>, ty: SymbolId, visiting: &mut HashSet<SymbolId>) {
    let ty = comp.graph.unaliased(ty);
    if !visiting.insert(ty) {
        return;
    }

    let (primitively, body_scope) = match comp.graph.symbol(ty) {
        Symbol::Struct(data) => (data.primitively_emittable, data.body_scope),
        _ => return,
    };
    if primitively {
        return;
    }

    let field_types: Vec<SymbolId> = comp
        .graph
        .collect_symbols(body_scope, |s| matches!(s, Symbol::Field(_)))
        .iter()
        .map(|&f| comp.graph.symbol(f).get_var_type().expect("field has a type"))
        .collect();

    let mut copyable = true;
    let mut droppable = true;
    for field_ty in field_types {
        derive_trivial_flags(comp, field_ty, visiting);
        match comp.graph.symbol(comp.graph.unaliased(field_ty)) {
            Symbol::Struct(field_data) => {
                copyable &= field_data.trivially_copyable;
                droppable &= field_data.trivially_droppable;
            }
            Symbol::ErrorType(_) => {}
            _ => {
                copyable = false;
                droppable = false;
            }
        }
    }

    if let Symbol::Struct(data) = comp.graph.symbol_mut(ty) {
        data.trivially_copyable = copyable;
        data.trivially_droppable = droppable;
    }
}

/// Whether a type's values can be copied with a plain load/store.
pub fn is_trivially_copyable(comp: &Compilation<'_>, ty: SymbolId) -> bool {
    match comp.graph.symbol(comp.graph.unaliased(ty)) {
        Symbol::Struct(data) => data.trivially_copyable,
        _ => false,
    }
}
