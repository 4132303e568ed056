// Builders shared by the unit tests. They stand in for the external
// declaration binder, wiring symbols straight through the graph API.

#![allow(dead_code)]

use crate::compilation::Compilation;
use crate::scope::ScopeKind;
use crate::symbols::{
    FieldVarSymbol, FunctionSymbol, ModuleSymbol, ParamVarSymbol, StructSymbol, Symbol,
};
use crate::{AccessModifier, ScopeId, SymbolCategory, SymbolId};
use shared_context::Span;
use shared_context::diagnostics::DiagnosticBag;

pub(crate) fn sp(offset: usize) -> Span {
    Span::new(offset, offset + 1, 1)
}

pub(crate) fn declare_struct(
    comp: &mut Compilation<'_>,
    scope: ScopeId,
    name: &str,
    access: AccessModifier,
    fields: &[(&str, SymbolId)],
) -> SymbolId {
    let ident = comp.intern_ident(name, sp(0));
    let body = comp
        .graph
        .create_scope(scope, ScopeKind::TypeBody, Some(ident.get_name()));

    for (index, &(field_name, field_type)) in fields.iter().enumerate() {
        let field_ident = comp.intern_ident(field_name, sp(index + 1));
        comp.graph
            .declare_symbol_unchecked(Symbol::Field(FieldVarSymbol {
                scope: body,
                name: field_ident,
                access: AccessModifier::Public,
                var_type: field_type,
                index,
            }));
    }

    let mut bag = DiagnosticBag::new();
    bag.collect(comp.graph.declare_symbol(Symbol::Struct(StructSymbol::new(
        scope,
        body,
        ident,
        access,
        Vec::new(),
        Vec::new(),
    ))))
}

pub(crate) fn declare_function(
    comp: &mut Compilation<'_>,
    scope: ScopeId,
    name: &str,
    params: &[SymbolId],
    return_type: SymbolId,
) -> SymbolId {
    let body = comp.graph.create_scope(scope, ScopeKind::FunctionBody, None);

    let mut param_ids = Vec::with_capacity(params.len());
    for (index, &param_type) in params.iter().enumerate() {
        let param_ident = comp.intern_ident(&format!("p{index}"), sp(index));
        param_ids.push(
            comp.graph
                .declare_symbol_unchecked(Symbol::Param(ParamVarSymbol {
                    scope: body,
                    name: param_ident,
                    var_type: param_type,
                    index,
                })),
        );
    }

    let ident = comp.intern_ident(name, sp(0));
    let function = FunctionSymbol::new(
        scope,
        body,
        ident,
        AccessModifier::Public,
        SymbolCategory::Static,
        return_type,
        param_ids,
        None,
    );
    let mut bag = DiagnosticBag::new();
    bag.collect(comp.graph.declare_symbol(Symbol::Function(function)))
}

pub(crate) fn declare_module(
    comp: &mut Compilation<'_>,
    scope: ScopeId,
    name: &str,
) -> (SymbolId, ScopeId) {
    let ident = comp.intern_ident(name, sp(0));
    let body = comp
        .graph
        .create_scope(scope, ScopeKind::Module, Some(ident.get_name()));
    let mut bag = DiagnosticBag::new();
    let module = bag.collect(comp.graph.declare_symbol(Symbol::Module(ModuleSymbol {
        scope,
        body_scope: body,
        name: ident,
        access: AccessModifier::Public,
    })));
    (module, body)
}
