// The bind stage: recursive descent over the syntax tree, resolving every
// name into a symbol id and producing the sema tree. Binding never stops
// on an error; unresolved pieces become error placeholders and the
// diagnostics ride along in the binder's bag.

use crate::nodes::{ConversionPlaceholderExpr, ExprSema, FunctionSema};
use shared_context::Span;
use shared_context::diagnostics::{Diagnosed, DiagnosticBag};
use std::rc::Rc;
use symbol_graph::{Compilation, ScopeId, SymbolId, TypeInfo, resolution};
use syntax::QualifiedName;
use tracing::debug;

mod bind_expressions;
mod bind_statements;

/// Binds one function body against the function's body scope. For a
/// generic instance this is the root's syntax block; the aliases seeded
/// into the instance scope make its type parameters resolve concretely.
pub fn bind_function_body(
    comp: &mut Compilation<'_>,
    function: SymbolId,
    block: &syntax::Block,
) -> Diagnosed<FunctionSema> {
    let body_scope = comp
        .graph
        .symbol(function)
        .get_body_scope()
        .expect("function has a body scope");

    debug!(
        function = %comp.symbol_signature(function),
        "binding function body"
    );

    let mut binder = Binder::new(comp, body_scope);
    let body = binder.bind_block(block);
    Diagnosed::new(FunctionSema::new(function, body), binder.diagnostics)
}

/// The bind pass state: the compilation, the scope binding is currently
/// inside of, and the accumulated diagnostics.
pub(crate) struct Binder<'c, 'a> {
    pub(crate) comp: &'c mut Compilation<'a>,
    pub(crate) diagnostics: DiagnosticBag,
    pub(crate) current_scope: ScopeId,
}

impl<'c, 'a> Binder<'c, 'a> {
    pub(crate) fn new(comp: &'c mut Compilation<'a>, scope: ScopeId) -> Self {
        Self {
            comp,
            diagnostics: DiagnosticBag::new(),
            current_scope: scope,
        }
    }

    pub(crate) fn resolve_type(&mut self, name: &QualifiedName) -> SymbolId {
        self.diagnostics
            .collect(resolution::resolve_type(self.comp, self.current_scope, name))
    }

    pub(crate) fn resolve_static(
        &mut self,
        name: &QualifiedName,
        arg_types: Option<&[TypeInfo]>,
    ) -> SymbolId {
        self.diagnostics.collect(resolution::resolve_static_symbol(
            self.comp,
            self.current_scope,
            name,
            arg_types,
        ))
    }

    /// The expression that stands in when binding failed outright.
    pub(crate) fn error_expr(&self, span: Span) -> Rc<ExprSema> {
        Rc::new(ExprSema::ConversionPlaceholder(ConversionPlaceholderExpr {
            span,
            info: TypeInfo::rvalue(self.comp.error_type()),
        }))
    }
}
