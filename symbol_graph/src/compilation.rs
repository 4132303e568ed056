use crate::instantiator::{self, InstantiationContext};
use crate::natives::Natives;
use crate::scope::SymbolGraph;
use crate::symbols::Symbol;
use crate::{ScopeId, SymbolCategory, SymbolId};
use shared_context::diagnostics::{Diagnosed, DiagnosticBag};
use shared_context::interner::Interner;
use shared_context::source_map::SourceMap;
use shared_context::{Bump, Ident, Span, anonymous_name};

/// Everything one compilation shares: the interner, the source map, the
/// symbol graph and the native-symbol table. Threaded by `&mut` through
/// every pass; there is no process-wide state.
pub struct Compilation<'a> {
    pub interner: Interner<'a>,
    pub source_map: SourceMap<'a>,
    pub graph: SymbolGraph,
    pub natives: Natives,
    anon_counter: usize,
}

impl<'a> Compilation<'a> {
    /// Builds a fresh compilation: global scope, then the native symbols.
    /// Natives are bound exactly once, before any user code is resolved.
    pub fn new(arena: &'a Bump, file_name: &'a str, source_code: &'a str) -> Self {
        let mut interner = Interner::new(arena);
        let mut graph = SymbolGraph::new();
        let natives = Natives::install(&mut graph, &mut interner);

        Self {
            interner,
            source_map: SourceMap::new(file_name, source_code),
            graph,
            natives,
            anon_counter: 0,
        }
    }

    /// A fresh compiler-introduced identifier.
    pub fn next_anonymous_ident(&mut self, span: Span) -> Ident {
        let name = anonymous_name(self.anon_counter);
        self.anon_counter += 1;
        Ident::new(self.interner.intern(&name), span)
    }

    pub fn intern_ident(&mut self, name: &str, span: Span) -> Ident {
        Ident::new(self.interner.intern(name), span)
    }

    pub fn name_text(&self, ident: Ident) -> &'a str {
        self.interner.lookup(ident.get_name())
    }

    pub fn error_type(&self) -> SymbolId {
        self.natives.error_type
    }

    pub fn is_error_type(&self, id: SymbolId) -> bool {
        matches!(
            self.graph.symbol(self.graph.unaliased(id)),
            Symbol::ErrorType(_)
        )
    }

    /// Whether `id` is a `&T`, an instance of the native reference type.
    pub fn is_ref_type(&self, id: SymbolId) -> bool {
        self.has_generic_root(id, self.natives.ref_root)
    }

    pub fn is_strong_ptr_type(&self, id: SymbolId) -> bool {
        self.has_generic_root(id, self.natives.strong_ptr_root)
    }

    pub fn is_ptr_type(&self, id: SymbolId) -> bool {
        self.graph.unaliased(id) == self.natives.ptr
    }

    fn has_generic_root(&self, id: SymbolId, root: SymbolId) -> bool {
        let id = self.graph.unaliased(id);
        id == root || self.graph.symbol(id).get_generic_root_hint() == Some(root)
    }

    /// The pointee of a reference or strong-pointer type.
    pub fn pointee_type(&self, id: SymbolId) -> Option<SymbolId> {
        let id = self.graph.unaliased(id);
        if self.is_ref_type(id) || self.is_strong_ptr_type(id) {
            self.graph.symbol(id).get_type_args().first().copied()
        } else {
            None
        }
    }

    /// Strips reference layers off a type, for member lookup on `value.x`
    /// where `value` is a `&T` or `StrongPtr[T]`.
    pub fn deref_for_access(&self, id: SymbolId) -> SymbolId {
        let mut current = self.graph.unaliased(id);
        while let Some(pointee) = self.pointee_type(current) {
            current = self.graph.unaliased(pointee);
        }
        current
    }

    /// Instance fields of a struct, in layout order.
    pub fn struct_fields(&self, struct_id: SymbolId) -> Vec<SymbolId> {
        let struct_id = self.graph.unaliased(struct_id);
        let Symbol::Struct(data) = self.graph.symbol(struct_id) else {
            return Vec::new();
        };
        let mut fields = self
            .graph
            .collect_symbols(data.body_scope, |s| matches!(s, Symbol::Field(_)));
        fields.sort_by_key(|&f| match self.graph.symbol(f) {
            Symbol::Field(field) => field.index,
            _ => usize::MAX,
        });
        fields
    }

    pub fn is_trait_implemented(&self, type_id: SymbolId, trait_id: SymbolId) -> bool {
        is_trait_implemented(&self.graph, type_id, trait_id)
    }

    pub fn trait_impl_for(&self, type_id: SymbolId, trait_id: SymbolId) -> Option<SymbolId> {
        trait_impl_for(&self.graph, type_id, trait_id)
    }

    pub fn partial_signature(&self, id: SymbolId) -> String {
        partial_signature_of(&self.graph, &self.interner, id)
    }

    pub fn symbol_signature(&self, id: SymbolId) -> String {
        signature_of(&self.graph, &self.interner, id)
    }

    pub fn fully_qualified_name(&self, id: SymbolId) -> String {
        fully_qualified_name_of(&self.graph, &self.interner, id)
    }

    pub fn symbol_phrase(&self, id: SymbolId) -> String {
        symbol_phrase_of(&self.graph, &self.interner, id)
    }

    /// Materializes (or finds) the instance of a generic root for the
    /// given type arguments.
    pub fn instantiate(
        &mut self,
        span: Span,
        root: SymbolId,
        args: Vec<SymbolId>,
    ) -> Diagnosed<SymbolId> {
        instantiator::instantiate_or_get(&mut self.graph, &self.natives, &self.interner, span, root, args)
    }

    /// Applies a type-argument substitution, materializing any generic
    /// instances the substitution produces.
    pub fn substitute_type(
        &mut self,
        ty: SymbolId,
        ctx: &InstantiationContext,
        span: Span,
        diagnostics: &mut DiagnosticBag,
    ) -> SymbolId {
        crate::substitution::substitute_type(
            &mut self.graph,
            &self.natives,
            &self.interner,
            ty,
            ctx,
            span,
            diagnostics,
        )
    }

    pub fn finish_body_deferment(&mut self) {
        instantiator::finish_body_deferment(&mut self.graph, &self.natives, &self.interner);
    }

    pub fn instantiate_referenced_monos(&mut self) -> Diagnosed<()> {
        instantiator::instantiate_referenced_monos(&mut self.graph, &self.natives, &self.interner)
    }
}

/// Whether `trait_id` is implemented for `type_id`: a matching trait impl
/// is associated with the type's body scope, or (for a type parameter) a
/// constraint in scope promises the impl.
pub fn is_trait_implemented(graph: &SymbolGraph, type_id: SymbolId, trait_id: SymbolId) -> bool {
    let type_id = graph.unaliased(type_id);
    let trait_id = graph.unaliased(trait_id);

    match graph.symbol(type_id) {
        Symbol::ErrorType(_) => true,
        Symbol::TypeParam(param) => {
            let scope = param.scope;
            graph
                .collect_symbols(scope, |s| matches!(s, Symbol::Constraint(_)))
                .iter()
                .any(|&c| match graph.symbol(c) {
                    Symbol::Constraint(constraint) => {
                        graph.unaliased(constraint.type_param) == type_id
                            && constraint
                                .traits
                                .iter()
                                .any(|&t| graph.unaliased(t) == trait_id)
                    }
                    _ => false,
                })
        }
        _ => trait_impl_for(graph, type_id, trait_id).is_some(),
    }
}

/// The trait impl symbol implementing `trait_id` for `type_id`, if any.
pub fn trait_impl_for(graph: &SymbolGraph, type_id: SymbolId, trait_id: SymbolId) -> Option<SymbolId> {
    let type_id = graph.unaliased(type_id);
    let trait_id = graph.unaliased(trait_id);
    let body = graph.symbol(type_id).get_body_scope()?;

    for &assoc in graph.scope(body).get_associations() {
        let Some(owner) = graph.scope(assoc).get_owner() else {
            continue;
        };
        if let Symbol::TraitImpl(data) = graph.symbol(owner) {
            if graph.unaliased(data.implemented_trait) == trait_id {
                return Some(owner);
            }
        }
    }
    None
}

/// The local signature of a symbol: its name plus rendered type args.
pub fn partial_signature_of(graph: &SymbolGraph, interner: &Interner<'_>, id: SymbolId) -> String {
    let id = graph.unaliased(id);
    let symbol = graph.symbol(id);
    let mut signature = interner.lookup(symbol.get_name().get_name()).to_string();

    let type_args = symbol.get_type_args();
    if !type_args.is_empty() {
        signature.push('[');
        for (i, &arg) in type_args.iter().enumerate() {
            if i > 0 {
                signature.push_str(", ");
            }
            signature.push_str(&partial_signature_of(graph, interner, arg));
        }
        signature.push(']');
    }

    signature
}

/// The qualified signature: enclosing named scopes joined by `::`, with
/// `.` before instance members.
pub fn signature_of(graph: &SymbolGraph, interner: &Interner<'_>, id: SymbolId) -> String {
    let id = graph.unaliased(id);
    let symbol = graph.symbol(id);

    let mut prefix = String::new();
    let chain = graph.scope_chain(symbol.get_scope());
    for &scope in chain.iter().rev() {
        if let Some(name) = graph.scope(scope).get_name() {
            if !prefix.is_empty() {
                prefix.push_str("::");
            }
            prefix.push_str(interner.lookup(name));
        }
    }

    let separator = match symbol.get_category() {
        SymbolCategory::Instance => ".",
        SymbolCategory::Static => "::",
    };

    if prefix.is_empty() {
        partial_signature_of(graph, interner, id)
    } else {
        format!("{}{}{}", prefix, separator, partial_signature_of(graph, interner, id))
    }
}

/// The globally rooted name of a symbol, `::` separated throughout. When
/// static resolution succeeds, resolving this string again (after
/// normalization) reaches the same symbol.
pub fn fully_qualified_name_of(
    graph: &SymbolGraph,
    interner: &Interner<'_>,
    id: SymbolId,
) -> String {
    let id = graph.unaliased(id);
    let symbol = graph.symbol(id);

    let mut name = String::new();
    let chain = graph.scope_chain(symbol.get_scope());
    for &scope in chain.iter().rev() {
        if let Some(scope_name) = graph.scope(scope).get_name() {
            name.push_str(interner.lookup(scope_name));
            name.push_str("::");
        }
    }
    name.push_str(&partial_signature_of(graph, interner, id));
    name
}

/// The phrase diagnostics use for a symbol: noun plus signature.
pub fn symbol_phrase_of(graph: &SymbolGraph, interner: &Interner<'_>, id: SymbolId) -> String {
    let symbol = graph.symbol(graph.unaliased(id));
    format!(
        "{} `{}`",
        symbol.get_noun(),
        signature_of(graph, interner, id)
    )
}

/// The nearest module scope enclosing a symbol's declaration; private
/// symbols are visible exactly within this subtree.
pub fn declaring_module_scope(graph: &SymbolGraph, id: SymbolId) -> ScopeId {
    graph.enclosing_module_scope(graph.symbol(id).get_scope())
}
