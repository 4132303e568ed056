use crate::symbols::Symbol;
use crate::{ScopeId, SymbolId};
use indexmap::IndexMap;
use shared_context::Span;
use shared_context::diagnostics::{Diagnosed, Diagnostic, DiagnosticBag, DiagnosticNote};
use shared_context::interner::NameId;
use std::collections::{HashMap, HashSet};

/// What introduced a scope. Drives accessibility (module subtrees) and
/// signature building (named scopes appear in qualified names).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Module,
    /// Body of a struct or trait.
    TypeBody,
    /// Body of an inherent or trait impl.
    ImplBody,
    /// Parameters and locals of a function or prototype.
    FunctionBody,
    Block,
}

/// Per-scope state of the generic instantiator (spec: deferred queues,
/// root registry, instance bookkeeping). Owned by the scope, driven by
/// `crate::instantiator`.
#[derive(Debug, Default)]
pub struct InstantiatorState {
    pub(crate) name_to_root: HashMap<NameId, SymbolId>,
    pub(crate) root_to_monos: HashMap<SymbolId, Vec<SymbolId>>,
    pub(crate) instance_set: HashSet<SymbolId>,
    pub(crate) instance_spans: HashMap<SymbolId, Span>,
    pub(crate) deferred_instances: Vec<SymbolId>,
    pub(crate) referenced_monos_instances: Vec<SymbolId>,
    pub(crate) defer_bodies: bool,
}

impl InstantiatorState {
    fn new() -> Self {
        Self {
            // bodies are deferred until binding finishes; see
            // instantiator::finish_body_deferment
            defer_bodies: true,
            ..Self::default()
        }
    }
}

/// A node in the lexical scope tree. Owns its symbols in declaration order
/// and carries association edges to non-lexical peers (a type's body scope
/// is associated with its impls' body scopes).
#[derive(Debug)]
pub struct Scope {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    associations: Vec<ScopeId>,
    kind: ScopeKind,
    name: Option<NameId>,
    owner: Option<SymbolId>,
    symbols: IndexMap<NameId, Vec<SymbolId>>,
    pub(crate) instantiator: InstantiatorState,
}

impl Scope {
    fn new(parent: Option<ScopeId>, kind: ScopeKind, name: Option<NameId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            associations: Vec::new(),
            kind,
            name,
            owner: None,
            symbols: IndexMap::new(),
            instantiator: InstantiatorState::new(),
        }
    }

    pub fn get_parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn get_children(&self) -> &[ScopeId] {
        &self.children
    }

    pub fn get_associations(&self) -> &[ScopeId] {
        &self.associations
    }

    pub fn get_kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn get_name(&self) -> Option<NameId> {
        self.name
    }

    /// The body-scoped symbol this scope is the body of, if any.
    pub fn get_owner(&self) -> Option<SymbolId> {
        self.owner
    }

    /// Symbols declared under `name`, in declaration order.
    pub fn get_symbols_named(&self, name: NameId) -> &[SymbolId] {
        self.symbols.get(&name).map_or(&[], Vec::as_slice)
    }

    /// Every symbol in the scope, in declaration order per name bucket and
    /// name buckets in first-declaration order. Struct field layout relies
    /// on this ordering.
    pub fn all_symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.values().flatten().copied()
    }
}

/// Owns every scope and symbol of one compilation. All cross references are
/// ids into these two tables; nothing is removed while the compilation is
/// alive.
#[derive(Debug)]
pub struct SymbolGraph {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl SymbolGraph {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None, ScopeKind::Global, None)],
            symbols: Vec::new(),
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn create_scope(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        name: Option<NameId>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(Some(parent), kind, name));
        self.scope_mut(parent).children.push(id);
        id
    }

    /// Adds an association edge: `scope`'s lookups also consult `peer`.
    pub fn associate(&mut self, scope: ScopeId, peer: ScopeId) {
        let scope = self.scope_mut(scope);
        if !scope.associations.contains(&peer) {
            scope.associations.push(peer);
        }
    }

    /// Declares a symbol into its scope, reporting a conflict when a symbol
    /// with the same name, overload signature and template role already
    /// exists there. The conflict diagnostic carries the prior declaration.
    pub fn declare_symbol(&mut self, symbol: Symbol) -> Diagnosed<SymbolId> {
        let mut diagnostics = DiagnosticBag::new();

        let scope_id = symbol.get_scope();
        let name = symbol.get_name().get_name();

        let prior = self
            .scope(scope_id)
            .get_symbols_named(name)
            .iter()
            .copied()
            .find(|&existing| self.symbol(existing).conflicts_with(&symbol, self));

        if let Some(prior) = prior {
            let prior_span = self.symbol(prior).get_name().get_span();
            diagnostics.add(
                Diagnostic::error(
                    symbol.get_name().get_span(),
                    format!("{} is already declared", symbol.get_noun()),
                )
                .with_note(DiagnosticNote::new(
                    "previously declared here",
                    Some(prior_span),
                )),
            );
            return Diagnosed::new(prior, diagnostics);
        }

        let id = self.insert_symbol(symbol);
        crate::instantiator::on_symbol_declared(self, id);
        Diagnosed::new(id, diagnostics)
    }

    /// Declares without conflict checking. Used by instantiation, where the
    /// inserted symbols are substitution copies that cannot conflict.
    pub fn declare_symbol_unchecked(&mut self, symbol: Symbol) -> SymbolId {
        let id = self.insert_symbol(symbol);
        crate::instantiator::on_symbol_declared(self, id);
        id
    }

    fn insert_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        let scope_id = symbol.get_scope();
        let name = symbol.get_name().get_name();
        let body_scope = symbol.get_body_scope();

        self.symbols.push(symbol);
        self.scope_mut(scope_id)
            .symbols
            .entry(name)
            .or_default()
            .push(id);

        // Body scopes learn which symbol they belong to; signatures and
        // instance lookup both walk this edge.
        if let Some(body) = body_scope {
            let body = self.scope_mut(body);
            body.owner = Some(id);
            if body.name.is_none() {
                body.name = Some(name);
            }
        }

        id
    }

    /// Follows alias targets until a non-alias symbol is reached. Most
    /// comparisons and lookups work on unaliased symbols.
    pub fn unaliased(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        // aliases are compiler-introduced and acyclic; the bound guards
        // against internal corruption rather than user input
        for _ in 0..64 {
            match self.symbol(current) {
                Symbol::Alias(alias) => current = alias.target,
                _ => return current,
            }
        }
        current
    }

    /// Symbols of one scope matching `pred`, in declaration order.
    pub fn collect_symbols(
        &self,
        scope: ScopeId,
        pred: impl Fn(&Symbol) -> bool,
    ) -> Vec<SymbolId> {
        self.scope(scope)
            .all_symbols()
            .filter(|&id| pred(self.symbol(id)))
            .collect()
    }

    /// Like `collect_symbols`, but walks the whole lexical subtree.
    pub fn collect_symbols_recursive(
        &self,
        scope: ScopeId,
        pred: impl Fn(&Symbol) -> bool + Copy,
    ) -> Vec<SymbolId> {
        let mut found = self.collect_symbols(scope, pred);
        for &child in self.scope(scope).get_children() {
            found.extend(self.collect_symbols_recursive(child, pred));
        }
        found
    }

    /// The scope and all its lexical ancestors, innermost first.
    pub fn scope_chain(&self, from: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![from];
        let mut current = from;
        while let Some(parent) = self.scope(current).get_parent() {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Whether `scope` lies inside the subtree rooted at `ancestor`.
    pub fn is_within(&self, scope: ScopeId, ancestor: ScopeId) -> bool {
        self.scope_chain(scope).contains(&ancestor)
    }

    /// The nearest enclosing module (or global) scope. Accessibility of
    /// private symbols is defined over this subtree.
    pub fn enclosing_module_scope(&self, from: ScopeId) -> ScopeId {
        for id in self.scope_chain(from) {
            match self.scope(id).get_kind() {
                ScopeKind::Module | ScopeKind::Global => return id,
                _ => {}
            }
        }
        self.global_scope()
    }
}

impl Default for SymbolGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccessModifier;
    use crate::compilation::Compilation;
    use crate::symbols::{LocalVarSymbol, Symbol};
    use crate::test_support::{declare_function, declare_struct, sp};
    use shared_context::Bump;

    #[test]
    fn redeclaring_a_local_reports_the_prior_declaration() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let global = comp.graph.global_scope();
        let block = comp.graph.create_scope(global, ScopeKind::Block, None);
        let int32 = comp.natives.int32;

        let first = comp.intern_ident("value", sp(0));
        let (_, bag) = comp
            .graph
            .declare_symbol(Symbol::Local(LocalVarSymbol {
                scope: block,
                name: first,
                var_type: int32,
            }))
            .into_parts();
        assert!(bag.is_empty());

        let second = comp.intern_ident("value", sp(5));
        let (_, bag) = comp
            .graph
            .declare_symbol(Symbol::Local(LocalVarSymbol {
                scope: block,
                name: second,
                var_type: int32,
            }))
            .into_parts();
        assert!(bag.has_errors());
        let diagnostic = bag.iter().next().unwrap();
        assert!(diagnostic.get_message().contains("already declared"));
        assert_eq!(
            diagnostic.get_notes()[0].get_span(),
            Some(sp(0)),
            "the conflict points at the first declaration"
        );
    }

    #[test]
    fn functions_overload_on_parameter_types() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let global = comp.graph.global_scope();
        let int32 = comp.natives.int32;
        let float32 = comp.natives.float32;

        let a = declare_function(&mut comp, global, "f", &[int32], int32);
        let b = declare_function(&mut comp, global, "f", &[float32], int32);
        assert_ne!(a, b, "different parameter types overload");

        // the same signature again is a conflict
        let body = comp.graph.create_scope(global, ScopeKind::FunctionBody, None);
        let ident = comp.intern_ident("p0", sp(1));
        let param = comp
            .graph
            .declare_symbol_unchecked(Symbol::Param(crate::symbols::ParamVarSymbol {
                scope: body,
                name: ident,
                var_type: int32,
                index: 0,
            }));
        let f_ident = comp.intern_ident("f", sp(2));
        let dup = crate::symbols::FunctionSymbol::new(
            global,
            body,
            f_ident,
            AccessModifier::Public,
            crate::SymbolCategory::Static,
            int32,
            vec![param],
            None,
        );
        let (existing, bag) = comp
            .graph
            .declare_symbol(Symbol::Function(dup))
            .into_parts();
        assert!(bag.has_errors());
        assert_eq!(existing, a, "the prior declaration is handed back");
    }

    #[test]
    fn symbols_are_collected_in_declaration_order() {
        let arena = Bump::new();
        let mut comp = Compilation::new(&arena, "t", "");
        let global = comp.graph.global_scope();
        let int32 = comp.natives.int32;

        let point = declare_struct(
            &mut comp,
            global,
            "Point",
            AccessModifier::Public,
            &[("x", int32), ("y", int32), ("z", int32)],
        );
        let names: Vec<&str> = comp
            .struct_fields(point)
            .iter()
            .map(|&f| comp.interner.lookup(comp.graph.symbol(f).get_name().get_name()))
            .collect();
        assert_eq!(names, ["x", "y", "z"]);
    }
}
