//! Symbol table and scope tables, as produced by the external name resolver.
//!
//! The core reads these and may attach auxiliary info (type-parameter
//! bounds from the Contract Matcher); it never creates new symbols.

use rustc_hash::FxHashMap;
use semacore_common::{ExprId, ScopeId, StringId, SymbolId, TypeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Let,
    Param,
    Const,
    Function,
    Type,
    Tag,
    Import,
    Module,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct SymbolFlags: u16 {
        const MUTABLE     = 1 << 0;
        const ENTRYPOINT  = 1 << 1;
        const COPY        = 1 << 2;
        const NONBLOCKING = 1 << 3;
        const INTRINSIC   = 1 << 4;
        const DEPRECATED  = 1 << 5;
    }
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: StringId,
    pub kind: SymbolKind,
    pub scope: ScopeId,
    pub decl_site: ExprId,
    /// Declared/inferred type; `TypeId::NONE` until the checker fills it in
    /// for symbols whose type is computed lazily (e.g. `const`).
    pub ty: TypeId,
    pub type_params: Vec<StringId>,
    pub type_param_symbols: Vec<SymbolId>,
    pub flags: SymbolFlags,
    /// Canonical receiver string (e.g. `"Foo"`, `"[]"`, `"string"`) used by the Magic Index.
    /// `None` for symbols that aren't magic-method-eligible (no receiver-shaped first parameter).
    pub receiver_key: Option<StringId>,
}

impl Symbol {
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.flags.contains(SymbolFlags::MUTABLE)
    }

    #[must_use]
    pub fn is_copy(&self) -> bool {
        self.flags.contains(SymbolFlags::COPY)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub bindings: FxHashMap<StringId, SymbolId>,
}

/// Per-item, per-statement, per-extern-member maps to scopes and binding
/// symbols, plus the flat symbol/scope arenas themselves.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    /// Per-node symbol resolution: identifier/member node -> the symbol it refers to.
    node_symbols: FxHashMap<ExprId, SymbolId>,
    /// Per-item scope: the scope a declaration's body executes in.
    item_scopes: FxHashMap<ExprId, ScopeId>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId::new(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn push_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(Scope { parent, bindings: FxHashMap::default() });
        id
    }

    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.as_usize()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.as_usize()]
    }

    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.as_usize()]
    }

    pub fn bind(&mut self, scope: ScopeId, name: StringId, symbol: SymbolId) {
        self.scopes[scope.as_usize()].bindings.insert(name, symbol);
    }

    /// Walk up the scope chain looking for `name`.
    #[must_use]
    pub fn lookup(&self, scope: ScopeId, name: StringId) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scope(id);
            if let Some(&sym) = s.bindings.get(&name) {
                return Some(sym);
            }
            current = s.parent;
        }
        None
    }

    pub fn set_node_symbol(&mut self, node: ExprId, symbol: SymbolId) {
        self.node_symbols.insert(node, symbol);
    }

    #[must_use]
    pub fn node_symbol(&self, node: ExprId) -> Option<SymbolId> {
        self.node_symbols.get(&node).copied()
    }

    pub fn set_item_scope(&mut self, item: ExprId, scope: ScopeId) {
        self.item_scopes.insert(item, scope);
    }

    #[must_use]
    pub fn item_scope(&self, item: ExprId) -> Option<ScopeId> {
        self.item_scopes.get(&item).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semacore_common::{ExprId, TypeId};

    fn dummy_symbol(name: StringId, scope: ScopeId) -> Symbol {
        Symbol {
            name,
            kind: SymbolKind::Let,
            scope,
            decl_site: ExprId::new(0),
            ty: TypeId::NONE,
            type_params: Vec::new(),
            type_param_symbols: Vec::new(),
            flags: SymbolFlags::empty(),
            receiver_key: None,
        }
    }

    #[test]
    fn lookup_walks_up_parent_chain() {
        let mut table = SymbolTable::new();
        let outer = table.push_scope(None);
        let inner = table.push_scope(Some(outer));
        let name = StringId::new(7);
        let sym = table.push_symbol(dummy_symbol(name, outer));
        table.bind(outer, name, sym);

        assert_eq!(table.lookup(inner, name), Some(sym));
        assert_eq!(table.lookup(outer, name), Some(sym));
    }

    #[test]
    fn lookup_misses_return_none() {
        let mut table = SymbolTable::new();
        let scope = table.push_scope(None);
        assert_eq!(table.lookup(scope, StringId::new(1)), None);
    }

    #[test]
    fn shadowing_inner_scope_wins() {
        let mut table = SymbolTable::new();
        let outer = table.push_scope(None);
        let inner = table.push_scope(Some(outer));
        let name = StringId::new(3);
        let outer_sym = table.push_symbol(dummy_symbol(name, outer));
        let inner_sym = table.push_symbol(dummy_symbol(name, inner));
        table.bind(outer, name, outer_sym);
        table.bind(inner, name, inner_sym);

        assert_eq!(table.lookup(inner, name), Some(inner_sym));
    }
}
