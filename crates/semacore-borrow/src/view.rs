//! Array-view tracking (§4.I "Array views").
//!
//! Slicing an array via a `Range<Int>` index yields a non-owning, non-
//! resizable "array view". Views and bindings holding them reject the
//! resize-family call shapes (`push`, `pop`, `reserve`).

use rustc_hash::FxHashSet;
use semacore_common::{ExprId, SymbolId};

const RESIZE_METHODS: &[&str] = &["push", "pop", "reserve"];

#[must_use]
pub fn is_resize_method(name: &str) -> bool {
    RESIZE_METHODS.contains(&name)
}

#[derive(Debug, Default)]
pub struct ViewTable {
    view_exprs: FxHashSet<ExprId>,
    view_bindings: FxHashSet<SymbolId>,
}

impl ViewTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_view_expr(&mut self, expr: ExprId) {
        self.view_exprs.insert(expr);
    }

    #[must_use]
    pub fn is_view_expr(&self, expr: ExprId) -> bool {
        self.view_exprs.contains(&expr)
    }

    pub fn mark_view_binding(&mut self, symbol: SymbolId) {
        self.view_bindings.insert(symbol);
    }

    #[must_use]
    pub fn is_view_binding(&self, symbol: SymbolId) -> bool {
        self.view_bindings.contains(&symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_methods_are_recognized() {
        assert!(is_resize_method("push"));
        assert!(is_resize_method("pop"));
        assert!(is_resize_method("reserve"));
        assert!(!is_resize_method("len"));
    }

    #[test]
    fn bindings_marked_as_views_are_remembered() {
        let mut table = ViewTable::new();
        let sym = SymbolId::new(3);
        assert!(!table.is_view_binding(sym));
        table.mark_view_binding(sym);
        assert!(table.is_view_binding(sym));
    }
}
