//! Result Assembly (§4.N): the `Result` artifact described in §3, built
//! incrementally during the walk and finalized after it.

use rustc_hash::FxHashMap;
use semacore_borrow::{BorrowEvent, BorrowInfo};
use semacore_common::{BorrowId, ExprId, ScopeId, SymbolId, TypeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImplicitConversion {
    pub from: TypeId,
    pub to: TypeId,
}

/// A recorded concrete instantiation of a generic symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArgTuple(pub Vec<TypeId>);

#[derive(Clone, Debug, Default)]
pub struct CheckResult {
    pub expr_types: FxHashMap<ExprId, TypeId>,
    pub expr_borrows: FxHashMap<ExprId, BorrowId>,
    pub borrows: Vec<BorrowInfo>,
    pub borrow_events: Vec<BorrowEvent>,
    pub binding_types: FxHashMap<SymbolId, TypeId>,
    pub function_instantiations: FxHashMap<SymbolId, Vec<ArgTuple>>,
    pub implicit_conversions: FxHashMap<ExprId, ImplicitConversion>,
    /// Expressions resolved to a `__to` conversion symbol (§4.M).
    pub to_symbols: FxHashMap<ExprId, SymbolId>,
    /// Operands of `is` expressions, by the tested expression's id.
    pub is_operands: FxHashMap<ExprId, TypeId>,
    /// Operands of `heir` expressions.
    pub heir_operands: FxHashMap<ExprId, (TypeId, TypeId)>,
    pub copy_types: Vec<TypeId>,
    pub item_scopes: FxHashMap<ExprId, ScopeId>,
}

impl CheckResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_expr_type(&mut self, expr: ExprId, ty: TypeId) {
        self.expr_types.insert(expr, ty);
    }

    #[must_use]
    pub fn expr_type(&self, expr: ExprId) -> Option<TypeId> {
        self.expr_types.get(&expr).copied()
    }

    pub fn set_binding_type(&mut self, symbol: SymbolId, ty: TypeId) {
        self.binding_types.insert(symbol, ty);
    }

    /// Record a concrete instantiation, deduplicated by `(symbol, arg-tuple)`
    /// (§8 Property 10, generic inference idempotence).
    pub fn record_instantiation(&mut self, symbol: SymbolId, args: Vec<TypeId>) {
        let entry = self.function_instantiations.entry(symbol).or_default();
        let tuple = ArgTuple(args);
        if !entry.contains(&tuple) {
            entry.push(tuple);
        }
    }

    #[must_use]
    pub fn instantiation_count(&self, symbol: SymbolId) -> usize {
        self.function_instantiations.get(&symbol).map_or(0, Vec::len)
    }

    pub fn record_implicit_conversion(&mut self, expr: ExprId, from: TypeId, to: TypeId) {
        self.implicit_conversions.insert(expr, ImplicitConversion { from, to });
    }

    pub fn mark_copy_type(&mut self, ty: TypeId) {
        if !self.copy_types.contains(&ty) {
            self.copy_types.push(ty);
        }
    }
}
