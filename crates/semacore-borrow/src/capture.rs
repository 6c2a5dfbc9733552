//! Free-identifier capture scan, used by spawn/blocking thread-escape
//! detection (§4.I "Spawn/thread escape").
//!
//! Walks the subtree rooted at a `spawn`/`async`/blocking-block body and
//! collects every symbol referenced by an `Identifier` node that is not
//! itself bound by a `let`/`param`/`for-in` inside that same subtree.

use rustc_hash::FxHashSet;
use semacore_ast::{Builder, NodeKind, SymbolTable};
use semacore_common::{ExprId, SymbolId};

/// Collect the set of symbols referenced inside `root`'s subtree that are
/// bound *outside* it (its free variables).
#[must_use]
pub fn free_identifiers(builder: &Builder, symbols: &SymbolTable, root: ExprId) -> Vec<SymbolId> {
    let mut bound_locally = FxHashSet::default();
    let mut referenced = Vec::new();
    let mut seen = FxHashSet::default();
    walk(builder, symbols, root, &mut bound_locally, &mut referenced, &mut seen);
    referenced.retain(|sym| !bound_locally.contains(sym));
    referenced
}

fn walk(
    builder: &Builder,
    symbols: &SymbolTable,
    id: ExprId,
    bound_locally: &mut FxHashSet<SymbolId>,
    referenced: &mut Vec<SymbolId>,
    seen: &mut FxHashSet<ExprId>,
) {
    if !seen.insert(id) {
        return;
    }
    let Some(node) = builder.get(id) else { return };

    match &node.kind {
        NodeKind::Identifier(_) => {
            if let Some(sym) = symbols.node_symbol(id) {
                referenced.push(sym);
            }
        }
        NodeKind::Group(e) | NodeKind::DropStmt(e) | NodeKind::ExprStmt(e) => {
            walk(builder, symbols, *e, bound_locally, referenced, seen);
        }
        NodeKind::Unary { operand, .. } => walk(builder, symbols, *operand, bound_locally, referenced, seen),
        NodeKind::Binary { left, right, .. } => {
            walk(builder, symbols, *left, bound_locally, referenced, seen);
            walk(builder, symbols, *right, bound_locally, referenced, seen);
        }
        NodeKind::Ternary { cond, then_branch, else_branch } => {
            walk(builder, symbols, *cond, bound_locally, referenced, seen);
            walk(builder, symbols, *then_branch, bound_locally, referenced, seen);
            walk(builder, symbols, *else_branch, bound_locally, referenced, seen);
        }
        NodeKind::Call { callee, args, .. } => {
            walk(builder, symbols, *callee, bound_locally, referenced, seen);
            for a in args {
                walk(builder, symbols, *a, bound_locally, referenced, seen);
            }
        }
        NodeKind::ArrayLiteral(elems) | NodeKind::TupleLiteral(elems) => {
            for e in elems {
                walk(builder, symbols, *e, bound_locally, referenced, seen);
            }
        }
        NodeKind::MapLiteral(pairs) => {
            for (k, v) in pairs {
                walk(builder, symbols, *k, bound_locally, referenced, seen);
                walk(builder, symbols, *v, bound_locally, referenced, seen);
            }
        }
        NodeKind::RangeLiteral { start, end } => {
            walk(builder, symbols, *start, bound_locally, referenced, seen);
            walk(builder, symbols, *end, bound_locally, referenced, seen);
        }
        NodeKind::Index { base, index } => {
            walk(builder, symbols, *base, bound_locally, referenced, seen);
            walk(builder, symbols, *index, bound_locally, referenced, seen);
        }
        NodeKind::Member { base, .. } => walk(builder, symbols, *base, bound_locally, referenced, seen),
        NodeKind::TupleIndex { base, .. } => walk(builder, symbols, *base, bound_locally, referenced, seen),
        NodeKind::Cast { base, .. } => walk(builder, symbols, *base, bound_locally, referenced, seen),
        NodeKind::Compare { subject, arms } => {
            walk(builder, symbols, *subject, bound_locally, referenced, seen);
            for arm in arms {
                walk(builder, symbols, arm.pattern, bound_locally, referenced, seen);
                if let Some(g) = arm.guard {
                    walk(builder, symbols, g, bound_locally, referenced, seen);
                }
                walk(builder, symbols, arm.body, bound_locally, referenced, seen);
            }
        }
        NodeKind::Select { arms, default, .. } => {
            for arm in arms {
                walk(builder, symbols, arm.awaitable, bound_locally, referenced, seen);
                walk(builder, symbols, arm.body, bound_locally, referenced, seen);
            }
            if let Some(d) = default {
                walk(builder, symbols, *d, bound_locally, referenced, seen);
            }
        }
        NodeKind::AsyncBlock { body } | NodeKind::BlockingBlock { body } | NodeKind::Spawn { body, .. } => {
            walk(builder, symbols, *body, bound_locally, referenced, seen);
        }
        NodeKind::StructLiteral { fields, .. } => {
            for f in fields {
                walk(builder, symbols, f.value, bound_locally, referenced, seen);
            }
        }
        NodeKind::Block { stmts, tail } => {
            for s in stmts {
                walk(builder, symbols, *s, bound_locally, referenced, seen);
            }
            if let Some(t) = tail {
                walk(builder, symbols, *t, bound_locally, referenced, seen);
            }
        }
        NodeKind::LetStmt { symbol, init, .. } => {
            bound_locally.insert(*symbol);
            if let Some(i) = init {
                walk(builder, symbols, *i, bound_locally, referenced, seen);
            }
        }
        NodeKind::ConstStmt { symbol, init, .. } => {
            bound_locally.insert(*symbol);
            walk(builder, symbols, *init, bound_locally, referenced, seen);
        }
        NodeKind::ReturnStmt(value) => {
            if let Some(v) = value {
                walk(builder, symbols, *v, bound_locally, referenced, seen);
            }
        }
        NodeKind::IfStmt { cond, then_branch, else_branch } => {
            walk(builder, symbols, *cond, bound_locally, referenced, seen);
            walk(builder, symbols, *then_branch, bound_locally, referenced, seen);
            if let Some(e) = else_branch {
                walk(builder, symbols, *e, bound_locally, referenced, seen);
            }
        }
        NodeKind::WhileStmt { cond, body } => {
            walk(builder, symbols, *cond, bound_locally, referenced, seen);
            walk(builder, symbols, *body, bound_locally, referenced, seen);
        }
        NodeKind::ForStmt { init, cond, step, body } => {
            if let Some(i) = init {
                walk(builder, symbols, *i, bound_locally, referenced, seen);
            }
            if let Some(c) = cond {
                walk(builder, symbols, *c, bound_locally, referenced, seen);
            }
            if let Some(s) = step {
                walk(builder, symbols, *s, bound_locally, referenced, seen);
            }
            walk(builder, symbols, *body, bound_locally, referenced, seen);
        }
        NodeKind::ForInStmt { binding, iterable, body } => {
            bound_locally.insert(*binding);
            walk(builder, symbols, *iterable, bound_locally, referenced, seen);
            walk(builder, symbols, *body, bound_locally, referenced, seen);
        }
        // Literals and items: items don't nest expressions relevant to a capture scan.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semacore_ast::{Symbol, SymbolFlags, SymbolKind};
    use semacore_common::{ScopeId, Span, StringId, TypeId};

    #[test]
    fn identifier_outside_the_subtree_is_free() {
        let mut builder = Builder::new();
        let mut symbols = SymbolTable::new();
        let scope = symbols.push_scope(None);
        let x = symbols.push_symbol(Symbol {
            name: StringId::new(1),
            kind: SymbolKind::Let,
            scope,
            decl_site: ExprId::new(0),
            ty: TypeId::NONE,
            type_params: Vec::new(),
            type_param_symbols: Vec::new(),
            flags: SymbolFlags::empty(),
            receiver_key: None,
        });
        let ident = builder.push_node(NodeKind::Identifier(StringId::new(1)), Span::dummy());
        symbols.set_node_symbol(ident, x);
        let body = builder.push_node(NodeKind::Block { stmts: vec![], tail: Some(ident) }, Span::dummy());

        let free = free_identifiers(&builder, &symbols, body);
        assert_eq!(free, vec![x]);
    }

    #[test]
    fn locally_let_bound_identifier_is_not_free() {
        let mut builder = Builder::new();
        let mut symbols = SymbolTable::new();
        let scope = symbols.push_scope(None);
        let y = symbols.push_symbol(Symbol {
            name: StringId::new(2),
            kind: SymbolKind::Let,
            scope,
            decl_site: ExprId::new(0),
            ty: TypeId::NONE,
            type_params: Vec::new(),
            type_param_symbols: Vec::new(),
            flags: SymbolFlags::empty(),
            receiver_key: None,
        });
        let init = builder.push_node(NodeKind::LiteralInt(1), Span::dummy());
        let let_stmt =
            builder.push_node(NodeKind::LetStmt { symbol: y, ty: None, init: Some(init), attrs: vec![] }, Span::dummy());
        let ident = builder.push_node(NodeKind::Identifier(StringId::new(2)), Span::dummy());
        symbols.set_node_symbol(ident, y);
        let body =
            builder.push_node(NodeKind::Block { stmts: vec![let_stmt], tail: Some(ident) }, Span::dummy());

        let free = free_identifiers(&builder, &symbols, body);
        assert!(free.is_empty());
    }
}
