//! Borrow lifetimes across nested scopes — scenarios the per-scope
//! teardown in `BorrowTable::end_scope` has to get right that the
//! single-scope unit tests in `table.rs` don't exercise.

use semacore_borrow::{BorrowKind, BorrowTable, Issue, Place};
use semacore_common::{ScopeId, Span, SymbolId};

fn sym(n: u32) -> SymbolId {
    SymbolId::new(n)
}

/// A borrow opened in an inner scope is torn down when that scope ends,
/// but a borrow of the same place opened in the enclosing outer scope
/// survives — `end_scope` only tears down borrows created directly in the
/// scope it's given.
#[test]
fn inner_scope_teardown_does_not_touch_outer_borrows() {
    let mut table = BorrowTable::new();
    let outer = ScopeId::new(0);
    let inner = ScopeId::new(1);
    let x = Place::root(sym(0));

    let (_outer_borrow, issue) = table.begin_borrow(BorrowKind::Shared, x.clone(), outer, Span::dummy(), false);
    assert!(issue.is_ok());

    let (_inner_borrow, issue) = table.begin_borrow(BorrowKind::Shared, x.clone(), inner, Span::dummy(), false);
    assert!(issue.is_ok());

    table.end_scope(inner, Span::dummy());
    // The outer borrow is still live, so a conflicting mutable access is
    // still rejected.
    let issue = table.mutation_allowed(&x, Span::dummy(), false);
    assert!(matches!(issue, Issue::Conflict(_)));

    table.end_scope(outer, Span::dummy());
    let issue = table.mutation_allowed(&x, Span::dummy(), false);
    assert!(issue.is_ok());
}

/// A mutable borrow taken in an inner scope blocks a conflicting borrow
/// started in an outer scope while the inner scope is still open, even
/// though the outer scope began executing first.
#[test]
fn an_inner_mut_borrow_blocks_a_later_outer_borrow() {
    let mut table = BorrowTable::new();
    let outer = ScopeId::new(0);
    let inner = ScopeId::new(1);
    let x = Place::root(sym(0));

    let (_inner_borrow, issue) = table.begin_borrow(BorrowKind::Mut, x.clone(), inner, Span::dummy(), true);
    assert!(issue.is_ok());

    let (_outer_borrow, issue) = table.begin_borrow(BorrowKind::Shared, x.clone(), outer, Span::dummy(), false);
    assert!(matches!(issue, Issue::Conflict(_)));

    table.end_scope(inner, Span::dummy());
    let issue = table.mutation_allowed(&x, Span::dummy(), false);
    // The outer shared borrow (allocated despite the conflict, per
    // `begin_borrow`'s best-effort-typing contract) is still live.
    assert!(matches!(issue, Issue::Conflict(_)));
}

/// Ending a scope twice (e.g. a block reached via two control-flow paths
/// whose teardown both run) is a no-op the second time, not a panic or a
/// double-release.
#[test]
fn ending_a_scope_twice_is_harmless() {
    let mut table = BorrowTable::new();
    let scope = ScopeId::new(0);
    let x = Place::root(sym(0));

    table.begin_borrow(BorrowKind::Shared, x.clone(), scope, Span::dummy(), false);
    table.end_scope(scope, Span::dummy());
    table.end_scope(scope, Span::dummy());

    let issue = table.mutation_allowed(&x, Span::dummy(), false);
    assert!(issue.is_ok());
}

/// A binding's current borrow (`set_binding_borrow`/`binding_borrow`) is
/// how the checker tracks "what does this local currently point at" for
/// reassignment; clearing it (e.g. on move-out) removes the association
/// without touching the underlying borrow's liveness.
#[test]
fn clearing_a_binding_borrow_does_not_end_the_borrow_itself() {
    let mut table = BorrowTable::new();
    let scope = ScopeId::new(0);
    let x = Place::root(sym(0));
    let local = sym(1);

    let (bid, _) = table.begin_borrow(BorrowKind::Shared, x.clone(), scope, Span::dummy(), false);
    table.set_binding_borrow(local, bid);
    assert_eq!(table.binding_borrow(local), Some(bid));

    table.clear_binding_borrow(local);
    assert_eq!(table.binding_borrow(local), None);

    // The borrow itself is untouched by clearing the binding association.
    let issue = table.mutation_allowed(&x, Span::dummy(), false);
    assert!(matches!(issue, Issue::Conflict(_)));
}
