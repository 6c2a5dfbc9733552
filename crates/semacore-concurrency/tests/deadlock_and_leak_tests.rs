//! End-to-end scenarios combining `LockState` (per-function acquisition
//! order) with the process-global `LockOrderGraph`, the way a driver wires
//! the two together: every `LockState::acquire` call's `held_before` list
//! becomes a batch of edges into the shared graph.

use semacore_common::{ExprId, ScopeId, Span, StringId, SymbolId};
use semacore_concurrency::{ConcurrencyTracker, LockIdentity, LockKey, LockKind, LockOrderGraph, LockState, Resolution};

fn identity(n: u32) -> LockIdentity {
    LockIdentity::new(StringId::new(n), None)
}

fn key(base: u32) -> LockKey {
    LockKey { base: SymbolId::new(base), field_name: None, kind: LockKind::Mutex }
}

/// Function `f` acquires A then B; function `g` acquires B then A. Neither
/// function is individually unbalanced, but together they order the same
/// two locks in opposite directions — a deadlock only visible once both
/// functions' edges land in the same graph.
#[test]
fn two_functions_ordering_the_same_locks_oppositely_is_a_cycle() {
    let mut graph = LockOrderGraph::new();
    let account = identity(0);
    let ledger = identity(1);

    let mut f = LockState::new();
    f.acquire(key(0), Span::dummy());
    let (_, held) = f.acquire(key(1), Span::dummy());
    assert_eq!(held, vec![key(0)]);
    graph.add_edge(account, ledger, Span::dummy());

    let mut g = LockState::new();
    g.acquire(key(1), Span::dummy());
    let (_, held) = g.acquire(key(0), Span::dummy());
    assert_eq!(held, vec![key(1)]);
    graph.add_edge(ledger, account, Span::dummy());

    let cycles = graph.detect_cycles();
    assert_eq!(cycles.len(), 1);
}

/// Repeating the same acquisition order across many call sites only ever
/// adds one edge (`add_edge` dedups) and never produces a cycle.
#[test]
fn repeating_the_same_order_stays_acyclic() {
    let mut graph = LockOrderGraph::new();
    let a = identity(0);
    let b = identity(1);

    for _ in 0..3 {
        let mut f = LockState::new();
        f.acquire(key(0), Span::dummy());
        f.acquire(key(1), Span::dummy());
        graph.add_edge(a, b, Span::dummy());
    }

    assert!(graph.detect_cycles().is_empty());
}

/// A task spawned and pushed into a container is not a leak even though it
/// was never directly awaited; popping it back out doesn't resurrect the
/// leak, matching `container_has_pending`'s per-container counter.
#[test]
fn container_round_trip_never_reads_as_a_leak() {
    let mut tracker = ConcurrencyTracker::new();
    let scope = ScopeId::new(0);
    let container = SymbolId::new(0);
    let task = ExprId::new(1);

    tracker.spawn(scope, task);
    tracker.push_to_container(container, task);
    assert!(tracker.leaked_in_scope(scope).is_empty());
    assert!(tracker.is_resolved(task));
    assert!(tracker.container_has_pending(container));

    tracker.pop_from_container(container);
    assert!(!tracker.container_has_pending(container));
    assert!(tracker.leaked_in_scope(scope).is_empty());
}

/// A task bound to a local and passed on as a call argument is the callee's
/// problem from here, not a leak in the spawning scope.
#[test]
fn passing_a_bound_task_onward_resolves_it() {
    let mut tracker = ConcurrencyTracker::new();
    let scope = ScopeId::new(0);
    let task = ExprId::new(1);
    let binding = SymbolId::new(0);

    tracker.spawn(scope, task);
    tracker.bind(binding, task);
    assert_eq!(tracker.binding_task(binding), Some(task));

    tracker.resolve(task, Resolution::PassedAsArgument);
    assert!(tracker.leaked_in_scope(scope).is_empty());
}
