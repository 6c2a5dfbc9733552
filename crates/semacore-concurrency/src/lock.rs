//! Per-function lock discipline (§4.J Lock Analyzer).
//!
//! State is a set of currently-held `LockKey`s (acquisition order is kept
//! too, since edge emission to the lock-order graph needs "what was already
//! held when this one was acquired"). Branch merges take the intersection
//! of held-lock sets across arms, mirroring the teacher's flow-state
//! intersection at `if`/`while`/`for` merges
//! (`tsz-checker::flow_analysis`'s normal/exits split, generalized from
//! "assigned property set" to "held lock set").

use rustc_hash::FxHashSet;
use semacore_common::{Span, StringId, SymbolId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockKind {
    Mutex,
    RwRead,
    RwWrite,
}

/// Identifies a specific lock value at the local, per-function level: a
/// base symbol plus an optional field name (`self.f.lock()` vs `x.lock()`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LockKey {
    pub base: SymbolId,
    pub field_name: Option<StringId>,
    pub kind: LockKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LockAcquisition {
    pub key: LockKey,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    Ok,
    DoubleAcquire,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Ok,
    NotHeld,
}

/// Per-function lock-discipline state: an ordered acquisition stack plus the
/// set of currently-held keys (kinds of the same base/field are treated as
/// distinct keys — a read-lock and write-lock on the same field don't
/// collide with each other for double-acquire purposes, matching `RwRead`
/// and `RwWrite` being separately trackable).
#[derive(Clone, Debug, Default)]
pub struct LockState {
    stack: Vec<LockAcquisition>,
    held: FxHashSet<LockKey>,
    /// Set once a `.try_lock()`-family call is observed; relaxes
    /// `LockUnbalanced` at branch merges.
    uses_try_lock: bool,
}

impl LockState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_try_lock(&mut self) {
        self.uses_try_lock = true;
    }

    #[must_use]
    pub fn uses_try_lock(&self) -> bool {
        self.uses_try_lock
    }

    /// Acquire `key`, returning the set of already-held keys at the moment
    /// of acquisition (for edge emission to the lock-order graph) alongside
    /// the outcome.
    pub fn acquire(&mut self, key: LockKey, span: Span) -> (AcquireOutcome, Vec<LockKey>) {
        if self.held.contains(&key) {
            return (AcquireOutcome::DoubleAcquire, Vec::new());
        }
        let held_before: Vec<LockKey> = self.stack.iter().map(|a| a.key).collect();
        self.stack.push(LockAcquisition { key, span });
        self.held.insert(key);
        (AcquireOutcome::Ok, held_before)
    }

    pub fn release(&mut self, key: LockKey) -> ReleaseOutcome {
        if !self.held.remove(&key) {
            return ReleaseOutcome::NotHeld;
        }
        self.stack.retain(|a| a.key != key);
        ReleaseOutcome::Ok
    }

    #[must_use]
    pub fn is_held(&self, key: &LockKey) -> bool {
        self.held.contains(key)
    }

    #[must_use]
    pub fn held_keys(&self) -> impl Iterator<Item = LockKey> + '_ {
        self.held.iter().copied()
    }

    /// Intersect two branch-exit states (`if`/`else`, loop body vs skip).
    /// Returns the merged state plus the set of keys held in exactly one
    /// branch (`LockUnbalanced` candidates, suppressed by the caller when
    /// either branch used `try_lock`).
    #[must_use]
    pub fn merge(a: &LockState, b: &LockState) -> (LockState, Vec<LockKey>) {
        let intersection: FxHashSet<LockKey> = a.held.intersection(&b.held).copied().collect();
        let mut unbalanced: Vec<LockKey> = a.held.symmetric_difference(&b.held).copied().collect();
        unbalanced.sort_by_key(|k| (k.base.index(), k.field_name.map(StringId::index), format!("{:?}", k.kind)));

        let stack: Vec<LockAcquisition> =
            a.stack.iter().filter(|acq| intersection.contains(&acq.key)).copied().collect();
        let merged = LockState { stack, held: intersection, uses_try_lock: a.uses_try_lock || b.uses_try_lock };
        (merged, unbalanced)
    }

    /// Locks still held at function exit, for `LockNotReleasedOnExit`
    /// checking against declared `@requires_lock`/`@releases_lock`/
    /// `@acquires_lock` sets (done by the caller, which knows the
    /// attribute-derived declared set).
    #[must_use]
    pub fn still_held(&self) -> Vec<LockKey> {
        self.stack.iter().map(|a| a.key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semacore_common::Span;

    fn key(kind: LockKind) -> LockKey {
        LockKey { base: SymbolId::new(0), field_name: None, kind }
    }

    #[test]
    fn double_acquire_is_detected() {
        let mut state = LockState::new();
        let k = key(LockKind::Mutex);
        assert_eq!(state.acquire(k, Span::dummy()).0, AcquireOutcome::Ok);
        assert_eq!(state.acquire(k, Span::dummy()).0, AcquireOutcome::DoubleAcquire);
    }

    #[test]
    fn release_not_held_is_detected() {
        let mut state = LockState::new();
        assert_eq!(state.release(key(LockKind::Mutex)), ReleaseOutcome::NotHeld);
    }

    #[test]
    fn acquiring_while_holding_returns_previously_held() {
        let mut state = LockState::new();
        let a = LockKey { base: SymbolId::new(0), field_name: None, kind: LockKind::Mutex };
        let b = LockKey { base: SymbolId::new(1), field_name: None, kind: LockKind::Mutex };
        state.acquire(a, Span::dummy());
        let (_, held_before) = state.acquire(b, Span::dummy());
        assert_eq!(held_before, vec![a]);
    }

    #[test]
    fn branch_merge_flags_unbalanced_locks() {
        let mut left = LockState::new();
        let right = LockState::new();
        let k = key(LockKind::Mutex);
        left.acquire(k, Span::dummy());
        let (merged, unbalanced) = LockState::merge(&left, &right);
        assert_eq!(unbalanced, vec![k]);
        assert!(merged.held_keys().next().is_none());
    }

    #[test]
    fn branch_merge_keeps_locks_held_on_both_sides() {
        let mut left = LockState::new();
        let mut right = LockState::new();
        let k = key(LockKind::Mutex);
        left.acquire(k, Span::dummy());
        right.acquire(k, Span::dummy());
        let (merged, unbalanced) = LockState::merge(&left, &right);
        assert!(unbalanced.is_empty());
        assert_eq!(merged.held_keys().collect::<Vec<_>>(), vec![k]);
    }
}
