//! Structured-concurrency tracking (§4.L): spawned-task lifetime, await/
//! return/container-push resolution, and scope-exit leak detection.

use rustc_hash::{FxHashMap, FxHashSet};
use semacore_common::{ExprId, ScopeId, SymbolId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Awaited,
    Returned,
    ContainerPush,
    /// Passed as an argument into another call, which the callee is
    /// assumed responsible for.
    PassedAsArgument,
}

#[derive(Debug, Default)]
pub struct ConcurrencyTracker {
    spawned_in_scope: FxHashMap<ScopeId, Vec<ExprId>>,
    resolved: FxHashMap<ExprId, Resolution>,
    binding_task: FxHashMap<SymbolId, ExprId>,
    /// Per-container pending-task counters, incremented by `.push(task)` and
    /// decremented by `.pop()`, used to flag a container carrying unawaited
    /// tasks live across an `await` point.
    container_pending: FxHashMap<SymbolId, u32>,
}

impl ConcurrencyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, scope: ScopeId, task_expr: ExprId) {
        self.spawned_in_scope.entry(scope).or_default().push(task_expr);
    }

    pub fn bind(&mut self, symbol: SymbolId, task_expr: ExprId) {
        self.binding_task.insert(symbol, task_expr);
    }

    #[must_use]
    pub fn binding_task(&self, symbol: SymbolId) -> Option<ExprId> {
        self.binding_task.get(&symbol).copied()
    }

    pub fn resolve(&mut self, task_expr: ExprId, resolution: Resolution) {
        self.resolved.insert(task_expr, resolution);
    }

    #[must_use]
    pub fn is_resolved(&self, task_expr: ExprId) -> bool {
        self.resolved.contains_key(&task_expr)
    }

    pub fn push_to_container(&mut self, container: SymbolId, task_expr: ExprId) {
        self.resolve(task_expr, Resolution::ContainerPush);
        *self.container_pending.entry(container).or_insert(0) += 1;
    }

    pub fn pop_from_container(&mut self, container: SymbolId) {
        if let Some(count) = self.container_pending.get_mut(&container) {
            *count = count.saturating_sub(1);
        }
    }

    #[must_use]
    pub fn container_has_pending(&self, container: SymbolId) -> bool {
        self.container_pending.get(&container).is_some_and(|&c| c > 0)
    }

    /// Tasks spawned directly in `scope` that are still unresolved
    /// (`TaskNotAwaited`).
    #[must_use]
    pub fn leaked_in_scope(&self, scope: ScopeId) -> Vec<ExprId> {
        self.spawned_in_scope
            .get(&scope)
            .into_iter()
            .flatten()
            .copied()
            .filter(|e| !self.resolved.contains_key(e))
            .collect()
    }

    /// All scopes with at least one recorded spawn, for drivers that want to
    /// flush leaks deterministically by scope.
    #[must_use]
    pub fn scopes_with_spawns(&self) -> FxHashSet<ScopeId> {
        self.spawned_in_scope.keys().copied().collect()
    }
}
