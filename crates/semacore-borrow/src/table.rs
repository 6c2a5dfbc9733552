//! `BorrowTable` — per-scope active-borrow bookkeeping.
//!
//! Mirrors the teacher's per-scope-stack flow bookkeeping
//! (`flow_analysis::FlowResult`'s normal/exits split) generalized from
//! "assigned property set" to "active borrow set".

use crate::place::{conflicts, Place};
use rustc_hash::FxHashMap;
use semacore_common::{BorrowId, ScopeId, Span, SymbolId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorrowKind {
    Shared,
    Mut,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BorrowInfo {
    pub place: Place,
    pub kind: BorrowKind,
    pub scope: ScopeId,
    pub begin_span: Span,
    pub end_span: Option<Span>,
}

/// Outcome of a borrow-table query. `Ok` means no conflict; `Conflict`
/// names the overlapping borrow the caller should cite in its diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Issue {
    Ok,
    Conflict(BorrowId),
    /// Only returned by `begin_borrow` for `Mut` on a non-`Mutable` base.
    BaseNotMutable,
}

impl Issue {
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Issue::Ok)
    }
}

#[derive(Clone, Debug)]
pub enum BorrowEvent {
    BorrowStart { borrow: BorrowId, place: Place, kind: BorrowKind, span: Span },
    BorrowEnd { borrow: BorrowId, span: Span },
    Move { place: Place, span: Span },
    Write { place: Place, span: Span },
    Drop { borrow: BorrowId, span: Span },
    SpawnEscape { symbol: SymbolId, span: Span },
}

#[derive(Debug, Default)]
pub struct BorrowTable {
    borrows: Vec<BorrowInfo>,
    /// Borrows still active, grouped by base symbol for cheap overlap scans.
    active_by_base: FxHashMap<SymbolId, Vec<BorrowId>>,
    scope_borrows: FxHashMap<ScopeId, Vec<BorrowId>>,
    binding_borrow: FxHashMap<SymbolId, BorrowId>,
    events: Vec<BorrowEvent>,
}

impl BorrowTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn active_overlapping(&self, place: &Place) -> Vec<BorrowId> {
        self.active_by_base
            .get(&place.base)
            .into_iter()
            .flatten()
            .copied()
            .filter(|bid| conflicts(&self.borrows[bid.as_usize()].place, place))
            .collect()
    }

    /// `begin_borrow(kind, place, scope, span) -> (BorrowID, Issue)`. A
    /// `BorrowId` is always allocated, even on conflict, so the checker can
    /// keep best-effort typing going (§7 recoverable conflicts).
    pub fn begin_borrow(
        &mut self,
        kind: BorrowKind,
        place: Place,
        scope: ScopeId,
        span: Span,
        base_mutable: bool,
    ) -> (BorrowId, Issue) {
        if kind == BorrowKind::Mut && !base_mutable {
            let id = self.push_borrow(kind, place, scope, span);
            return (id, Issue::BaseNotMutable);
        }

        let overlapping = self.active_overlapping(&place);
        let conflict = overlapping.into_iter().find(|bid| {
            let existing = &self.borrows[bid.as_usize()];
            kind == BorrowKind::Mut || existing.kind == BorrowKind::Mut
        });

        let id = self.push_borrow(kind, place, scope, span);
        match conflict {
            Some(bid) => (id, Issue::Conflict(bid)),
            None => (id, Issue::Ok),
        }
    }

    fn push_borrow(&mut self, kind: BorrowKind, place: Place, scope: ScopeId, span: Span) -> BorrowId {
        let id = BorrowId::new(self.borrows.len() as u32);
        self.active_by_base.entry(place.base).or_default().push(id);
        self.scope_borrows.entry(scope).or_default().push(id);
        self.events.push(BorrowEvent::BorrowStart { borrow: id, place: place.clone(), kind, span });
        self.borrows.push(BorrowInfo { place, kind, scope, begin_span: span, end_span: None });
        id
    }

    /// `mutation_allowed(place) -> Issue`. `deref_through_mut_ref` models
    /// the write-through-mutable-reference exception: a place whose first
    /// segment is `Deref` through a `&mut` binding is allowed because the
    /// reference *is* the borrow.
    #[must_use]
    pub fn mutation_allowed(&mut self, place: &Place, span: Span, deref_through_mut_ref: bool) -> Issue {
        if deref_through_mut_ref && place.starts_with_deref() {
            return Issue::Ok;
        }
        let overlapping = self.active_overlapping(place);
        self.events.push(BorrowEvent::Write { place: place.clone(), span });
        match overlapping.first() {
            Some(&bid) => Issue::Conflict(bid),
            None => Issue::Ok,
        }
    }

    #[must_use]
    pub fn move_allowed(&mut self, place: &Place, span: Span) -> Issue {
        let overlapping = self.active_overlapping(place);
        self.events.push(BorrowEvent::Move { place: place.clone(), span });
        match overlapping.first() {
            Some(&bid) => Issue::Conflict(bid),
            None => Issue::Ok,
        }
    }

    pub fn drop_borrow(&mut self, bid: BorrowId, span: Span) {
        if let Some(info) = self.borrows.get_mut(bid.as_usize()) {
            info.end_span = Some(span);
        }
        if let Some(list) = self.active_by_base.get_mut(&self.borrows[bid.as_usize()].place.base) {
            list.retain(|&b| b != bid);
        }
        self.events.push(BorrowEvent::Drop { borrow: bid, span });
    }

    /// End all borrows created directly in `scope` (automatic teardown on
    /// scope exit).
    pub fn end_scope(&mut self, scope: ScopeId, span: Span) {
        let Some(ids) = self.scope_borrows.get(&scope).cloned() else { return };
        for bid in ids {
            if self.borrows[bid.as_usize()].end_span.is_some() {
                continue;
            }
            if let Some(list) = self.active_by_base.get_mut(&self.borrows[bid.as_usize()].place.base) {
                list.retain(|&b| b != bid);
            }
            self.borrows[bid.as_usize()].end_span = Some(span);
            self.events.push(BorrowEvent::BorrowEnd { borrow: bid, span });
        }
    }

    #[must_use]
    pub fn scope_borrows(&self, scope: ScopeId) -> &[BorrowId] {
        self.scope_borrows.get(&scope).map_or(&[], Vec::as_slice)
    }

    pub fn set_binding_borrow(&mut self, symbol: SymbolId, bid: BorrowId) {
        self.binding_borrow.insert(symbol, bid);
    }

    #[must_use]
    pub fn binding_borrow(&self, symbol: SymbolId) -> Option<BorrowId> {
        self.binding_borrow.get(&symbol).copied()
    }

    pub fn clear_binding_borrow(&mut self, symbol: SymbolId) {
        self.binding_borrow.remove(&symbol);
    }

    pub fn record_spawn_escape(&mut self, symbol: SymbolId, span: Span) {
        self.events.push(BorrowEvent::SpawnEscape { symbol, span });
    }

    #[must_use]
    pub fn borrows(&self) -> &[BorrowInfo] {
        &self.borrows
    }

    #[must_use]
    pub fn events(&self) -> &[BorrowEvent] {
        &self.events
    }

    #[must_use]
    pub fn borrow_info(&self, id: BorrowId) -> &BorrowInfo {
        &self.borrows[id.as_usize()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semacore_common::Span;

    fn sym(n: u32) -> SymbolId {
        SymbolId::new(n)
    }

    #[test]
    fn two_mut_borrows_of_same_place_conflict() {
        let mut table = BorrowTable::new();
        let x = Place::root(sym(0));
        let scope = ScopeId::new(0);
        let (_a, issue_a) = table.begin_borrow(BorrowKind::Mut, x.clone(), scope, Span::dummy(), true);
        assert!(issue_a.is_ok());
        let (_b, issue_b) = table.begin_borrow(BorrowKind::Mut, x, scope, Span::dummy(), true);
        assert!(matches!(issue_b, Issue::Conflict(_)));
    }

    #[test]
    fn shared_borrows_of_same_place_do_not_conflict() {
        let mut table = BorrowTable::new();
        let x = Place::root(sym(0));
        let scope = ScopeId::new(0);
        let (_a, issue_a) = table.begin_borrow(BorrowKind::Shared, x.clone(), scope, Span::dummy(), false);
        assert!(issue_a.is_ok());
        let (_b, issue_b) = table.begin_borrow(BorrowKind::Shared, x, scope, Span::dummy(), false);
        assert!(issue_b.is_ok());
    }

    #[test]
    fn mutation_conflicts_with_live_shared_borrow() {
        let mut table = BorrowTable::new();
        let x = Place::root(sym(0));
        let scope = ScopeId::new(0);
        table.begin_borrow(BorrowKind::Shared, x.clone(), scope, Span::dummy(), false);
        let issue = table.mutation_allowed(&x, Span::dummy(), false);
        assert!(matches!(issue, Issue::Conflict(_)));
    }

    #[test]
    fn independent_fields_do_not_conflict() {
        let mut table = BorrowTable::new();
        let scope = ScopeId::new(0);
        let f = Place::root(sym(0)).field(semacore_common::StringId::new(1));
        table.begin_borrow(BorrowKind::Shared, f, scope, Span::dummy(), false);
        let g = Place::root(sym(0)).field(semacore_common::StringId::new(2));
        let issue = table.mutation_allowed(&g, Span::dummy(), false);
        assert!(issue.is_ok());
    }

    #[test]
    fn drop_releases_the_borrow() {
        let mut table = BorrowTable::new();
        let x = Place::root(sym(0));
        let scope = ScopeId::new(0);
        let (bid, _) = table.begin_borrow(BorrowKind::Shared, x.clone(), scope, Span::dummy(), false);
        table.drop_borrow(bid, Span::dummy());
        let issue = table.mutation_allowed(&x, Span::dummy(), false);
        assert!(issue.is_ok());
    }

    #[test]
    fn scope_exit_tears_down_its_borrows() {
        let mut table = BorrowTable::new();
        let x = Place::root(sym(0));
        let scope = ScopeId::new(0);
        table.begin_borrow(BorrowKind::Shared, x.clone(), scope, Span::dummy(), false);
        table.end_scope(scope, Span::dummy());
        let issue = table.mutation_allowed(&x, Span::dummy(), false);
        assert!(issue.is_ok());
    }

    #[test]
    fn write_through_mut_ref_deref_is_exempted() {
        let mut table = BorrowTable::new();
        let scope = ScopeId::new(0);
        let p = Place::root(sym(0));
        table.begin_borrow(BorrowKind::Mut, p.clone(), scope, Span::dummy(), true);
        let through_ref = p.deref();
        let issue = table.mutation_allowed(&through_ref, Span::dummy(), true);
        assert!(issue.is_ok());
    }
}
