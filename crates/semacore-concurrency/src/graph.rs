//! Process-global lock-order graph (§4.K) — deadlock cycle detection.
//!
//! DFS coloring with parent pointers, the same general cyclic-dependency
//! detection strategy used across the pack for module/type-cycle checks
//! (e.g. a binder's import-graph cycle detector); generalized here from
//! "module depends on module" to "lock acquired while holding lock".

use rustc_hash::FxHashMap;
use semacore_common::{Span, StringId};

/// `(type-name, field-name)` — the global identity used for cross-function
/// deadlock analysis (distinct from the per-function `LockKey`, which is
/// keyed by local symbol rather than declaring type).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockIdentity {
    pub type_name: StringId,
    pub field_name: Option<StringId>,
}

impl LockIdentity {
    #[must_use]
    pub fn new(type_name: StringId, field_name: Option<StringId>) -> Self {
        Self { type_name, field_name }
    }
}

#[derive(Clone, Debug)]
pub struct Cycle {
    pub chain: Vec<LockIdentity>,
    pub span: Span,
}

#[derive(Debug, Default)]
pub struct LockOrderGraph {
    edges: FxHashMap<LockIdentity, Vec<(LockIdentity, Span)>>,
    nodes: Vec<LockIdentity>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl LockOrderGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, id: LockIdentity) {
        if !self.nodes.contains(&id) {
            self.nodes.push(id);
        }
    }

    /// Add an edge `from -> to` (acquired `to` while `from` already held).
    /// Returns `true` iff this exact edge was new.
    pub fn add_edge(&mut self, from: LockIdentity, to: LockIdentity, span: Span) -> bool {
        self.ensure_node(from);
        self.ensure_node(to);
        let list = self.edges.entry(from).or_default();
        if list.iter().any(|(t, _)| *t == to) {
            return false;
        }
        list.push((to, span));
        true
    }

    /// Detect cycles via DFS coloring, starting from sorted lock identities
    /// for deterministic reporting order (§5 "Lock-graph cycles are
    /// reported deterministically").
    #[must_use]
    pub fn detect_cycles(&self) -> Vec<Cycle> {
        let mut sorted_nodes = self.nodes.clone();
        sorted_nodes.sort();

        let mut color: FxHashMap<LockIdentity, Color> =
            sorted_nodes.iter().map(|n| (*n, Color::White)).collect();
        let mut path: Vec<LockIdentity> = Vec::new();
        let mut cycles = Vec::new();
        let mut reported: Vec<Vec<LockIdentity>> = Vec::new();

        for &start in &sorted_nodes {
            if color[&start] == Color::White {
                self.visit(start, &mut color, &mut path, &mut cycles, &mut reported);
            }
        }
        cycles
    }

    fn visit(
        &self,
        node: LockIdentity,
        color: &mut FxHashMap<LockIdentity, Color>,
        path: &mut Vec<LockIdentity>,
        cycles: &mut Vec<Cycle>,
        reported: &mut Vec<Vec<LockIdentity>>,
    ) {
        color.insert(node, Color::Gray);
        path.push(node);

        let mut targets: Vec<(LockIdentity, Span)> =
            self.edges.get(&node).cloned().unwrap_or_default();
        targets.sort_by_key(|(t, _)| *t);

        for (target, span) in targets {
            match color.get(&target).copied().unwrap_or(Color::White) {
                Color::White => self.visit(target, color, path, cycles, reported),
                Color::Gray => {
                    let start = path.iter().position(|n| *n == target).unwrap_or(0);
                    let mut chain: Vec<LockIdentity> = path[start..].to_vec();
                    chain.push(target);
                    let mut canonical = chain.clone();
                    canonical.sort();
                    if !reported.contains(&canonical) {
                        reported.push(canonical);
                        cycles.push(Cycle { chain, span });
                    }
                }
                Color::Black => {}
            }
        }

        path.pop();
        color.insert(node, Color::Black);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semacore_common::{Span, StringId};

    fn id(n: u32) -> LockIdentity {
        LockIdentity::new(StringId::new(n), None)
    }

    #[test]
    fn three_way_cycle_is_detected() {
        let mut g = LockOrderGraph::new();
        g.add_edge(id(0), id(1), Span::dummy());
        g.add_edge(id(1), id(2), Span::dummy());
        g.add_edge(id(2), id(0), Span::dummy());
        let cycles = g.detect_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].chain.first(), cycles[0].chain.last());
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let mut g = LockOrderGraph::new();
        g.add_edge(id(0), id(1), Span::dummy());
        g.add_edge(id(1), id(2), Span::dummy());
        assert!(g.detect_cycles().is_empty());
    }

    #[test]
    fn self_loop_is_a_single_node_cycle() {
        let mut g = LockOrderGraph::new();
        g.add_edge(id(0), id(0), Span::dummy());
        let cycles = g.detect_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].chain, vec![id(0), id(0)]);
    }

    #[test]
    fn repeated_edge_is_not_new() {
        let mut g = LockOrderGraph::new();
        assert!(g.add_edge(id(0), id(1), Span::dummy()));
        assert!(!g.add_edge(id(0), id(1), Span::dummy()));
    }
}
