//! Conversion (§4.M): numeric widening, implicit `__to` resolution, and
//! default-init defaultability.

use semacore_common::{SymbolId, TypeId};
use semacore_types::{
    canonical_key, contextual_literal_fits, numeric_kind, widening_join, widens_silently, NameResolver, TypeInterner,
    TypeTerm,
};

use crate::magic_index::{MagicIndex, Resolution};

/// Interned ids for identifiers the checker looks up by name rather than by
/// scanning the symbol table (mirrors a compiler's well-known-symbol cache).
/// The nominal-wrapper names (`array`, `task`, ...) name the `Struct` types
/// the Expression Typer constructs directly (`Task<T>`, `Range<Int>`, ...);
/// this crate has no string interner of its own, so the driver hands these
/// ids in rather than the checker minting new ones.
#[derive(Clone, Copy, Debug)]
pub struct WellKnownNames {
    pub to: semacore_common::StringId,
    pub default: semacore_common::StringId,
    pub array: semacore_common::StringId,
    pub array_fixed: semacore_common::StringId,
    pub range: semacore_common::StringId,
    pub task: semacore_common::StringId,
    pub option: semacore_common::StringId,
    pub result: semacore_common::StringId,
    pub channel: semacore_common::StringId,
    pub map: semacore_common::StringId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToOutcome {
    NotNeeded,
    Found(SymbolId),
    Ambiguous,
    None,
}

/// Does `from` convert silently to `to` under the numeric widening lattice,
/// or (being a literal) simply fit the contextual numeric type?
#[must_use]
pub fn widens(interner: &TypeInterner, from: TypeId, to: TypeId, from_is_literal: bool) -> bool {
    if from == to {
        return true;
    }
    let Some(to_kind) = numeric_kind(interner, to) else { return false };
    if from_is_literal {
        return contextual_literal_fits(0, to_kind);
    }
    match numeric_kind(interner, from) {
        Some(from_kind) => widens_silently(from_kind, to_kind),
        None => false,
    }
}

/// Unify two branch types (ternary arms, compare arms) toward a common
/// numeric join, or require exact equality for non-numeric types.
#[must_use]
pub fn unify_branches(interner: &TypeInterner, a: TypeId, b: TypeId) -> Option<TypeId> {
    if a == b {
        return Some(a);
    }
    let ka = numeric_kind(interner, a)?;
    let kb = numeric_kind(interner, b)?;
    let joined = widening_join(ka, kb)?;
    Some(if numeric_kind(interner, a) == Some(joined) { a } else { b })
}

/// Resolve an implicit `__to` conversion from `from` to `to` (§4.M). Returns
/// `NotNeeded` when the types already match.
#[must_use]
pub fn resolve_implicit_to(
    interner: &TypeInterner,
    resolver: &dyn NameResolver,
    magic_index: &MagicIndex,
    names: &WellKnownNames,
    from: TypeId,
    to: TypeId,
) -> ToOutcome {
    if from == to {
        return ToOutcome::NotNeeded;
    }
    let Some(receiver) = receiver_name_of(interner, from) else { return ToOutcome::None };
    let to_key = canonical_key(interner, resolver, to);
    match crate::magic_index::resolve_overload(magic_index, &[receiver], names.to, &[to_key]) {
        Resolution::Found(symbol) => ToOutcome::Found(symbol),
        Resolution::Ambiguous(_) => ToOutcome::Ambiguous,
        Resolution::NoMatch => ToOutcome::None,
    }
}

pub(crate) fn receiver_name_of(interner: &TypeInterner, id: TypeId) -> Option<semacore_common::StringId> {
    match interner.lookup(id) {
        TypeTerm::Struct { name, .. } | TypeTerm::Union { name, .. } | TypeTerm::Alias { name, .. } => Some(*name),
        _ => None,
    }
}

/// Is `ty` defaultable (i.e. usable in `let x: T;` with no initializer)?
/// Primitives (other than `Nothing`/`Error`) are defaultable directly;
/// nominal types are defaultable only if they expose a zero-argument
/// `default` function returning `ty`.
#[must_use]
pub fn is_defaultable(
    interner: &TypeInterner,
    resolver: &dyn NameResolver,
    magic_index: &MagicIndex,
    names: &WellKnownNames,
    ty: TypeId,
) -> Option<SymbolId> {
    match interner.lookup(ty) {
        TypeTerm::Bool | TypeTerm::Int | TypeTerm::Uint | TypeTerm::Float | TypeTerm::String | TypeTerm::Unit => {
            Some(SymbolId::NONE)
        }
        TypeTerm::Array { .. } => Some(SymbolId::NONE),
        _ => {
            let receiver = receiver_name_of(interner, ty)?;
            let ty_key = canonical_key(interner, resolver, ty);
            magic_index
                .signatures(receiver, names.default)
                .iter()
                .find(|s| s.params.is_empty() && s.result == ty_key)
                .map(|s| s.symbol)
        }
    }
}
