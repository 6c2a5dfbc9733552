//! Canonical hash-consed type representation.
//!
//! Mirrors the hash-consing pattern used across the pack for interned IR
//! terms (e.g. chalk-ir's `TyKind` interning): a `FxHashMap<TypeTerm, TypeId>`
//! for the forward direction plus a `Vec<TypeTerm>` back-map for O(1) lookup.

use crate::term::{ArrayLen, TypeTerm, UnionMember};
use rustc_hash::FxHashMap;
use semacore_common::limits::MAX_ALIAS_RESOLUTION_DEPTH;
use semacore_common::{StringId, SymbolId, TypeId};

/// The seven always-present builtin primitive types.
#[derive(Clone, Copy, Debug)]
pub struct Builtins {
    pub bool_: TypeId,
    pub int_: TypeId,
    pub uint_: TypeId,
    pub float_: TypeId,
    pub string_: TypeId,
    pub nothing_: TypeId,
    pub unit_: TypeId,
    pub error_: TypeId,
}

pub struct StructInfo<'a> {
    pub name: StringId,
    pub fields: &'a [(StringId, TypeId)],
    pub type_args: &'a [TypeId],
    pub value_args: &'a [i64],
}

pub struct AliasInfo<'a> {
    pub name: StringId,
    pub type_args: &'a [TypeId],
}

pub struct UnionInfo<'a> {
    pub name: StringId,
    pub members: &'a [UnionMember],
    pub type_args: &'a [TypeId],
}

/// Hash-consed type interner, owned by one file's checker for the duration
/// of the run (§5 Concurrency & Resource Model).
#[derive(Default)]
pub struct TypeInterner {
    terms: Vec<TypeTerm>,
    index: FxHashMap<TypeTerm, TypeId>,
    alias_targets: FxHashMap<TypeId, TypeId>,
    builtins: Option<Builtins>,
}

impl TypeInterner {
    #[must_use]
    pub fn new() -> Self {
        let mut this = Self::default();
        let builtins = Builtins {
            bool_: this.intern(TypeTerm::Bool),
            int_: this.intern(TypeTerm::Int),
            uint_: this.intern(TypeTerm::Uint),
            float_: this.intern(TypeTerm::Float),
            string_: this.intern(TypeTerm::String),
            nothing_: this.intern(TypeTerm::Nothing),
            unit_: this.intern(TypeTerm::Unit),
            error_: this.intern(TypeTerm::Error),
        };
        this.builtins = Some(builtins);
        this
    }

    #[must_use]
    pub fn builtins(&self) -> Builtins {
        self.builtins.expect("TypeInterner::new always populates builtins")
    }

    /// Intern a structural term, returning its canonical id. Two
    /// structurally-equal terms always yield the same id; `Alias` terms are
    /// keyed by `(name, type_args)` only, so re-declaring the same alias
    /// name with the same args reuses the identity (its target is attached
    /// separately via `set_alias_target`).
    pub fn intern(&mut self, term: TypeTerm) -> TypeId {
        if let Some(&id) = self.index.get(&term) {
            return id;
        }
        let id = TypeId::new(self.terms.len() as u32);
        self.index.insert(term.clone(), id);
        self.terms.push(term);
        id
    }

    #[must_use]
    pub fn lookup(&self, id: TypeId) -> &TypeTerm {
        &self.terms[id.as_usize()]
    }

    #[must_use]
    pub fn struct_info(&self, id: TypeId) -> Option<StructInfo<'_>> {
        match self.lookup(id) {
            TypeTerm::Struct { name, fields, type_args, value_args } => {
                Some(StructInfo { name: *name, fields, type_args, value_args })
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn alias_info(&self, id: TypeId) -> Option<AliasInfo<'_>> {
        match self.lookup(id) {
            TypeTerm::Alias { name, type_args } => Some(AliasInfo { name: *name, type_args }),
            _ => None,
        }
    }

    #[must_use]
    pub fn union_info(&self, id: TypeId) -> Option<UnionInfo<'_>> {
        match self.lookup(id) {
            TypeTerm::Union { name, members, type_args } => {
                Some(UnionInfo { name: *name, members, type_args })
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn tuple_info(&self, id: TypeId) -> Option<&[TypeId]> {
        match self.lookup(id) {
            TypeTerm::Tuple { elems } => Some(elems),
            _ => None,
        }
    }

    /// Projects `Map<K, V>`-shaped nominal structs (two type args) to `(K, V)`.
    #[must_use]
    pub fn map_info(&self, id: TypeId) -> Option<(TypeId, TypeId)> {
        let info = self.struct_info(id)?;
        if info.type_args.len() == 2 {
            Some((info.type_args[0], info.type_args[1]))
        } else {
            None
        }
    }

    pub fn register_tuple(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.intern(TypeTerm::Tuple { elems })
    }

    pub fn register_fn(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(TypeTerm::Fn { params, ret })
    }

    pub fn register_alias_instance(&mut self, name: StringId, target: TypeId, type_args: Vec<TypeId>) -> TypeId {
        let id = self.intern(TypeTerm::Alias { name, type_args });
        self.set_alias_target(id, target);
        id
    }

    /// Build/intern the canonical nominal `Array<elem>` struct type.
    pub fn ensure_array_nominal(&mut self, elem: TypeId, array_name: StringId) -> TypeId {
        self.intern(TypeTerm::Struct {
            name: array_name,
            fields: Vec::new(),
            type_args: vec![elem],
            value_args: Vec::new(),
        })
    }

    /// Build/intern the canonical nominal `ArrayFixed<elem, len>` struct type.
    pub fn ensure_array_fixed_nominal(&mut self, elem: TypeId, len: u64, array_fixed_name: StringId) -> TypeId {
        self.intern(TypeTerm::Struct {
            name: array_fixed_name,
            fields: Vec::new(),
            type_args: vec![elem],
            value_args: vec![len as i64],
        })
    }

    pub fn array_term(&mut self, elem: TypeId, count: ArrayLen) -> TypeId {
        self.intern(TypeTerm::Array { elem, count })
    }

    pub fn reference(&mut self, elem: TypeId, mutable: bool) -> TypeId {
        self.intern(TypeTerm::Reference { elem, mutable })
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeTerm::Pointer { elem })
    }

    pub fn own(&mut self, elem: TypeId) -> TypeId {
        match self.lookup(elem) {
            // `own` wraps unless already `own` (§4.E Unary).
            TypeTerm::Own { .. } => elem,
            _ => self.intern(TypeTerm::Own { elem }),
        }
    }

    pub fn set_alias_target(&mut self, id: TypeId, target: TypeId) {
        self.alias_targets.insert(id, target);
    }

    #[must_use]
    pub fn alias_target(&self, id: TypeId) -> Option<TypeId> {
        self.alias_targets.get(&id).copied()
    }

    /// Follow a chain of aliases to the first non-alias type, bounded by
    /// `MAX_ALIAS_RESOLUTION_DEPTH` to guard against cycles.
    #[must_use]
    pub fn resolve_alias(&self, mut id: TypeId) -> TypeId {
        for _ in 0..MAX_ALIAS_RESOLUTION_DEPTH {
            match self.alias_target(id) {
                Some(target) if self.alias_info(id).is_some() => id = target,
                _ => return id,
            }
        }
        id
    }

    #[must_use]
    pub fn is_copy_primitive(&self, id: TypeId) -> bool {
        matches!(
            self.lookup(self.resolve_alias(id)),
            TypeTerm::Bool | TypeTerm::Int | TypeTerm::Uint | TypeTerm::Float | TypeTerm::Unit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structurally_equal_terms_share_an_id() {
        let mut interner = TypeInterner::new();
        let a = interner.register_tuple(vec![interner.builtins().int_, interner.builtins().bool_]);
        let b = interner.register_tuple(vec![interner.builtins().int_, interner.builtins().bool_]);
        assert_eq!(a, b);
    }

    #[test]
    fn different_terms_get_different_ids() {
        let mut interner = TypeInterner::new();
        let a = interner.register_tuple(vec![interner.builtins().int_]);
        let b = interner.register_tuple(vec![interner.builtins().bool_]);
        assert_ne!(a, b);
    }

    #[test]
    fn alias_identity_is_distinct_from_target() {
        let mut interner = TypeInterner::new();
        let int_ = interner.builtins().int_;
        let name = StringId::new(1);
        let alias = interner.register_alias_instance(name, int_, Vec::new());
        assert_ne!(alias, int_);
        assert_eq!(interner.resolve_alias(alias), int_);
    }

    #[test]
    fn own_does_not_double_wrap() {
        let mut interner = TypeInterner::new();
        let int_ = interner.builtins().int_;
        let owned = interner.own(int_);
        let owned_again = interner.own(owned);
        assert_eq!(owned, owned_again);
    }

    #[test]
    fn alias_cycle_resolution_terminates() {
        let mut interner = TypeInterner::new();
        let a = interner.intern(TypeTerm::Alias { name: StringId::new(1), type_args: Vec::new() });
        let b = interner.intern(TypeTerm::Alias { name: StringId::new(2), type_args: Vec::new() });
        interner.set_alias_target(a, b);
        interner.set_alias_target(b, a);
        // Must terminate (bounded by MAX_ALIAS_RESOLUTION_DEPTH) rather than loop forever.
        let _ = interner.resolve_alias(a);
    }
}
