//! Generic Engine (§4.G): type-parameter environments, instantiation with
//! substitution, and inference from struct-literal fields / call arguments.
//!
//! Grounded on the teacher's generic-checker parameter environment
//! (`tsz-checker::generic_checker`), generalized from TS structural type
//! parameters to declared contract-bounded type parameters.

use rustc_hash::FxHashMap;
use semacore_common::limits::MAX_INSTANTIATION_DEPTH;
use semacore_common::{StringId, SymbolId, TypeId};
use semacore_types::{TypeInterner, TypeTerm};

/// One pushed generic parameter scope, binding a function/type's declared
/// type-parameter names to concrete `TypeId`s (or `TypeId::NONE` while still
/// pending inference).
#[derive(Clone, Debug)]
pub struct GenericScope {
    pub owner: SymbolId,
    bindings: FxHashMap<StringId, TypeId>,
}

#[derive(Debug, Default)]
pub struct GenericEnv {
    stack: Vec<GenericScope>,
    instantiations: FxHashMap<(SymbolId, Vec<TypeId>), TypeId>,
}

impl GenericEnv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self, owner: SymbolId, param_names: &[StringId], explicit_args: &[TypeId]) {
        let mut bindings = FxHashMap::default();
        for (i, name) in param_names.iter().enumerate() {
            let ty = explicit_args.get(i).copied().unwrap_or(TypeId::NONE);
            bindings.insert(*name, ty);
        }
        self.stack.push(GenericScope { owner, bindings });
    }

    pub fn pop_scope(&mut self) {
        self.stack.pop();
    }

    /// Resolve an in-scope type-parameter name to its bound type, searching
    /// innermost scope first.
    #[must_use]
    pub fn resolve_param(&self, name: StringId) -> Option<TypeId> {
        self.stack.iter().rev().find_map(|s| s.bindings.get(&name).copied())
    }

    #[must_use]
    pub fn current_owner(&self) -> Option<SymbolId> {
        self.stack.last().map(|s| s.owner)
    }

    /// Memoized instantiation lookup/insert (§8 Property 10: calling
    /// `id(42)` twice records exactly one instantiation).
    pub fn memoize_instantiation(&mut self, symbol: SymbolId, args: Vec<TypeId>, result: TypeId) {
        self.instantiations.insert((symbol, args), result);
    }

    #[must_use]
    pub fn cached_instantiation(&self, symbol: SymbolId, args: &[TypeId]) -> Option<TypeId> {
        self.instantiations.get(&(symbol, args.to_vec())).copied()
    }
}

/// Substitute every `GenericParam` owned by `owner` appearing in `id`'s
/// structure with its bound concrete type, producing (and interning) a new
/// instance type. Bounded by `MAX_INSTANTIATION_DEPTH` to guard runaway
/// recursive generics (`type Box<T: C<T>>`).
#[must_use]
pub fn substitute(
    interner: &mut TypeInterner,
    owner: SymbolId,
    bindings: &FxHashMap<StringId, TypeId>,
    id: TypeId,
) -> TypeId {
    substitute_depth(interner, owner, bindings, id, 0)
}

fn substitute_depth(
    interner: &mut TypeInterner,
    owner: SymbolId,
    bindings: &FxHashMap<StringId, TypeId>,
    id: TypeId,
    depth: usize,
) -> TypeId {
    if depth >= MAX_INSTANTIATION_DEPTH {
        return interner.builtins().error_;
    }
    let term = interner.lookup(id).clone();
    match term {
        TypeTerm::GenericParam { name, owner: o, .. } if o == owner => {
            bindings.get(&name).copied().unwrap_or(id)
        }
        TypeTerm::Reference { elem, mutable } => {
            let elem = substitute_depth(interner, owner, bindings, elem, depth + 1);
            interner.reference(elem, mutable)
        }
        TypeTerm::Pointer { elem } => {
            let elem = substitute_depth(interner, owner, bindings, elem, depth + 1);
            interner.pointer(elem)
        }
        TypeTerm::Own { elem } => {
            let elem = substitute_depth(interner, owner, bindings, elem, depth + 1);
            interner.own(elem)
        }
        TypeTerm::Array { elem, count } => {
            let elem = substitute_depth(interner, owner, bindings, elem, depth + 1);
            interner.array_term(elem, count)
        }
        TypeTerm::Tuple { elems } => {
            let elems: Vec<TypeId> =
                elems.iter().map(|e| substitute_depth(interner, owner, bindings, *e, depth + 1)).collect();
            interner.register_tuple(elems)
        }
        TypeTerm::Fn { params, ret } => {
            let params: Vec<TypeId> =
                params.iter().map(|p| substitute_depth(interner, owner, bindings, *p, depth + 1)).collect();
            let ret = substitute_depth(interner, owner, bindings, ret, depth + 1);
            interner.register_fn(params, ret)
        }
        TypeTerm::Struct { name, fields, type_args, value_args } => {
            let fields: Vec<(StringId, TypeId)> = fields
                .iter()
                .map(|(n, t)| (*n, substitute_depth(interner, owner, bindings, *t, depth + 1)))
                .collect();
            let type_args: Vec<TypeId> =
                type_args.iter().map(|t| substitute_depth(interner, owner, bindings, *t, depth + 1)).collect();
            interner.intern(TypeTerm::Struct { name, fields, type_args, value_args })
        }
        TypeTerm::Union { name, members, type_args } => {
            let type_args: Vec<TypeId> =
                type_args.iter().map(|t| substitute_depth(interner, owner, bindings, *t, depth + 1)).collect();
            interner.intern(TypeTerm::Union { name, members, type_args })
        }
        TypeTerm::Alias { name, type_args } => {
            let type_args: Vec<TypeId> =
                type_args.iter().map(|t| substitute_depth(interner, owner, bindings, *t, depth + 1)).collect();
            let new_id = interner.intern(TypeTerm::Alias { name, type_args });
            if let Some(target) = interner.alias_target(id) {
                let target = substitute_depth(interner, owner, bindings, target, depth + 1);
                interner.set_alias_target(new_id, target);
            }
            new_id
        }
        _ => id,
    }
}

/// Unify a declared (possibly generic) type against an actual type,
/// filling `bindings`. Returns `false` on a structural or conflicting
/// binding mismatch.
pub fn unify(
    interner: &TypeInterner,
    owner: SymbolId,
    declared: TypeId,
    actual: TypeId,
    bindings: &mut FxHashMap<StringId, TypeId>,
) -> bool {
    match interner.lookup(declared) {
        TypeTerm::GenericParam { name, owner: o, .. } if *o == owner => {
            match bindings.get(name) {
                Some(existing) => *existing == actual,
                None => {
                    bindings.insert(*name, actual);
                    true
                }
            }
        }
        TypeTerm::Reference { elem: d_elem, mutable: d_mut } => match interner.lookup(actual) {
            TypeTerm::Reference { elem: a_elem, mutable: a_mut } if d_mut == a_mut => {
                unify(interner, owner, *d_elem, *a_elem, bindings)
            }
            _ => false,
        },
        TypeTerm::Pointer { elem: d_elem } => match interner.lookup(actual) {
            TypeTerm::Pointer { elem: a_elem } => unify(interner, owner, *d_elem, *a_elem, bindings),
            _ => false,
        },
        TypeTerm::Own { elem: d_elem } => match interner.lookup(actual) {
            TypeTerm::Own { elem: a_elem } => unify(interner, owner, *d_elem, *a_elem, bindings),
            _ => false,
        },
        TypeTerm::Array { elem: d_elem, .. } => match interner.lookup(actual) {
            TypeTerm::Array { elem: a_elem, .. } => unify(interner, owner, *d_elem, *a_elem, bindings),
            _ => false,
        },
        TypeTerm::Tuple { elems: d_elems } => match interner.lookup(actual) {
            TypeTerm::Tuple { elems: a_elems } if d_elems.len() == a_elems.len() => {
                d_elems.iter().zip(a_elems.iter()).all(|(d, a)| unify(interner, owner, *d, *a, bindings))
            }
            _ => false,
        },
        TypeTerm::Struct { name: d_name, fields: d_fields, .. } => match interner.lookup(actual) {
            TypeTerm::Struct { name: a_name, fields: a_fields, .. } if d_name == a_name => d_fields
                .iter()
                .all(|(fname, fty)| {
                    a_fields.iter().find(|(n, _)| n == fname).is_some_and(|(_, aty)| unify(interner, owner, *fty, *aty, bindings))
                }),
            _ => false,
        },
        TypeTerm::Fn { params: d_params, ret: d_ret } => match interner.lookup(actual) {
            TypeTerm::Fn { params: a_params, ret: a_ret } if d_params.len() == a_params.len() => {
                d_params.iter().zip(a_params.iter()).all(|(d, a)| unify(interner, owner, *d, *a, bindings))
                    && unify(interner, owner, *d_ret, *a_ret, bindings)
            }
            _ => false,
        },
        _ => declared == actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unify_binds_a_bare_generic_param() {
        let mut interner = TypeInterner::new();
        let owner = SymbolId::new(0);
        let t_name = StringId::new(1);
        let param = interner.intern(TypeTerm::GenericParam { name: t_name, owner, is_const: false, const_type: None });
        let int_ = interner.builtins().int_;
        let mut bindings = FxHashMap::default();
        assert!(unify(&interner, owner, param, int_, &mut bindings));
        assert_eq!(bindings.get(&t_name), Some(&int_));
    }

    #[test]
    fn unify_rejects_conflicting_bindings() {
        let mut interner = TypeInterner::new();
        let owner = SymbolId::new(0);
        let t_name = StringId::new(1);
        let param = interner.intern(TypeTerm::GenericParam { name: t_name, owner, is_const: false, const_type: None });
        let int_ = interner.builtins().int_;
        let bool_ = interner.builtins().bool_;
        let mut bindings = FxHashMap::default();
        assert!(unify(&interner, owner, param, int_, &mut bindings));
        assert!(!unify(&interner, owner, param, bool_, &mut bindings));
    }

    #[test]
    fn substitute_replaces_generic_param_inside_a_reference() {
        let mut interner = TypeInterner::new();
        let owner = SymbolId::new(0);
        let t_name = StringId::new(1);
        let param = interner.intern(TypeTerm::GenericParam { name: t_name, owner, is_const: false, const_type: None });
        let reference = interner.reference(param, true);
        let int_ = interner.builtins().int_;
        let mut bindings = FxHashMap::default();
        bindings.insert(t_name, int_);
        let result = substitute(&mut interner, owner, &bindings, reference);
        assert_eq!(result, interner.reference(int_, true));
    }

    #[test]
    fn repeated_instantiation_with_same_args_is_idempotent() {
        let mut env = GenericEnv::new();
        let id_fn = SymbolId::new(3);
        let int_ = TypeId::new(7);
        assert!(env.cached_instantiation(id_fn, &[int_]).is_none());
        env.memoize_instantiation(id_fn, vec![int_], TypeId::new(9));
        env.memoize_instantiation(id_fn, vec![int_], TypeId::new(9));
        assert_eq!(env.cached_instantiation(id_fn, &[int_]), Some(TypeId::new(9)));
    }
}
