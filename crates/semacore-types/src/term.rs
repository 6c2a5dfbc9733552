//! Type terms — the structural payload behind a `TypeId`.
//!
//! Two terms that are structurally identical intern to the same `TypeId`.
//! Aliases are the one exception: an alias is a distinct identity from its
//! target so diagnostics can print the alias name (§3 Data Model,
//! "aliases are not auto-resolved by ID equality").

use semacore_common::{StringId, SymbolId, TypeId};

/// Length of an `Array`/`ArrayFixed` type term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArrayLen {
    Dynamic,
    Fixed(u64),
}

/// A single member of a tagged `Union`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnionMember {
    Tag { tag_name: StringId, tag_args: Vec<TypeId> },
    Nothing,
}

/// Structural type term, keyed for hash-consing in the `TypeInterner`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeTerm {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Nothing,
    Unit,

    Reference { elem: TypeId, mutable: bool },
    Pointer { elem: TypeId },
    Own { elem: TypeId },
    Array { elem: TypeId, count: ArrayLen },
    Tuple { elems: Vec<TypeId> },

    /// Also encodes nominal wrappers: `Array<T>`, `ArrayFixed<T, N>`, `Range<T>`,
    /// `Option<T>`, `Result<T, E>`, `Task<T>`, `Channel<T>`, `Map<K, V>`.
    Struct { name: StringId, fields: Vec<(StringId, TypeId)>, type_args: Vec<TypeId>, value_args: Vec<i64> },

    /// An alias's own identity; its target is tracked out-of-band via
    /// `TypeInterner::set_alias_target` so that declaring a recursive group
    /// of aliases doesn't require knowing every target up front.
    Alias { name: StringId, type_args: Vec<TypeId> },

    Union { name: StringId, members: Vec<UnionMember>, type_args: Vec<TypeId> },

    /// Type-level const numeric, used for `ArrayFixed` length and const generics.
    Const { value: i64 },

    GenericParam { name: StringId, owner: SymbolId, is_const: bool, const_type: Option<TypeId> },

    /// Function value type: `register_fn(params, ret)`. Not itself part of
    /// the surface grammar's named Type ID variants but required to type
    /// callable values (closures, function items used as values).
    Fn { params: Vec<TypeId>, ret: TypeId },

    /// Sentinel produced when typing fails; never participates in further
    /// typing decisions beyond "don't cascade more errors on this node".
    Error,
}

impl TypeTerm {
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeTerm::Bool
                | TypeTerm::Int
                | TypeTerm::Uint
                | TypeTerm::Float
                | TypeTerm::String
                | TypeTerm::Nothing
                | TypeTerm::Unit
        )
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeTerm::Int | TypeTerm::Uint | TypeTerm::Float)
    }
}
