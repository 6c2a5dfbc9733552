//! Type Interner (component B), receiver-key canonicalization (used by the
//! Magic Index, component C), and the numeric widening lattice (used by
//! Conversion/Coercion, component M).

pub mod interner;
pub mod key;
pub mod numeric;
pub mod term;

pub use interner::{AliasInfo, Builtins, StructInfo, TypeInterner, UnionInfo};
pub use key::{canonical_key, is_primitive_hashable, receiver_key, union_member_key, NameResolver, TypeKey};
pub use numeric::{contextual_literal_fits, numeric_kind, requires_explicit_cast, widening_join, widens_silently, NumericKind};
pub use term::{ArrayLen, TypeTerm, UnionMember};
