//! Numeric widening lattice (§4.M Conversion/Coercion).
//!
//! `Int`, `Uint`, and `Float` are the three numeric *kinds*; widening between
//! them is silent (implicit), narrowing requires an explicit cast. Integer
//! literals are untyped until a context fixes their kind, so a literal may
//! coerce to any numeric kind without a cast (`contextual_literal_fits`).

use crate::interner::TypeInterner;
use semacore_common::TypeId;

/// One of the three numeric kinds tracked by the widening lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericKind {
    Int,
    Uint,
    Float,
}

#[must_use]
pub fn numeric_kind(interner: &TypeInterner, id: TypeId) -> Option<NumericKind> {
    let b = interner.builtins();
    let resolved = interner.resolve_alias(id);
    if resolved == b.int_ {
        Some(NumericKind::Int)
    } else if resolved == b.uint_ {
        Some(NumericKind::Uint)
    } else if resolved == b.float_ {
        Some(NumericKind::Float)
    } else {
        None
    }
}

/// Direction of a widening edge in the lattice: `Uint -> Int -> Float`, and
/// `Uint -> Float` directly. `Int -> Uint` is never silent (sign loss).
#[must_use]
pub fn widens_silently(from: NumericKind, to: NumericKind) -> bool {
    use NumericKind::{Float, Int, Uint};
    matches!((from, to), (Uint, Int) | (Uint, Float) | (Int, Float) | (Float, Float) | (Int, Int) | (Uint, Uint))
}

/// Whether `from -> to` requires an explicit cast (narrowing, or a sign
/// change that isn't a pure widen).
#[must_use]
pub fn requires_explicit_cast(from: NumericKind, to: NumericKind) -> bool {
    from != to && !widens_silently(from, to)
}

/// An untyped integer literal fits any numeric kind without a cast; this is
/// the "contextual literal coercion" path distinct from `widens_silently`,
/// which only applies to already-typed operands.
#[must_use]
pub fn contextual_literal_fits(_value: i64, _to: NumericKind) -> bool {
    true
}

/// Resolve the join of two numeric kinds under silent widening, used when
/// typing a binary arithmetic expression whose operands are both numeric but
/// not identically typed. Returns `None` if neither widens into the other
/// (e.g. `Int` and `Uint` both typed, neither a literal).
#[must_use]
pub fn widening_join(a: NumericKind, b: NumericKind) -> Option<NumericKind> {
    if a == b {
        return Some(a);
    }
    if widens_silently(a, b) {
        return Some(b);
    }
    if widens_silently(b, a) {
        return Some(a);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use NumericKind::{Float, Int, Uint};

    #[test]
    fn uint_widens_to_int_and_float() {
        assert!(widens_silently(Uint, Int));
        assert!(widens_silently(Uint, Float));
    }

    #[test]
    fn int_to_uint_requires_cast() {
        assert!(requires_explicit_cast(Int, Uint));
        assert!(!widens_silently(Int, Uint));
    }

    #[test]
    fn float_to_int_requires_cast() {
        assert!(requires_explicit_cast(Float, Int));
    }

    #[test]
    fn join_prefers_the_wider_kind() {
        assert_eq!(widening_join(Uint, Float), Some(Float));
        assert_eq!(widening_join(Int, Int), Some(Int));
        assert_eq!(widening_join(Int, Uint), None);
    }

    #[test]
    fn numeric_kind_identifies_builtins() {
        let interner = TypeInterner::new();
        let b = interner.builtins();
        assert_eq!(numeric_kind(&interner, b.int_), Some(Int));
        assert_eq!(numeric_kind(&interner, b.bool_), None);
    }
}
