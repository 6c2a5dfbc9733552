//! Syntactic type expressions, as written by the programmer, prior to
//! interning into a `semacore_types::TypeId`.
//!
//! These are distinct from `TypeId`: a `TypeNode` is a piece of surface
//! syntax (`Own<[int]>`, `Foo<T>`) that the checker resolves into a
//! canonical `TypeId` via `semacore-check`'s type-node resolution, the way
//! `tsz-checker::TypeNodeChecker` resolves a TS type-reference AST node into
//! a `TypeId`.

use semacore_common::StringId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct TypeNodeId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeNode {
    /// A named type, possibly with type/value arguments: `Foo`, `Array<int>`, `ArrayFixed<int, 4>`.
    Named { name: StringId, type_args: Vec<TypeNodeId>, value_args: Vec<ConstArg> },
    Tuple(Vec<TypeNodeId>),
    Reference { elem: TypeNodeId, mutable: bool },
    Pointer(TypeNodeId),
    Own(TypeNodeId),
    Array { elem: TypeNodeId, count: Option<ConstArg> },
    Unit,
    /// `const N` used as a type-level value (array fixed length, etc.).
    ConstValue(ConstArg),
}

/// A type-level constant argument (e.g. the `4` in `ArrayFixed<int, 4>`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstArg {
    Int(i64),
    /// Reference to an in-scope const generic parameter by name.
    Param(StringId),
}
