//! Dense interned ids used throughout the core.
//!
//! Every id is a `#[repr(transparent)]` newtype over `u32` with a sentinel
//! `NONE` value. Ids are stable for the lifetime of a compilation unit and
//! comparable in O(1); they never carry a lifetime of their own.

use std::fmt;

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel value meaning "absent" / "no id".
            pub const NONE: Self = Self(u32::MAX);

            #[inline]
            #[must_use]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            #[must_use]
            pub const fn index(self) -> u32 {
                self.0
            }

            #[inline]
            #[must_use]
            pub const fn as_usize(self) -> usize {
                self.0 as usize
            }

            #[inline]
            #[must_use]
            pub const fn is_none(self) -> bool {
                self.0 == u32::MAX
            }

            #[inline]
            #[must_use]
            pub const fn is_some(self) -> bool {
                !self.is_none()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_none() {
                    write!(f, concat!(stringify!($name), "(none)"))
                } else {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                }
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

dense_id! {
    /// Interned source identifier name (e.g. `foo` in `let foo = 1;`).
    /// The sentinel denotes "no string".
    StringId
}

dense_id! {
    /// Interned AST expression node id.
    ExprId
}

dense_id! {
    /// Binding/declaration symbol id, produced by the external name resolver.
    SymbolId
}

dense_id! {
    /// Lexical scope id, produced by the external name resolver.
    ScopeId
}

dense_id! {
    /// Canonical interned type handle.
    TypeId
}

dense_id! {
    /// Interned id for an active borrow.
    BorrowId
}
