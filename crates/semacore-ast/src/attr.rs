//! Attribute representation (`@copy`, `@overload`, `@requires_lock(name)`, ...).

use semacore_common::StringId;

/// An attribute argument. Only string and integer literals are needed by the
/// attributes this core consumes (`@requires_lock("f")`, `@overload`, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrArg {
    Str(StringId),
    Int(i64),
}

/// An attribute attached to a declaration node (function, let/const, param, impl).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attr {
    pub name: StringId,
    pub args: Vec<AttrArg>,
}

impl Attr {
    #[must_use]
    pub fn simple(name: StringId) -> Self {
        Self { name, args: Vec::new() }
    }

    #[must_use]
    pub fn with_str_arg(name: StringId, arg: StringId) -> Self {
        Self { name, args: vec![AttrArg::Str(arg)] }
    }

    #[must_use]
    pub fn first_str_arg(&self) -> Option<StringId> {
        self.args.iter().find_map(|a| match a {
            AttrArg::Str(s) => Some(*s),
            AttrArg::Int(_) => None,
        })
    }
}
