//! `TypeKey` — a canonical textual form of a type, used as a hash key for
//! the Magic Index and for cross-module signature comparison (§4.C, §9
//! Glossary "Canonicalization").
//!
//! Array shapes collapse to a single `"[]"` key for *receiver* lookup so
//! methods declared on `Array` apply uniformly to `Array<T>` and
//! `ArrayFixed<T, N>`; elsewhere (parameter/result comparison) the full
//! shape-preserving key is used.

use crate::interner::TypeInterner;
use crate::term::{ArrayLen, TypeTerm, UnionMember};
use semacore_common::{StringId, TypeId};

/// A canonical string form of a type, interned-string-agnostic (the caller
/// supplies a name resolver so this crate doesn't depend on the string
/// interner's storage).
pub type TypeKey = String;

pub trait NameResolver {
    fn resolve(&self, id: StringId) -> &str;
}

/// Build the full, shape-preserving canonical key for a type (used to
/// compare parameter/result types between a candidate signature and a call
/// site).
#[must_use]
pub fn canonical_key(interner: &TypeInterner, resolver: &dyn NameResolver, id: TypeId) -> TypeKey {
    let b = interner.builtins();
    if id == b.bool_ {
        return "bool".to_string();
    }
    if id == b.int_ {
        return "int".to_string();
    }
    if id == b.uint_ {
        return "uint".to_string();
    }
    if id == b.float_ {
        return "float".to_string();
    }
    if id == b.string_ {
        return "string".to_string();
    }
    if id == b.nothing_ {
        return "nothing".to_string();
    }
    if id == b.unit_ {
        return "unit".to_string();
    }

    match interner.lookup(id) {
        TypeTerm::Reference { elem, mutable } => {
            let inner = canonical_key(interner, resolver, *elem);
            if *mutable { format!("&mut {inner}") } else { format!("&{inner}") }
        }
        TypeTerm::Pointer { elem } => format!("*{}", canonical_key(interner, resolver, *elem)),
        TypeTerm::Own { elem } => format!("own {}", canonical_key(interner, resolver, *elem)),
        TypeTerm::Array { elem, count } => {
            let inner = canonical_key(interner, resolver, *elem);
            match count {
                ArrayLen::Dynamic => format!("[{inner}]"),
                ArrayLen::Fixed(n) => format!("[{inner}; {n}]"),
            }
        }
        TypeTerm::Tuple { elems } => {
            let parts: Vec<String> = elems.iter().map(|e| canonical_key(interner, resolver, *e)).collect();
            format!("({})", parts.join(", "))
        }
        TypeTerm::Struct { name, type_args, value_args, .. } => {
            let name_str = resolver.resolve(*name);
            if type_args.is_empty() && value_args.is_empty() {
                name_str.to_string()
            } else {
                let mut parts: Vec<String> =
                    type_args.iter().map(|t| canonical_key(interner, resolver, *t)).collect();
                parts.extend(value_args.iter().map(|v| v.to_string()));
                format!("{name_str}<{}>", parts.join(", "))
            }
        }
        TypeTerm::Alias { name, type_args } => {
            let name_str = resolver.resolve(*name);
            if type_args.is_empty() {
                name_str.to_string()
            } else {
                let parts: Vec<String> =
                    type_args.iter().map(|t| canonical_key(interner, resolver, *t)).collect();
                format!("{name_str}<{}>", parts.join(", "))
            }
        }
        TypeTerm::Union { name, .. } => resolver.resolve(*name).to_string(),
        TypeTerm::Const { value } => value.to_string(),
        TypeTerm::GenericParam { name, .. } => resolver.resolve(*name).to_string(),
        TypeTerm::Fn { params, ret } => {
            let parts: Vec<String> = params.iter().map(|p| canonical_key(interner, resolver, *p)).collect();
            format!("fn({}) -> {}", parts.join(", "), canonical_key(interner, resolver, *ret))
        }
        TypeTerm::Error => "<error>".to_string(),
        TypeTerm::Bool | TypeTerm::Int | TypeTerm::Uint | TypeTerm::Float | TypeTerm::String
        | TypeTerm::Nothing | TypeTerm::Unit => unreachable!("handled by builtin fast path above"),
    }
}

/// Build the *receiver* key used to index the Magic Index: array shapes
/// (fixed or dynamic, any element type) collapse to `"[]"`; everything else
/// uses its full canonical key.
#[must_use]
pub fn receiver_key(interner: &TypeInterner, resolver: &dyn NameResolver, id: TypeId) -> TypeKey {
    match interner.lookup(id) {
        TypeTerm::Array { .. } => "[]".to_string(),
        TypeTerm::Struct { name, .. } => {
            let name_str = resolver.resolve(*name);
            if is_array_nominal_name(name_str) { "[]".to_string() } else { canonical_key(interner, resolver, id) }
        }
        _ => canonical_key(interner, resolver, id),
    }
}

fn is_array_nominal_name(name: &str) -> bool {
    name == "Array" || name == "ArrayFixed"
}

/// Whether `id` is known to be hashable for use as a map-literal key:
/// a primitive, or a nominal struct the caller marks hashable (checked by
/// the caller via its symbol flags; this function only covers primitives).
#[must_use]
pub fn is_primitive_hashable(interner: &TypeInterner, id: TypeId) -> bool {
    matches!(interner.lookup(interner.resolve_alias(id)), TypeTerm::Bool | TypeTerm::Int | TypeTerm::Uint | TypeTerm::String)
}

/// Encode a union member list for dedup purposes inside `canonical_key`
/// callers that need to distinguish tag shapes (exhaustiveness checking).
#[must_use]
pub fn union_member_key(resolver: &dyn NameResolver, member: &UnionMember) -> String {
    match member {
        UnionMember::Tag { tag_name, tag_args } => {
            format!("{}/{}", resolver.resolve(*tag_name), tag_args.len())
        }
        UnionMember::Nothing => "Nothing".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::ArrayLen;
    use std::collections::HashMap;

    struct FakeResolver(HashMap<StringId, String>);
    impl NameResolver for FakeResolver {
        fn resolve(&self, id: StringId) -> &str {
            self.0.get(&id).map(String::as_str).unwrap_or("?")
        }
    }

    #[test]
    fn array_and_array_fixed_share_receiver_key() {
        let mut interner = TypeInterner::new();
        let int_ = interner.builtins().int_;
        let dyn_arr = interner.array_term(int_, ArrayLen::Dynamic);
        let fixed_arr = interner.array_term(int_, ArrayLen::Fixed(4));
        let resolver = FakeResolver(HashMap::new());
        assert_eq!(receiver_key(&interner, &resolver, dyn_arr), "[]");
        assert_eq!(receiver_key(&interner, &resolver, fixed_arr), "[]");
    }

    #[test]
    fn canonical_key_preserves_fixed_length() {
        let mut interner = TypeInterner::new();
        let int_ = interner.builtins().int_;
        let fixed_arr = interner.array_term(int_, ArrayLen::Fixed(4));
        let resolver = FakeResolver(HashMap::new());
        assert_eq!(canonical_key(&interner, &resolver, fixed_arr), "[int; 4]");
    }

    #[test]
    fn struct_nominal_name_roundtrips() {
        let mut interner = TypeInterner::new();
        let mut names = HashMap::new();
        let foo = StringId::new(5);
        names.insert(foo, "Foo".to_string());
        let ty = interner.intern(TypeTerm::Struct {
            name: foo,
            fields: Vec::new(),
            type_args: Vec::new(),
            value_args: Vec::new(),
        });
        let resolver = FakeResolver(names);
        assert_eq!(canonical_key(&interner, &resolver, ty), "Foo");
    }
}
