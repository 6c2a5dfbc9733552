//! Magic Index (§4.C): `receiver -> method name -> signature list`, used to
//! resolve operator overloads, casts, indexing, and iteration to user-
//! defined functions.

use rustc_hash::FxHashMap;
use semacore_ast::{SymbolKind, SymbolTable};
use semacore_common::{StringId, SymbolId};
use semacore_types::{canonical_key, NameResolver, TypeInterner, TypeKey, TypeTerm};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub symbol: SymbolId,
    /// Parameter keys *excluding* the receiver.
    pub params: Vec<TypeKey>,
    pub result: TypeKey,
    pub variadic: Vec<bool>,
    pub has_self: bool,
}

#[derive(Debug, Default)]
pub struct MagicIndex {
    receivers: FxHashMap<StringId, FxHashMap<StringId, Vec<Signature>>>,
    /// `__to` signatures rejected at indexing time (malformed shape).
    pub invalid_to: Vec<SymbolId>,
}

impl MagicIndex {
    /// Build the index once per `Check()` call from the symbol table.
    pub fn build(symbols: &SymbolTable, interner: &TypeInterner, resolver: &dyn NameResolver) -> Self {
        let mut index = Self::default();
        for i in 0..symbols.len() {
            let sym_id = SymbolId::new(i as u32);
            let symbol = symbols.symbol(sym_id);
            if symbol.kind != SymbolKind::Function {
                continue;
            }
            let Some(receiver) = symbol.receiver_key else { continue };
            let Some(TypeTerm::Fn { params, ret }) = maybe_fn(interner, symbol.ty) else { continue };
            if params.is_empty() {
                continue;
            }
            let method_name = symbol.name;
            let result_key = canonical_key(interner, resolver, *ret);
            let param_keys: Vec<TypeKey> =
                params[1..].iter().map(|p| canonical_key(interner, resolver, *p)).collect();
            let variadic = vec![false; param_keys.len()];

            let method_str = resolver.resolve(method_name);
            if method_str == "__to" {
                let target_matches_result = param_keys.len() == 1 && param_keys[0] == result_key;
                if param_keys.len() != 1 || !target_matches_result {
                    index.invalid_to.push(sym_id);
                    continue;
                }
            }

            let sig = Signature { symbol: sym_id, params: param_keys, result: result_key, variadic, has_self: true };
            index.receivers.entry(receiver).or_default().entry(method_name).or_default().push(sig);
        }
        index
    }

    #[must_use]
    pub fn signatures(&self, receiver: StringId, method: StringId) -> &[Signature] {
        self.receivers.get(&receiver).and_then(|m| m.get(&method)).map_or(&[], Vec::as_slice)
    }

    /// Look up signatures by literal method name (`"__add"`, `"__index"`, ...)
    /// rather than by a pre-interned `StringId`, for magic operator dispatch
    /// where the checker only knows the operator's surface spelling.
    #[must_use]
    pub fn signatures_named(&self, resolver: &dyn NameResolver, receiver: StringId, name: &str) -> &[Signature] {
        self.receivers
            .get(&receiver)
            .and_then(|methods| methods.iter().find(|(id, _)| resolver.resolve(**id) == name))
            .map_or(&[], |(_, sigs)| sigs.as_slice())
    }
}

fn maybe_fn(interner: &TypeInterner, ty: semacore_common::TypeId) -> Option<&TypeTerm> {
    if ty.is_none() {
        return None;
    }
    let resolved = interner.resolve_alias(ty);
    match interner.lookup(resolved) {
        f @ TypeTerm::Fn { .. } => Some(f),
        _ => None,
    }
}

/// Overload resolution outcome for an operator/cast/index/method call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Found(SymbolId),
    Ambiguous(Vec<SymbolId>),
    NoMatch,
}

/// Lookup policy (§4.C): iterate receiver candidates in order, then
/// signatures; pick the first whose parameter keys match the call-site
/// argument keys. Prefer a single exact match; if more than one
/// equally-specific candidate matches, report ambiguity.
#[must_use]
pub fn resolve_overload(index: &MagicIndex, receivers: &[StringId], method: StringId, arg_keys: &[TypeKey]) -> Resolution {
    for &receiver in receivers {
        let sigs = index.signatures(receiver, method);
        let matches: Vec<SymbolId> =
            sigs.iter().filter(|s| s.params == arg_keys).map(|s| s.symbol).collect();
        if matches.len() == 1 {
            return Resolution::Found(matches[0]);
        }
        if matches.len() > 1 {
            return Resolution::Ambiguous(matches);
        }
    }
    Resolution::NoMatch
}

/// Same policy as [`resolve_overload`], keyed by literal method name instead
/// of a pre-interned `StringId` (used for built-in operator magic methods
/// like `__add`/`__index` whose spelling the checker knows but whose
/// `StringId` it has no reason to pre-intern).
#[must_use]
pub fn resolve_overload_named(
    index: &MagicIndex,
    resolver: &dyn NameResolver,
    receivers: &[StringId],
    name: &str,
    arg_keys: &[TypeKey],
) -> Resolution {
    for &receiver in receivers {
        let sigs = index.signatures_named(resolver, receiver, name);
        let matches: Vec<SymbolId> =
            sigs.iter().filter(|s| s.params == arg_keys).map(|s| s.symbol).collect();
        if matches.len() == 1 {
            return Resolution::Found(matches[0]);
        }
        if matches.len() > 1 {
            return Resolution::Ambiguous(matches);
        }
    }
    Resolution::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;
    use semacore_ast::{Symbol, SymbolFlags, SymbolTable};
    use semacore_common::{ExprId, ScopeId, TypeId};
    use std::collections::HashMap;

    struct FakeResolver(HashMap<StringId, String>);
    impl NameResolver for FakeResolver {
        fn resolve(&self, id: StringId) -> &str {
            self.0.get(&id).map(String::as_str).unwrap_or("?")
        }
    }

    fn function_symbol(name: StringId, receiver: StringId, ty: TypeId, scope: ScopeId) -> Symbol {
        Symbol {
            name,
            kind: SymbolKind::Function,
            scope,
            decl_site: ExprId::new(0),
            ty,
            type_params: Vec::new(),
            type_param_symbols: Vec::new(),
            flags: SymbolFlags::empty(),
            receiver_key: Some(receiver),
        }
    }

    #[test]
    fn indexes_a_binary_magic_method_by_receiver_and_name() {
        let mut interner = TypeInterner::new();
        let int_ = interner.builtins().int_;
        let fn_ty = interner.register_fn(vec![int_, int_], int_);

        let mut symbols = SymbolTable::new();
        let scope = symbols.push_scope(None);
        let foo = StringId::new(1);
        let add = StringId::new(2);
        symbols.push_symbol(function_symbol(add, foo, fn_ty, scope));

        let mut names = HashMap::new();
        names.insert(foo, "Foo".to_string());
        names.insert(add, "__add".to_string());
        let resolver = FakeResolver(names);

        let index = MagicIndex::build(&symbols, &interner, &resolver);
        let sigs = index.signatures(foo, add);
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].params, vec!["int".to_string()]);
        assert_eq!(sigs[0].result, "int".to_string());
    }

    #[test]
    fn malformed_to_signature_is_rejected() {
        let mut interner = TypeInterner::new();
        let int_ = interner.builtins().int_;
        let string_ = interner.builtins().string_;
        // __to(self: Foo, a: int, b: int) -> string: wrong arity.
        let fn_ty = interner.register_fn(vec![int_, int_, int_], string_);

        let mut symbols = SymbolTable::new();
        let scope = symbols.push_scope(None);
        let foo = StringId::new(1);
        let to_name = StringId::new(2);
        symbols.push_symbol(function_symbol(to_name, foo, fn_ty, scope));

        let mut names = HashMap::new();
        names.insert(foo, "Foo".to_string());
        names.insert(to_name, "__to".to_string());
        let resolver = FakeResolver(names);

        let index = MagicIndex::build(&symbols, &interner, &resolver);
        assert_eq!(index.invalid_to.len(), 1);
        assert!(index.signatures(foo, to_name).is_empty());
    }
}
