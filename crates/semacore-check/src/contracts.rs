//! Contract Matcher (§4.H): field/method conformance of a concrete type
//! against a declared contract, plus validation of contract bounds attached
//! to a type parameter.

use rustc_hash::FxHashMap;
use semacore_ast::{SymbolKind, SymbolTable};
use semacore_common::{Code, Span, StringId, SymbolId, TypeId};
use semacore_types::{canonical_key, NameResolver, TypeInterner, TypeKey, TypeTerm};

use crate::context::CheckerState;
use crate::generics::substitute;
use crate::magic_index::MagicIndex;

/// One method signature declared inside a contract, already resolved to
/// `TypeId`s (the walker resolves each `TypeNodeId` before invoking the
/// matcher).
#[derive(Clone, Debug)]
pub struct ContractMethodSig {
    pub name: StringId,
    pub params: Vec<TypeId>,
    pub result: TypeId,
    pub is_overload_group: bool,
}

#[derive(Clone, Debug)]
pub struct ContractShape {
    pub symbol: SymbolId,
    /// The contract's own declared type-parameter names (`C<Args>`).
    pub type_params: Vec<StringId>,
    pub fields: Vec<(StringId, TypeId)>,
    pub methods: Vec<ContractMethodSig>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractIssue {
    MissingField(StringId),
    FieldTypeMismatch { field: StringId, expected: TypeId, found: TypeId },
    MissingMethod(StringId),
    MethodMismatch(StringId),
    SelfTypeMismatch(StringId),
}

/// Check that `candidate` (with its own field list already flattened)
/// satisfies `contract` instantiated at `args`.
pub fn check_contract(
    interner: &mut TypeInterner,
    resolver: &dyn NameResolver,
    magic_index: &MagicIndex,
    contract: &ContractShape,
    args: &[TypeId],
    candidate: TypeId,
    candidate_fields: &[(StringId, TypeId)],
) -> Vec<ContractIssue> {
    let mut bindings = FxHashMap::default();
    for (name, arg) in contract.type_params.iter().zip(args.iter()) {
        bindings.insert(*name, *arg);
    }

    let mut issues = Vec::new();

    for (field_name, field_ty) in &contract.fields {
        let expected = substitute(interner, contract.symbol, &bindings, *field_ty);
        match candidate_fields.iter().find(|(n, _)| n == field_name) {
            None => issues.push(ContractIssue::MissingField(*field_name)),
            Some((_, actual)) if *actual != expected => {
                issues.push(ContractIssue::FieldTypeMismatch { field: *field_name, expected, found: *actual });
            }
            Some(_) => {}
        }
    }

    let receiver_name = receiver_name_of(interner, candidate);
    for method in &contract.methods {
        let expected_params: Vec<TypeId> =
            method.params.iter().map(|p| substitute(interner, contract.symbol, &bindings, *p)).collect();
        let expected_result = substitute(interner, contract.symbol, &bindings, method.result);
        let expected_param_keys: Vec<TypeKey> =
            expected_params.iter().map(|p| canonical_key(interner, resolver, *p)).collect();
        let expected_result_key = canonical_key(interner, resolver, expected_result);

        let found = receiver_name.and_then(|r| {
            magic_index
                .signatures(r, method.name)
                .iter()
                .find(|s| s.params == expected_param_keys && s.result == expected_result_key)
        });

        if found.is_none() {
            let has_same_name = receiver_name
                .map(|r| !magic_index.signatures(r, method.name).is_empty())
                .unwrap_or(false);
            if has_same_name && !method.is_overload_group {
                issues.push(ContractIssue::MethodMismatch(method.name));
            } else if has_same_name && method.is_overload_group {
                issues.push(ContractIssue::SelfTypeMismatch(method.name));
            } else {
                issues.push(ContractIssue::MissingMethod(method.name));
            }
        }
    }

    issues
}

/// The nominal name a candidate type would be indexed under in the
/// `MagicIndex` (struct/union/alias name), or `None` for structural types
/// that can't carry methods.
fn receiver_name_of(interner: &TypeInterner, id: TypeId) -> Option<StringId> {
    match interner.lookup(id) {
        TypeTerm::Struct { name, .. } | TypeTerm::Union { name, .. } | TypeTerm::Alias { name, .. } => Some(*name),
        _ => None,
    }
}

/// Check every concrete type bound to `owner`'s type parameters (`bindings`,
/// as built by generic instantiation at a call site or a generic
/// struct/alias reference) against the contracts declared on those
/// parameters, emitting the matcher's diagnostics for anything unsatisfied
/// (§4.H, Testable Property 9).
pub fn enforce_bounds(state: &mut CheckerState<'_>, owner: SymbolId, bindings: &FxHashMap<StringId, TypeId>, span: Span) {
    for (&param_name, &concrete_ty) in bindings {
        let Some(bound_list) = state.type_param_bounds.get(&(owner, param_name)).cloned() else { continue };
        let resolved = state.interner.resolve_alias(concrete_ty);
        let candidate_fields: Vec<(StringId, TypeId)> =
            state.interner.struct_info(resolved).map(|info| info.fields.to_vec()).unwrap_or_default();
        for (contract_symbol, args) in bound_list {
            let Some(shape) = state.contract_shapes.get(&contract_symbol).cloned() else { continue };
            let issues = check_contract(state.interner, state.resolver, &state.magic_index, &shape, &args, resolved, &candidate_fields);
            if issues.is_empty() {
                continue;
            }
            let type_name = canonical_key(state.interner, state.resolver, resolved);
            let contract_name = state.symbol_name_str(contract_symbol).to_string();
            for issue in issues {
                emit_contract_issue(state, &type_name, &contract_name, issue, span);
            }
        }
    }
}

fn emit_contract_issue(state: &mut CheckerState<'_>, type_name: &str, contract_name: &str, issue: ContractIssue, span: Span) {
    match issue {
        ContractIssue::MissingField(field) => {
            let field = state.resolver.resolve(field).to_string();
            state.emit(
                Code::SemaContractMissingField,
                format!("type '{type_name}' is missing field '{field}' required by '{contract_name}'"),
                span,
            );
        }
        ContractIssue::FieldTypeMismatch { field, expected, found } => {
            let field = state.resolver.resolve(field).to_string();
            let expected_str = canonical_key(state.interner, state.resolver, expected);
            let found_str = canonical_key(state.interner, state.resolver, found);
            state.emit(
                Code::SemaContractFieldTypeError,
                format!("field '{field}' on '{type_name}' has type '{found_str}', expected '{expected_str}' to satisfy '{contract_name}'"),
                span,
            );
        }
        ContractIssue::MissingMethod(method) => {
            let method = state.resolver.resolve(method).to_string();
            state.emit(
                Code::SemaContractMissingMethod,
                format!("type '{type_name}' is missing method '{method}' required by '{contract_name}'"),
                span,
            );
        }
        ContractIssue::MethodMismatch(method) => {
            let method = state.resolver.resolve(method).to_string();
            state.emit(
                Code::SemaContractMethodMismatch,
                format!("method '{method}' on '{type_name}' does not match the signature required by '{contract_name}'"),
                span,
            );
        }
        ContractIssue::SelfTypeMismatch(method) => {
            let method = state.resolver.resolve(method).to_string();
            state.emit(Code::SemaContractSelfType, format!("method '{method}' on '{type_name}' has an incompatible receiver type"), span);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundIssue {
    Duplicate(SymbolId),
    NotFound,
    NotContract(SymbolId),
}

/// Validate a type parameter's bound list (`T: A + B`) for duplicates,
/// unresolved names, and non-contract symbols used in bound position.
/// `is_contract` distinguishes declared contract symbols from other
/// `SymbolKind::Type` symbols (structs, aliases, unions), since the symbol
/// table doesn't carry a dedicated contract kind.
pub fn validate_bounds(symbols: &SymbolTable, bounds: &[SymbolId], is_contract: impl Fn(SymbolId) -> bool) -> Vec<BoundIssue> {
    let mut seen: Vec<SymbolId> = Vec::new();
    let mut issues = Vec::new();
    for &bound in bounds {
        if bound.is_none() {
            issues.push(BoundIssue::NotFound);
            continue;
        }
        let symbol = symbols.symbol(bound);
        if symbol.kind != SymbolKind::Type || !is_contract(bound) {
            issues.push(BoundIssue::NotContract(bound));
            continue;
        }
        if seen.contains(&bound) {
            issues.push(BoundIssue::Duplicate(bound));
        } else {
            seen.push(bound);
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use semacore_ast::{Symbol, SymbolFlags};
    use semacore_common::ExprId;
    use std::collections::HashMap;

    struct FakeResolver(HashMap<StringId, String>);
    impl NameResolver for FakeResolver {
        fn resolve(&self, id: StringId) -> &str {
            self.0.get(&id).map(String::as_str).unwrap_or("?")
        }
    }

    fn type_symbol(name: StringId) -> Symbol {
        Symbol {
            name,
            kind: SymbolKind::Type,
            scope: semacore_common::ScopeId::new(0),
            decl_site: ExprId::new(0),
            ty: TypeId::NONE,
            type_params: Vec::new(),
            type_param_symbols: Vec::new(),
            flags: SymbolFlags::empty(),
            receiver_key: None,
        }
    }

    #[test]
    fn missing_field_is_reported() {
        let mut interner = TypeInterner::new();
        let resolver = FakeResolver(HashMap::new());
        let magic_index = MagicIndex::default();
        let int_ = interner.builtins().int_;
        let msg_name = StringId::new(5);
        let contract = ContractShape {
            symbol: SymbolId::new(0),
            type_params: Vec::new(),
            fields: vec![(msg_name, int_)],
            methods: Vec::new(),
        };
        let candidate_name = StringId::new(10);
        let candidate = interner.intern(TypeTerm::Struct { name: candidate_name, fields: vec![], type_args: vec![], value_args: vec![] });
        let issues = check_contract(&mut interner, &resolver, &magic_index, &contract, &[], candidate, &[]);
        assert_eq!(issues, vec![ContractIssue::MissingField(msg_name)]);
    }

    #[test]
    fn matching_field_produces_no_issue() {
        let mut interner = TypeInterner::new();
        let resolver = FakeResolver(HashMap::new());
        let magic_index = MagicIndex::default();
        let int_ = interner.builtins().int_;
        let msg_name = StringId::new(5);
        let contract = ContractShape {
            symbol: SymbolId::new(0),
            type_params: Vec::new(),
            fields: vec![(msg_name, int_)],
            methods: Vec::new(),
        };
        let candidate_name = StringId::new(10);
        let candidate = interner.intern(TypeTerm::Struct { name: candidate_name, fields: vec![], type_args: vec![], value_args: vec![] });
        let issues = check_contract(&mut interner, &resolver, &magic_index, &contract, &[], candidate, &[(msg_name, int_)]);
        assert!(issues.is_empty());
    }

    #[test]
    fn duplicate_bound_is_rejected() {
        let mut symbols = SymbolTable::new();
        let foo = StringId::new(1);
        let bound = symbols.push_symbol(type_symbol(foo));
        let issues = validate_bounds(&symbols, &[bound, bound], |_| true);
        assert_eq!(issues, vec![BoundIssue::Duplicate(bound)]);
    }

    #[test]
    fn non_contract_bound_is_rejected() {
        let mut symbols = SymbolTable::new();
        let foo = StringId::new(1);
        let bound = symbols.push_symbol(type_symbol(foo));
        let issues = validate_bounds(&symbols, &[bound], |_| false);
        assert_eq!(issues, vec![BoundIssue::NotContract(bound)]);
    }
}
