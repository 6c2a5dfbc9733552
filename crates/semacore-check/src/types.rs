//! Type-node resolution: turning a syntactic `TypeNode` (as written by the
//! programmer) into an interned `TypeId`, the way `tsz-checker`'s
//! `TypeNodeChecker` resolves a TS type-reference AST node.

use rustc_hash::FxHashMap;
use semacore_ast::{ConstArg, TypeNode};
use semacore_common::{Code, ScopeId, Span, StringId, TypeId};
use semacore_types::{ArrayLen, TypeTerm};

use crate::context::CheckerState;
use crate::contracts::enforce_bounds;
use crate::generics::substitute;

pub fn resolve_type_node(state: &mut CheckerState<'_>, scope: ScopeId, node: semacore_ast::TypeNodeId) -> TypeId {
    match state.builder.type_node(node).clone() {
        TypeNode::Unit => state.interner.builtins().unit_,
        TypeNode::ConstValue(arg) => resolve_const_arg(state, scope, &arg),
        TypeNode::Reference { elem, mutable } => {
            let e = resolve_type_node(state, scope, elem);
            state.interner.reference(e, mutable)
        }
        TypeNode::Pointer(elem) => {
            let e = resolve_type_node(state, scope, elem);
            state.interner.pointer(e)
        }
        TypeNode::Own(elem) => {
            let e = resolve_type_node(state, scope, elem);
            state.interner.own(e)
        }
        TypeNode::Tuple(elems) => {
            let resolved: Vec<TypeId> = elems.iter().map(|e| resolve_type_node(state, scope, *e)).collect();
            state.interner.register_tuple(resolved)
        }
        TypeNode::Array { elem, count } => {
            let e = resolve_type_node(state, scope, elem);
            let len = match count {
                None => ArrayLen::Dynamic,
                Some(ConstArg::Int(n)) => ArrayLen::Fixed(n as u64),
                Some(ConstArg::Param(name)) => match array_len_from_param(state, scope, name) {
                    Some(n) => ArrayLen::Fixed(n),
                    None => ArrayLen::Dynamic,
                },
            };
            state.interner.array_term(e, len)
        }
        TypeNode::Named { name, type_args, value_args } => resolve_named(state, scope, name, &type_args, &value_args),
    }
}

fn array_len_from_param(state: &CheckerState<'_>, scope: ScopeId, name: StringId) -> Option<u64> {
    let symbol = state.symbols.symbol(state.symbols.lookup(scope, name)?);
    match state.interner.lookup(symbol.ty) {
        TypeTerm::Const { value } => Some(*value as u64),
        _ => None,
    }
}

fn resolve_const_arg(state: &mut CheckerState<'_>, scope: ScopeId, arg: &ConstArg) -> TypeId {
    match arg {
        ConstArg::Int(v) => state.interner.intern(TypeTerm::Const { value: *v }),
        ConstArg::Param(name) => match state.symbols.lookup(scope, *name) {
            Some(sym) => state.symbols.symbol(sym).ty,
            None => state.error_type(),
        },
    }
}

fn resolve_named(
    state: &mut CheckerState<'_>,
    scope: ScopeId,
    name: StringId,
    type_args: &[semacore_ast::TypeNodeId],
    value_args: &[ConstArg],
) -> TypeId {
    let name_str = state.resolver.resolve(name).to_string();
    if let Some(builtin) = builtin_type(state, &name_str) {
        return builtin;
    }

    let Some(symbol_id) = state.symbols.lookup(scope, name) else {
        state.emit(Code::SemaTypeMismatch, format!("unknown type '{name_str}'"), Span::dummy());
        return state.error_type();
    };
    let symbol = state.symbols.symbol(symbol_id).clone();
    if symbol.type_params.is_empty() || (type_args.is_empty() && value_args.is_empty()) {
        return symbol.ty;
    }

    let mut resolved_args: Vec<TypeId> = type_args.iter().map(|t| resolve_type_node(state, scope, *t)).collect();
    resolved_args.extend(value_args.iter().map(|v| resolve_const_arg(state, scope, v)));

    if let Some(cached) = state.generics.cached_instantiation(symbol_id, &resolved_args) {
        return cached;
    }
    let mut bindings = FxHashMap::default();
    for (pname, arg) in symbol.type_params.iter().zip(resolved_args.iter()) {
        bindings.insert(*pname, *arg);
    }
    enforce_bounds(state, symbol_id, &bindings, Span::dummy());
    let instance = substitute(state.interner, symbol_id, &bindings, symbol.ty);
    state.generics.memoize_instantiation(symbol_id, resolved_args, instance);
    instance
}

fn builtin_type(state: &CheckerState<'_>, name: &str) -> Option<TypeId> {
    let b = state.interner.builtins();
    match name {
        "bool" => Some(b.bool_),
        "int" => Some(b.int_),
        "uint" => Some(b.uint_),
        "float" => Some(b.float_),
        "string" => Some(b.string_),
        "nothing" => Some(b.nothing_),
        _ => None,
    }
}
