//! Item/Statement Walker (§4.F): the entry point that drives the Expression
//! Typer over every function body, resolves parameter and return types,
//! validates contract bounds on declared type parameters, and triggers the
//! file-wide checks that only make sense once every item has been seen
//! (lock-order cycle detection).
//!
//! Follows `expr.rs`'s convention of plain functions over `&mut
//! CheckerState` rather than a dedicated walker struct.

use rustc_hash::{FxHashMap, FxHashSet};
use semacore_ast::{Attr, NodeKind, Param, TypeNode, TypeNodeId, TypeParamDecl};
use semacore_common::{Code, ExprId, ScopeId, Span, StringId, SymbolId, TypeId};
use semacore_concurrency::LockState;

use crate::context::CheckerState;
use crate::contracts::{validate_bounds, BoundIssue, ContractMethodSig, ContractShape};
use crate::expr::{type_expr, validate_attrs};
use crate::types::resolve_type_node;

/// Walk every top-level item, then run the checks that depend on having
/// seen the whole file.
pub fn walk_file(state: &mut CheckerState<'_>, module_scope: ScopeId) {
    let items = state.builder.items().to_vec();
    let mut contracts = FxHashSet::default();
    collect_contracts(state, &items, &mut contracts);

    let mut shapes = FxHashMap::default();
    collect_generics_info(state, module_scope, &items, &contracts, &mut shapes);
    state.contract_shapes = shapes;

    state.push_scope(module_scope);
    walk_items(state, module_scope, &items, &contracts);
    state.pop_scope(Span::dummy());

    report_deadlocks(state);
}

/// Contract symbols are `SymbolKind::Type` like any other declared type, so
/// bound validation (`T: A + B`) needs to know which ones are actually
/// contracts ahead of time; collected in one pass over the whole item tree
/// (including nested modules) before any item is walked.
fn collect_contracts(state: &CheckerState<'_>, items: &[ExprId], out: &mut FxHashSet<SymbolId>) {
    for &item in items {
        match state.builder.kind(item) {
            NodeKind::ContractItem { symbol, .. } => {
                out.insert(*symbol);
            }
            NodeKind::ModuleItem { items: nested, .. } => collect_contracts(state, nested, out),
            _ => {}
        }
    }
}

/// Resolves every declared contract's field/method shape and records the
/// contract bounds attached to every other item's type parameters, so
/// generic instantiation (§4.G/§4.H) can check bound satisfaction
/// regardless of whether the bound contract or the instantiating call site
/// is declared first in the file.
fn collect_generics_info(
    state: &mut CheckerState<'_>,
    scope: ScopeId,
    items: &[ExprId],
    contracts: &FxHashSet<SymbolId>,
    shapes: &mut FxHashMap<SymbolId, ContractShape>,
) {
    for &item in items {
        match state.builder.kind(item).clone() {
            NodeKind::FunctionItem { symbol, type_params, .. }
            | NodeKind::StructItem { symbol, type_params, .. }
            | NodeKind::AliasItem { symbol, type_params, .. }
            | NodeKind::UnionItem { symbol, type_params, .. } => {
                record_generics(state, scope, symbol, &type_params, contracts);
            }
            NodeKind::ContractItem { symbol, fields, methods, type_params } => {
                record_generics(state, scope, symbol, &type_params, contracts);
                let resolved_fields: Vec<(StringId, TypeId)> =
                    fields.iter().map(|(n, t)| (*n, resolve_type_node(state, scope, *t))).collect();
                let resolved_methods: Vec<ContractMethodSig> = methods
                    .iter()
                    .map(|m| ContractMethodSig {
                        name: m.name,
                        params: m.params.iter().map(|p| resolve_type_node(state, scope, *p)).collect(),
                        result: resolve_type_node(state, scope, m.result),
                        is_overload_group: m.is_overload_group,
                    })
                    .collect();
                let type_param_names: Vec<StringId> = type_params.iter().map(|tp| tp.name).collect();
                shapes.insert(symbol, ContractShape { symbol, type_params: type_param_names, fields: resolved_fields, methods: resolved_methods });
            }
            NodeKind::ModuleItem { items: nested, .. } => {
                let module_scope = state.symbols.item_scope(item).unwrap_or(scope);
                collect_generics_info(state, module_scope, &nested, contracts, shapes);
            }
            _ => {}
        }
    }
}

/// Populates `owner`'s `type_param_symbols` (§4.H: bounds attached to a
/// type-parameter symbol expose the contract's field set to the generic
/// body) and `state.type_param_bounds` with every contract bound actually
/// resolving to a declared contract.
fn record_generics(state: &mut CheckerState<'_>, scope: ScopeId, owner: SymbolId, type_params: &[TypeParamDecl], contracts: &FxHashSet<SymbolId>) {
    if owner.is_none() {
        return;
    }
    for tp in type_params {
        if let Some(tp_symbol) = state.symbols.lookup(scope, tp.name) {
            let symbols = &mut state.symbols.symbol_mut(owner).type_param_symbols;
            if !symbols.contains(&tp_symbol) {
                symbols.push(tp_symbol);
            }
        }
        for &bound in &tp.bounds {
            let (contract_symbol, args) = bound_symbol_and_args(state, scope, bound);
            if !contracts.contains(&contract_symbol) {
                continue;
            }
            let entry = state.type_param_bounds.entry((owner, tp.name)).or_default();
            if !entry.iter().any(|(s, _)| *s == contract_symbol) {
                entry.push((contract_symbol, args));
            }
        }
    }
}

fn bound_symbol_and_args(state: &mut CheckerState<'_>, scope: ScopeId, bound: TypeNodeId) -> (SymbolId, Vec<TypeId>) {
    match state.builder.type_node(bound).clone() {
        TypeNode::Named { name, type_args, .. } => {
            let symbol = state.symbols.lookup(scope, name).unwrap_or(SymbolId::NONE);
            let args = type_args.iter().map(|t| resolve_type_node(state, scope, *t)).collect();
            (symbol, args)
        }
        _ => (SymbolId::NONE, Vec::new()),
    }
}

fn walk_items(state: &mut CheckerState<'_>, scope: ScopeId, items: &[ExprId], contracts: &FxHashSet<SymbolId>) {
    for &item in items {
        if state.is_cancelled() {
            return;
        }
        walk_item(state, scope, item, contracts);
    }
}

fn walk_item(state: &mut CheckerState<'_>, scope: ScopeId, item: ExprId, contracts: &FxHashSet<SymbolId>) {
    let span = state.builder.span(item);
    match state.builder.kind(item).clone() {
        NodeKind::FunctionItem { symbol, params, ret, type_params, body, is_async, is_entrypoint, attrs } => {
            validate_type_param_bounds(state, scope, &type_params, contracts, "function", span);
            if is_entrypoint && !type_params.is_empty() {
                let n = state.symbol_name_str(symbol).to_string();
                state.emit(Code::SemaEntrypointGeneric, format!("entrypoint function '{n}' cannot declare generic type parameters"), span);
            }
            walk_function(state, scope, item, symbol, &params, ret, body, is_async, is_entrypoint, &attrs, span);
        }
        NodeKind::StructItem { fields, type_params, .. } => {
            validate_type_param_bounds(state, scope, &type_params, contracts, "struct", span);
            for (_, field_ty) in &fields {
                resolve_type_node(state, scope, *field_ty);
            }
        }
        NodeKind::AliasItem { target, type_params, .. } => {
            validate_type_param_bounds(state, scope, &type_params, contracts, "alias", span);
            resolve_type_node(state, scope, target);
        }
        NodeKind::UnionItem { members, type_params, .. } => {
            validate_type_param_bounds(state, scope, &type_params, contracts, "union", span);
            for (_, args) in &members {
                for arg in args {
                    resolve_type_node(state, scope, *arg);
                }
            }
        }
        NodeKind::ContractItem { methods, type_params, .. } => {
            validate_type_param_bounds(state, scope, &type_params, contracts, "contract", span);
            for method in &methods {
                for p in &method.params {
                    resolve_type_node(state, scope, *p);
                }
                resolve_type_node(state, scope, method.result);
            }
        }
        NodeKind::ModuleItem { symbol: _, items } => {
            let module_scope = state.symbols.item_scope(item).unwrap_or(scope);
            state.push_scope(module_scope);
            walk_items(state, module_scope, &items, contracts);
            state.pop_scope(span);
        }
        NodeKind::ConstStmt { .. } => {
            type_expr(state, scope, item);
        }
        NodeKind::ExternItem { .. } | NodeKind::ImportItem { .. } => {}
        _ => {}
    }
}

fn validate_type_param_bounds(
    state: &mut CheckerState<'_>,
    scope: ScopeId,
    type_params: &[TypeParamDecl],
    contracts: &FxHashSet<SymbolId>,
    context: &str,
    span: Span,
) {
    for tp in type_params {
        if let Some(ct) = tp.const_type {
            resolve_type_node(state, scope, ct);
        }
        let bound_symbols: Vec<SymbolId> = tp.bounds.iter().map(|b| bound_symbol(state, scope, *b)).collect();
        for issue in validate_bounds(state.symbols, &bound_symbols, |s| contracts.contains(&s)) {
            match issue {
                BoundIssue::Duplicate(s) => {
                    let n = state.symbol_name_str(s).to_string();
                    state.emit(Code::SemaContractBoundDuplicate, format!("duplicate contract bound '{n}' on {context}"), span);
                }
                BoundIssue::NotFound => {
                    state.emit(Code::SemaContractBoundNotFound, format!("unresolved contract bound on {context}"), span);
                }
                BoundIssue::NotContract(s) => {
                    let n = state.symbol_name_str(s).to_string();
                    state.emit(Code::SemaContractBoundNotContract, format!("'{n}' is not a contract, used as a bound on {context}"), span);
                }
            }
        }
    }
}

fn bound_symbol(state: &CheckerState<'_>, scope: ScopeId, bound: TypeNodeId) -> SymbolId {
    match state.builder.type_node(bound) {
        TypeNode::Named { name, .. } => state.symbols.lookup(scope, *name).unwrap_or(SymbolId::NONE),
        _ => SymbolId::NONE,
    }
}

#[allow(clippy::too_many_arguments)]
fn walk_function(
    state: &mut CheckerState<'_>,
    outer_scope: ScopeId,
    item: ExprId,
    symbol: SymbolId,
    params: &[Param],
    ret: Option<TypeNodeId>,
    body: Option<ExprId>,
    is_async: bool,
    is_entrypoint: bool,
    attrs: &[Attr],
    span: Span,
) {
    validate_attrs(state, attrs, "function", span);
    let fn_scope = state.symbols.item_scope(item).unwrap_or(outer_scope);
    let is_nonblocking = attrs.iter().any(|a| state.resolver.resolve(a.name) == "nonblocking");

    for param in params {
        let ty = match param.ty {
            Some(t) => resolve_type_node(state, fn_scope, t),
            None => state.error_type(),
        };
        state.symbols.symbol_mut(param.symbol).ty = ty;
        state.result.set_binding_type(param.symbol, ty);
    }
    let ret_ty = match ret {
        Some(t) => resolve_type_node(state, fn_scope, t),
        None => state.interner.builtins().unit_,
    };

    let Some(body) = body else { return };

    state.push_scope(fn_scope);
    if is_async {
        state.enter_async();
    }
    state.in_entrypoint = is_entrypoint;
    state.in_nonblocking = is_nonblocking;
    state.push_return_context(ret_ty, span);
    state.lock_state = LockState::new();

    type_expr(state, fn_scope, body);

    let unit_ = state.interner.builtins().unit_;
    if let Some(ctx) = state.pop_return_context() {
        if ctx.expected != unit_ && !ctx.terminal_return_seen {
            let n = state.symbol_name_str(symbol).to_string();
            state.emit(Code::SemaMissingReturn, format!("function '{n}' does not return a value on every path"), span);
        }
    }

    report_unreleased_locks(state, attrs, span);

    state.in_entrypoint = false;
    state.in_nonblocking = false;
    if is_async {
        state.exit_async();
    }
    state.pop_scope(span);
}

/// Locks still held when a function body finishes are only acceptable if
/// the function is declared `@acquires_lock("name")` for that exact lock
/// (a constructor-shaped function handing ownership of an already-locked
/// value to its caller); anything else is `LockNotReleasedOnExit`.
fn report_unreleased_locks(state: &mut CheckerState<'_>, attrs: &[Attr], span: Span) {
    let declared: Vec<String> = attrs
        .iter()
        .filter(|a| state.resolver.resolve(a.name) == "acquires_lock")
        .filter_map(Attr::first_str_arg)
        .map(|s| state.resolver.resolve(s).to_string())
        .collect();

    for key in state.lock_state.still_held() {
        let held_name = match key.field_name {
            Some(f) => state.resolver.resolve(f).to_string(),
            None => state.symbol_name_str(key.base).to_string(),
        };
        if !declared.contains(&held_name) {
            state.emit(Code::SemaLockNotReleasedOnExit, format!("lock '{held_name}' is still held when the function returns"), span);
        }
    }
}

fn report_deadlocks(state: &mut CheckerState<'_>) {
    let cycles = state.lock_graph.detect_cycles();
    for cycle in cycles {
        let names: Vec<String> = cycle
            .chain
            .iter()
            .map(|id| {
                let type_name = state.resolver.resolve(id.type_name).to_string();
                match id.field_name {
                    Some(f) => format!("{type_name}.{}", state.resolver.resolve(f)),
                    None => type_name,
                }
            })
            .collect();
        state.emit(Code::SemaLockPotentialDeadlock, format!("potential deadlock: {}", names.join(" -> ")), cycle.span);
    }
}
