//! Expression Typer (§4.E): type inference and checking over the flat node
//! arena, plus the statement forms that share it (§4.F walker calls
//! straight into `type_expr` for a function body's top-level `Block`).
//!
//! Follows `types.rs`'s convention of plain functions over `&mut
//! CheckerState` rather than a wrapper struct — there is only ever one
//! `CheckerState` per file-check, so a wrapper buys nothing.

use rustc_hash::FxHashMap;
use semacore_ast::{BinaryOp, NodeKind, SymbolFlags, SymbolKind, TypeNodeId, UnaryOp};
use semacore_borrow::{is_resize_method, BorrowKind, Issue, Place};
use semacore_common::{Code, ExprId, ScopeId, Span, StringId, SymbolId, TypeId};
use semacore_concurrency::{AcquireOutcome, LockIdentity, LockKey, LockKind, LockState, Resolution as TaskResolution};
use semacore_types::{
    canonical_key, is_primitive_hashable, numeric_kind, widening_join, ArrayLen, NumericKind, TypeInterner, TypeTerm,
    UnionMember,
};

use crate::context::CheckerState;
use crate::contracts::enforce_bounds;
use crate::conversion::{is_defaultable, receiver_name_of, resolve_implicit_to, unify_branches, widens, ToOutcome};
use crate::generics::{substitute, unify};
use crate::magic_index::{resolve_overload_named, Resolution as MagicResolution};
use crate::types::resolve_type_node;

/// Type (and cache) one node. Statements share the arena with expressions
/// (§3) and are typed here too, always to `unit` (§3: "every visited ExprID
/// gets an ExprTypes entry").
pub fn type_expr(state: &mut CheckerState<'_>, scope: ScopeId, expr: ExprId) -> TypeId {
    if let Some(cached) = state.result.expr_type(expr) {
        return cached;
    }
    let ty = type_expr_uncached(state, scope, expr);
    state.set_expr_type(expr, ty)
}

fn type_expr_uncached(state: &mut CheckerState<'_>, scope: ScopeId, expr: ExprId) -> TypeId {
    let span = state.builder.span(expr);
    let kind = state.builder.kind(expr).clone();
    let b = state.interner.builtins();

    match kind {
        NodeKind::LiteralInt(_) => b.int_,
        NodeKind::LiteralUint(_) => b.uint_,
        NodeKind::LiteralFloat(_) => b.float_,
        NodeKind::LiteralString(_) => b.string_,
        NodeKind::LiteralBool(_) => b.bool_,
        NodeKind::LiteralNothing => b.nothing_,

        NodeKind::Identifier(_) => type_identifier(state, expr, span),
        NodeKind::Group(inner) => type_expr(state, scope, inner),
        NodeKind::Unary { op, operand } => type_unary(state, scope, op, operand, expr, span),
        NodeKind::Binary { op, left, right } => type_binary(state, scope, op, left, right, expr, span),
        NodeKind::Ternary { cond, then_branch, else_branch } => {
            type_ternary(state, scope, cond, then_branch, else_branch, span)
        }
        NodeKind::Call { callee, args, explicit_type_args } => {
            type_call(state, scope, callee, &args, &explicit_type_args, span)
        }
        NodeKind::ArrayLiteral(elems) => type_array_literal(state, scope, &elems, span),
        NodeKind::MapLiteral(pairs) => type_map_literal(state, scope, &pairs, span),
        NodeKind::RangeLiteral { start, end } => type_range_literal(state, scope, start, end, span),
        NodeKind::TupleLiteral(elems) => {
            let tys: Vec<TypeId> = elems.iter().map(|e| type_expr(state, scope, *e)).collect();
            state.interner.register_tuple(tys)
        }
        NodeKind::Index { base, index } => type_index(state, scope, base, index, expr, span),
        NodeKind::Member { base, name } => type_member(state, scope, base, name, span),
        NodeKind::TupleIndex { base, index } => type_tuple_index(state, scope, base, index, span),
        NodeKind::Cast { base, target } => type_cast(state, scope, base, target, span),
        NodeKind::Compare { subject, arms } => type_compare(state, scope, subject, &arms, span),
        NodeKind::Select { arms, default, .. } => type_select(state, scope, &arms, default, span),
        NodeKind::AsyncBlock { body } => type_async_block(state, scope, body),
        NodeKind::BlockingBlock { body } => {
            if state.in_nonblocking && state.options.enforce_nonblocking {
                state.emit(
                    Code::SemaNonblockingViolation,
                    "cannot call blocking operation 'blocking { .. }' from a '@nonblocking' function",
                    span,
                );
            }
            type_expr(state, scope, body)
        }
        NodeKind::Spawn { body, is_local } => type_spawn(state, scope, body, is_local, expr, span),
        NodeKind::StructLiteral { ty, fields } => type_struct_literal(state, scope, ty, &fields, span),
        NodeKind::Block { stmts, tail } => type_block(state, scope, &stmts, tail, expr, span),
        NodeKind::TypeNodeExpr(tn) => {
            let _ = resolve_type_node(state, scope, tn);
            state.emit(Code::SemaTypeCannotBeUsedAsValue, "a type cannot be used as a value here", span);
            state.error_type()
        }

        NodeKind::LetStmt { symbol, ty, init, attrs } => type_let(state, scope, symbol, ty, init, &attrs, span),
        NodeKind::ConstStmt { symbol, ty, init, .. } => type_const_stmt(state, scope, symbol, ty, init, span),
        NodeKind::ExprStmt(e) => {
            type_expr(state, scope, e);
            b.unit_
        }
        NodeKind::ReturnStmt(value) => type_return(state, scope, value, span),
        NodeKind::DropStmt(e) => {
            type_expr(state, scope, e);
            if let Some((place, _)) = place_and_type(state, scope, e) {
                if let Issue::Conflict(_) = state.borrows.move_allowed(&place, span) {
                    emit_move_conflict(state, &place, span);
                }
            }
            b.unit_
        }
        NodeKind::IfStmt { cond, then_branch, else_branch } => type_if(state, scope, cond, then_branch, else_branch, span),
        NodeKind::WhileStmt { cond, body } => type_while(state, scope, cond, body, span),
        NodeKind::ForStmt { init, cond, step, body } => type_for(state, scope, init, cond, step, body, span),
        NodeKind::ForInStmt { binding, iterable, body } => type_for_in(state, scope, binding, iterable, body, span),

        // Items are walked directly by the Walker (§4.F), never typed as expressions.
        NodeKind::FunctionItem { .. }
        | NodeKind::StructItem { .. }
        | NodeKind::AliasItem { .. }
        | NodeKind::UnionItem { .. }
        | NodeKind::ContractItem { .. }
        | NodeKind::ExternItem { .. }
        | NodeKind::ModuleItem { .. }
        | NodeKind::ImportItem { .. } => b.unit_,
    }
}

fn check_bool(state: &mut CheckerState<'_>, ty: TypeId, what: &str, span: Span) {
    let bool_ = state.interner.builtins().bool_;
    if ty != bool_ && ty != state.error_type() {
        state.emit(Code::SemaTypeMismatch, format!("{what} must be 'bool'"), span);
    }
}

fn is_literal_node(state: &CheckerState<'_>, expr: ExprId) -> bool {
    matches!(
        state.builder.kind(expr),
        NodeKind::LiteralInt(_) | NodeKind::LiteralUint(_) | NodeKind::LiteralFloat(_)
    )
}

fn emit_move_conflict(state: &mut CheckerState<'_>, place: &Place, span: Span) {
    let name = state.symbol_name_str(place.base).to_string();
    state.emit(Code::SemaBorrowMove, format!("cannot move '{name}' because it is borrowed"), span);
}

/// The `StringId`s the Magic Index might have this type's methods filed
/// under. Arrays and fixed arrays share the same method set (§4.C "array
/// shapes collapse for receiver lookup"), but this crate can't turn that
/// collapsed *string* key back into a `StringId` (no reverse interning, see
/// `conversion::WellKnownNames`), so both nominal names are offered as
/// candidates to `resolve_overload`'s existing multi-receiver search instead.
fn receiver_candidates(state: &CheckerState<'_>, ty: TypeId) -> Vec<StringId> {
    let resolved = state.interner.resolve_alias(ty);
    match state.interner.lookup(resolved) {
        // Array literals and `[T]`/`[T; N]` annotations intern to the
        // structural `Array` term, never the nominal struct form;
        // `Array`'s and `ArrayFixed`'s methods are filed under both names
        // (receiver_key() collapses both shapes to "[]" for exactly this
        // reason), so both are offered as candidates in order.
        TypeTerm::Array { .. } => vec![state.names.array, state.names.array_fixed],
        TypeTerm::Struct { name, .. } if *name == state.names.array || *name == state.names.array_fixed => {
            vec![state.names.array, state.names.array_fixed]
        }
        _ => receiver_name_of(state.interner, resolved).into_iter().collect(),
    }
}

/// Whether `base` is an array view, either directly (a range-indexed
/// expression) or through a binding that was initialized from one (§4.I).
fn is_view_expr_or_binding(state: &CheckerState<'_>, base: ExprId) -> bool {
    state.views.is_view_expr(base)
        || state.symbols.node_symbol(base).is_some_and(|s| state.views.is_view_binding(s))
}

fn fn_ret_type(state: &CheckerState<'_>, symbol: SymbolId) -> TypeId {
    let ty = state.interner.resolve_alias(state.symbols.symbol(symbol).ty);
    match state.interner.lookup(ty) {
        TypeTerm::Fn { ret, .. } => *ret,
        _ => state.error_type(),
    }
}

// ---- Identifiers & places ----------------------------------------------

fn type_identifier(state: &mut CheckerState<'_>, expr: ExprId, span: Span) -> TypeId {
    let Some(symbol_id) = state.symbols.node_symbol(expr) else {
        state.emit(Code::SemaTypeMismatch, "unresolved identifier", span);
        return state.error_type();
    };
    let symbol = state.symbols.symbol(symbol_id).clone();
    match symbol.kind {
        SymbolKind::Type => {
            let name = state.symbol_name_str(symbol_id).to_string();
            state.emit(Code::SemaTypeCannotBeUsedAsValue, format!("type '{name}' cannot be used as a value"), span);
            state.error_type()
        }
        SymbolKind::Function | SymbolKind::Tag | SymbolKind::Module | SymbolKind::Import => symbol.ty,
        SymbolKind::Let | SymbolKind::Param => {
            if !state.interner.is_copy_primitive(symbol.ty) && !symbol.is_copy() {
                let place = Place::root(symbol_id);
                if let Issue::Conflict(_) = state.borrows.move_allowed(&place, span) {
                    emit_move_conflict(state, &place, span);
                }
            }
            symbol.ty
        }
        SymbolKind::Const => {
            // A forward-referenced `const` hasn't been walked yet
            // (`symbol.ty` is still `TypeId::NONE`); evaluate its
            // declaration site lazily so `begin_const_eval`'s re-entrancy
            // check can catch a cycle through this read.
            if symbol.ty == TypeId::NONE {
                type_expr(state, symbol.scope, symbol.decl_site);
            }
            let ty = state.symbols.symbol(symbol_id).ty;
            if ty == TypeId::NONE {
                state.error_type()
            } else {
                ty
            }
        }
    }
}

fn field_type(state: &mut CheckerState<'_>, base_ty: TypeId, name: StringId) -> Option<TypeId> {
    let resolved = state.interner.resolve_alias(base_ty);
    if let Some(ty) = state.interner.struct_info(resolved).and_then(|info| info.fields.iter().find(|(n, _)| *n == name).map(|(_, t)| *t)) {
        return Some(ty);
    }
    match state.interner.lookup(resolved).clone() {
        TypeTerm::GenericParam { name: param_name, owner, .. } => contract_bound_field_type(state, owner, param_name, name),
        _ => None,
    }
}

/// A field access on a generic parameter (`e.msg` for `fn f<E: ErrorLike>(e:
/// E)`) is legal when one of `E`'s declared contract bounds has a matching
/// field (§4.H). Checks bounds in declaration order and returns the first
/// match, substituting the bound contract's own type parameters with the
/// concrete arguments it was declared with.
fn contract_bound_field_type(state: &mut CheckerState<'_>, owner: SymbolId, param_name: StringId, field_name: StringId) -> Option<TypeId> {
    let bounds = state.type_param_bounds.get(&(owner, param_name))?.clone();
    for (contract_symbol, args) in bounds {
        let Some(shape) = state.contract_shapes.get(&contract_symbol).cloned() else { continue };
        let Some((_, field_ty)) = shape.fields.iter().find(|(n, _)| *n == field_name) else { continue };
        let mut bindings = FxHashMap::default();
        for (tp, arg) in shape.type_params.iter().zip(args.iter()) {
            bindings.insert(*tp, *arg);
        }
        return Some(substitute(state.interner, contract_symbol, &bindings, *field_ty));
    }
    None
}

fn array_elem_type(state: &CheckerState<'_>, base_ty: TypeId) -> Option<TypeId> {
    let resolved = state.interner.resolve_alias(base_ty);
    match state.interner.lookup(resolved) {
        TypeTerm::Array { elem, .. } => Some(*elem),
        TypeTerm::Struct { type_args, .. } if !type_args.is_empty() => Some(type_args[0]),
        _ => None,
    }
}

fn deref_elem_type(state: &CheckerState<'_>, base_ty: TypeId) -> Option<TypeId> {
    let resolved = state.interner.resolve_alias(base_ty);
    match state.interner.lookup(resolved) {
        TypeTerm::Reference { elem, .. } | TypeTerm::Pointer { elem } | TypeTerm::Own { elem } => Some(*elem),
        _ => None,
    }
}

/// Derive an lvalue `Place` plus its current type, without the
/// Identifier-read move check `type_expr` applies (used for assignment
/// targets, `&`/`&mut`/`own` operands, and lock-call receivers).
fn place_and_type(state: &mut CheckerState<'_>, scope: ScopeId, expr: ExprId) -> Option<(Place, TypeId)> {
    match state.builder.kind(expr).clone() {
        NodeKind::Identifier(_) => {
            let symbol_id = state.symbols.node_symbol(expr)?;
            let ty = state.symbols.symbol(symbol_id).ty;
            Some((Place::root(symbol_id), ty))
        }
        NodeKind::Group(inner) => place_and_type(state, scope, inner),
        NodeKind::Member { base, name } => {
            let (base_place, base_ty) = place_and_type(state, scope, base)?;
            let field_ty = field_type(state, base_ty, name).unwrap_or_else(|| state.error_type());
            Some((base_place.field(name), field_ty))
        }
        NodeKind::TupleIndex { base, index } => {
            let (base_place, base_ty) = place_and_type(state, scope, base)?;
            let resolved = state.interner.resolve_alias(base_ty);
            let elem_ty = state
                .interner
                .tuple_info(resolved)
                .and_then(|elems| elems.get(index as usize).copied())
                .unwrap_or_else(|| state.error_type());
            Some((base_place.tuple_index(index), elem_ty))
        }
        NodeKind::Index { base, index } => {
            let (base_place, base_ty) = place_and_type(state, scope, base)?;
            type_expr(state, scope, index);
            let elem_ty = array_elem_type(state, base_ty).unwrap_or_else(|| state.error_type());
            Some((base_place.indexed(), elem_ty))
        }
        NodeKind::Unary { op: UnaryOp::Deref, operand } => {
            let (base_place, base_ty) = place_and_type(state, scope, operand)?;
            let elem = deref_elem_type(state, base_ty).unwrap_or_else(|| state.error_type());
            Some((base_place.deref(), elem))
        }
        _ => None,
    }
}

// ---- Unary ---------------------------------------------------------------

fn type_unary(state: &mut CheckerState<'_>, scope: ScopeId, op: UnaryOp, operand: ExprId, expr: ExprId, span: Span) -> TypeId {
    match op {
        UnaryOp::Ref | UnaryOp::RefMut => {
            let Some((place, elem_ty)) = place_and_type(state, scope, operand) else {
                state.emit(Code::SemaTypeMismatch, "expected a place to borrow", span);
                return state.error_type();
            };
            let mutable = op == UnaryOp::RefMut;
            let base_mutable = state.symbols.symbol(place.base).is_mutable();
            let kind = if mutable { BorrowKind::Mut } else { BorrowKind::Shared };
            let Some(current_scope) = state.current_scope() else { return state.error_type() };
            let (borrow_id, issue) = state.borrows.begin_borrow(kind, place.clone(), current_scope, span, base_mutable);
            match issue {
                Issue::Conflict(_) => {
                    let name = state.symbol_name_str(place.base).to_string();
                    state.emit(Code::SemaBorrowConflict, format!("cannot borrow '{name}' because it is already borrowed"), span);
                }
                Issue::BaseNotMutable => {
                    let name = state.symbol_name_str(place.base).to_string();
                    state.emit(Code::SemaBorrowMutation, format!("cannot borrow '{name}' as mutable: not declared mutable"), span);
                }
                Issue::Ok => {}
            }
            state.result.expr_borrows.insert(expr, borrow_id);
            state.interner.reference(elem_ty, mutable)
        }
        UnaryOp::Deref => {
            let ty = type_expr(state, scope, operand);
            deref_elem_type(state, ty).unwrap_or_else(|| {
                state.emit(Code::SemaTypeMismatch, "cannot dereference this type", span);
                state.error_type()
            })
        }
        UnaryOp::Neg | UnaryOp::Pos => {
            let ty = type_expr(state, scope, operand);
            if numeric_kind(state.interner, ty).is_some() {
                ty
            } else {
                state.emit(Code::SemaTypeMismatch, "expected a numeric operand", span);
                state.error_type()
            }
        }
        UnaryOp::Not => {
            let ty = type_expr(state, scope, operand);
            check_bool(state, ty, "'not' operand", span);
            state.interner.builtins().bool_
        }
        UnaryOp::Own => {
            let Some((place, elem_ty)) = place_and_type(state, scope, operand) else {
                state.emit(Code::SemaTypeMismatch, "expected a place to own", span);
                return state.error_type();
            };
            if let Issue::Conflict(_) = state.borrows.move_allowed(&place, span) {
                emit_move_conflict(state, &place, span);
            }
            state.interner.own(elem_ty)
        }
        UnaryOp::Await => {
            if !state.in_async_context() {
                state.emit(Code::SemaIntrinsicBadContext, "'await' is not valid outside an async context", span);
            }
            let ty = type_expr(state, scope, operand);
            let resolved = state.interner.resolve_alias(ty);
            let payload = match state.interner.lookup(resolved) {
                TypeTerm::Struct { name, type_args, .. } if *name == state.names.task && !type_args.is_empty() => {
                    Some(type_args[0])
                }
                _ => None,
            };
            state.concurrency.resolve(operand, TaskResolution::Awaited);
            payload.unwrap_or_else(|| {
                state.emit(Code::SemaTypeMismatch, "'await' requires a 'Task' operand", span);
                state.error_type()
            })
        }
    }
}

// ---- Binary ---------------------------------------------------------------

fn type_binary(
    state: &mut CheckerState<'_>,
    scope: ScopeId,
    op: BinaryOp,
    left: ExprId,
    right: ExprId,
    expr: ExprId,
    span: Span,
) -> TypeId {
    if op == BinaryOp::Assign || op.is_compound_assign() {
        return type_assign(state, scope, op, left, right, span);
    }
    match op {
        BinaryOp::And | BinaryOp::Or => {
            let lt = type_expr(state, scope, left);
            let rt = type_expr(state, scope, right);
            check_bool(state, lt, "logical operand", span);
            check_bool(state, rt, "logical operand", span);
            state.interner.builtins().bool_
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
            let lt = type_expr(state, scope, left);
            let rt = type_expr(state, scope, right);
            let ok = matches!(numeric_kind(state.interner, lt), Some(NumericKind::Int) | Some(NumericKind::Uint)) && lt == rt;
            if ok {
                lt
            } else {
                state.emit(Code::SemaTypeMismatch, "bitwise operator requires matching integer operands", span);
                state.error_type()
            }
        }
        BinaryOp::Is => type_is(state, scope, left, right, expr, span),
        BinaryOp::Heir => type_heir(state, scope, left, right, expr, span),
        BinaryOp::Eq | BinaryOp::Ne => type_equality(state, scope, left, right, span),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => type_ordering(state, scope, op, left, right, span),
        _ => type_arithmetic(state, scope, op, left, right, span),
    }
}

fn type_arithmetic(state: &mut CheckerState<'_>, scope: ScopeId, op: BinaryOp, left: ExprId, right: ExprId, span: Span) -> TypeId {
    let lt = type_expr(state, scope, left);
    let rt = type_expr(state, scope, right);

    if let (Some(lk), Some(rk)) = (numeric_kind(state.interner, lt), numeric_kind(state.interner, rt)) {
        if lt == rt {
            return lt;
        }
        if is_literal_node(state, left) && widens(state.interner, lt, rt, true) {
            return rt;
        }
        if is_literal_node(state, right) && widens(state.interner, rt, lt, true) {
            return lt;
        }
        return match widening_join(lk, rk) {
            Some(joined) if joined == lk => lt,
            Some(_) => rt,
            None => {
                state.emit(Code::SemaTypeMismatch, "mismatched numeric operand types", span);
                state.error_type()
            }
        };
    }

    let Some(name) = op.magic_name() else {
        state.emit(Code::SemaTypeMismatch, "operator is not overloadable", span);
        return state.error_type();
    };
    dispatch_magic_binary(state, lt, rt, name, span)
}

fn type_equality(state: &mut CheckerState<'_>, scope: ScopeId, left: ExprId, right: ExprId, span: Span) -> TypeId {
    let lt = type_expr(state, scope, left);
    let rt = type_expr(state, scope, right);
    let bool_ = state.interner.builtins().bool_;
    if lt == rt && (state.interner.lookup(lt).is_primitive() || is_primitive_hashable(state.interner, lt)) {
        return bool_;
    }
    if numeric_kind(state.interner, lt).is_some() && numeric_kind(state.interner, rt).is_some() {
        return bool_;
    }
    let result = dispatch_magic_binary(state, lt, rt, "__eq", span);
    if result == state.error_type() { result } else { bool_ }
}

fn type_ordering(state: &mut CheckerState<'_>, scope: ScopeId, op: BinaryOp, left: ExprId, right: ExprId, span: Span) -> TypeId {
    let lt = type_expr(state, scope, left);
    let rt = type_expr(state, scope, right);
    let bool_ = state.interner.builtins().bool_;
    if lt == rt && (numeric_kind(state.interner, lt).is_some() || lt == state.interner.builtins().string_) {
        return bool_;
    }
    let name = op.magic_name().unwrap_or("__lt");
    let result = dispatch_magic_binary(state, lt, rt, name, span);
    if result == state.error_type() { result } else { bool_ }
}

fn dispatch_magic_binary(state: &mut CheckerState<'_>, lt: TypeId, rt: TypeId, name: &str, span: Span) -> TypeId {
    let receivers = receiver_candidates(state, lt);
    if receivers.is_empty() {
        state.emit(Code::SemaNoOverload, format!("no matching overload for '{name}'"), span);
        return state.error_type();
    }
    let arg_key = canonical_key(state.interner, state.resolver, rt);
    match resolve_overload_named(&state.magic_index, state.resolver, &receivers, name, &[arg_key]) {
        MagicResolution::Found(symbol) => fn_ret_type(state, symbol),
        MagicResolution::Ambiguous(_) => {
            state.emit(Code::SemaAmbiguousOverload, format!("ambiguous overload for '{name}'"), span);
            state.error_type()
        }
        MagicResolution::NoMatch => {
            state.emit(Code::SemaNoOverload, format!("no matching overload for '{name}'"), span);
            state.error_type()
        }
    }
}

fn resolve_type_operand(state: &mut CheckerState<'_>, scope: ScopeId, expr: ExprId, span: Span) -> TypeId {
    match state.builder.kind(expr).clone() {
        NodeKind::TypeNodeExpr(tn) => resolve_type_node(state, scope, tn),
        NodeKind::Identifier(_) => {
            let Some(symbol_id) = state.symbols.node_symbol(expr) else {
                state.emit(Code::SemaExpectTypeOperand, "expected a type here", span);
                return state.error_type();
            };
            let symbol = state.symbols.symbol(symbol_id);
            match symbol.kind {
                SymbolKind::Type | SymbolKind::Tag => symbol.ty,
                _ => {
                    state.emit(Code::SemaExpectTypeOperand, "expected a type here, found a value", span);
                    state.error_type()
                }
            }
        }
        _ => {
            state.emit(Code::SemaExpectTypeOperand, "expected a type here, found a value", span);
            state.error_type()
        }
    }
}

fn type_is(state: &mut CheckerState<'_>, scope: ScopeId, left: ExprId, right: ExprId, expr: ExprId, span: Span) -> TypeId {
    type_expr(state, scope, left);
    let test_ty = resolve_type_operand(state, scope, right, span);
    state.result.is_operands.insert(expr, test_ty);
    state.interner.builtins().bool_
}

fn type_heir(state: &mut CheckerState<'_>, scope: ScopeId, left: ExprId, right: ExprId, expr: ExprId, span: Span) -> TypeId {
    let lt = resolve_type_operand(state, scope, left, span);
    let rt = resolve_type_operand(state, scope, right, span);
    state.result.heir_operands.insert(expr, (lt, rt));
    state.interner.builtins().bool_
}

fn type_assign(state: &mut CheckerState<'_>, scope: ScopeId, op: BinaryOp, left: ExprId, right: ExprId, span: Span) -> TypeId {
    let Some((place, lhs_ty)) = place_and_type(state, scope, left) else {
        state.emit(Code::SemaTypeMismatch, "left-hand side of an assignment must be a place", span);
        type_expr(state, scope, right);
        return state.error_type();
    };
    let rhs_ty = type_expr(state, scope, right);

    let value_ty = match op.compound_base() {
        Some(base_op) => {
            let Some(name) = base_op.magic_name() else { return state.error_type() };
            if let (Some(lk), Some(rk)) = (numeric_kind(state.interner, lhs_ty), numeric_kind(state.interner, rhs_ty)) {
                if lhs_ty == rhs_ty || widening_join(lk, rk) == Some(lk) || is_literal_node(state, right) {
                    lhs_ty
                } else {
                    state.emit(Code::SemaTypeMismatch, "mismatched numeric operand types", span);
                    state.error_type()
                }
            } else {
                dispatch_magic_binary(state, lhs_ty, rhs_ty, name, span)
            }
        }
        None => rhs_ty,
    };

    if value_ty != lhs_ty && value_ty != state.error_type() {
        match resolve_implicit_to(state.interner, state.resolver, &state.magic_index, &state.names, value_ty, lhs_ty) {
            ToOutcome::NotNeeded | ToOutcome::Found(_) => {}
            ToOutcome::Ambiguous => {
                state.emit(Code::SemaAmbiguousConversion, "ambiguous implicit conversion in assignment", span);
            }
            ToOutcome::None if !widens(state.interner, value_ty, lhs_ty, is_literal_node(state, right)) => {
                state.emit(Code::SemaTypeMismatch, "assigned value does not match the target's type", span);
            }
            ToOutcome::None => {}
        }
    }

    if let Issue::Conflict(_) = state.borrows.mutation_allowed(&place, span, true) {
        let name = state.symbol_name_str(place.base).to_string();
        state.emit(Code::SemaBorrowMutation, format!("cannot assign to '{name}' because it is borrowed"), span);
    }
    state.interner.builtins().unit_
}

// ---- Ternary ---------------------------------------------------------------

fn type_ternary(state: &mut CheckerState<'_>, scope: ScopeId, cond: ExprId, then_branch: ExprId, else_branch: ExprId, span: Span) -> TypeId {
    let cond_ty = type_expr(state, scope, cond);
    check_bool(state, cond_ty, "ternary condition", span);
    let then_ty = type_expr(state, scope, then_branch);
    let else_ty = type_expr(state, scope, else_branch);
    unify_branches(state.interner, then_ty, else_ty).unwrap_or_else(|| {
        state.emit(Code::SemaTypeMismatch, "ternary branches have incompatible types", span);
        state.error_type()
    })
}

// ---- Calls ------------------------------------------------------------

fn type_call(
    state: &mut CheckerState<'_>,
    scope: ScopeId,
    callee: ExprId,
    args: &[ExprId],
    explicit_type_args: &[TypeNodeId],
    span: Span,
) -> TypeId {
    if let Some(ty) = try_lock_call(state, scope, callee, args, span) {
        return ty;
    }
    if let Some(ty) = try_channel_call(state, scope, callee, args, span) {
        return ty;
    }
    match state.builder.kind(callee).clone() {
        NodeKind::Member { base, name } => type_method_call(state, scope, base, name, args, explicit_type_args, span),
        _ => type_free_call(state, scope, callee, args, explicit_type_args, span),
    }
}

const LOCK_METHODS: &[&str] =
    &["lock", "try_lock", "read_lock", "try_read_lock", "write_lock", "try_write_lock", "unlock"];

fn lock_receiver_shape(state: &CheckerState<'_>, base: ExprId) -> Option<(SymbolId, Option<StringId>)> {
    match state.builder.kind(base) {
        NodeKind::Identifier(_) => state.symbols.node_symbol(base).map(|sym| (sym, None)),
        NodeKind::Member { base: inner, name } => {
            if matches!(state.builder.kind(*inner), NodeKind::Identifier(_)) {
                state.symbols.node_symbol(*inner).map(|sym| (sym, Some(*name)))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Intercepts `.lock()`/`.unlock()`/`.read_lock()`/`.write_lock()`/
/// `.try_*()`-family calls before ordinary method dispatch (§4.J). Returns
/// `None` for every other call shape.
fn try_lock_call(state: &mut CheckerState<'_>, scope: ScopeId, callee: ExprId, args: &[ExprId], span: Span) -> Option<TypeId> {
    let NodeKind::Member { base, name } = state.builder.kind(callee).clone() else { return None };
    let method = state.resolver.resolve(name).to_string();
    if !LOCK_METHODS.contains(&method.as_str()) {
        return None;
    }
    let (lock_base, field_name) = lock_receiver_shape(state, base)?;
    for a in args {
        type_expr(state, scope, *a);
    }
    let unit_ = state.interner.builtins().unit_;

    if method == "unlock" {
        let held: Vec<LockKey> = state
            .lock_state
            .held_keys()
            .filter(|k| k.base == lock_base && k.field_name == field_name)
            .collect();
        match held.first() {
            Some(&key) => {
                state.lock_state.release(key);
                state.lock_identities.remove(&key);
            }
            None => state.emit(Code::SemaLockReleaseNotHeld, "cannot release: lock is not held", span),
        }
        return Some(unit_);
    }

    let kind = match method.as_str() {
        "lock" | "try_lock" => LockKind::Mutex,
        "read_lock" | "try_read_lock" => LockKind::RwRead,
        _ => LockKind::RwWrite,
    };
    if method.starts_with("try_") {
        state.lock_state.mark_try_lock();
    }
    let base_ty = type_expr(state, scope, base);
    let Some(type_name) = receiver_name_of(state.interner, state.interner.resolve_alias(base_ty)) else {
        return Some(unit_);
    };
    let key = LockKey { base: lock_base, field_name, kind };
    let (outcome, held_before) = state.lock_state.acquire(key, span);
    match outcome {
        AcquireOutcome::DoubleAcquire => {
            state.emit(Code::SemaLockDoubleAcquire, "lock is already held", span);
        }
        AcquireOutcome::Ok => {
            let identity = LockIdentity::new(type_name, field_name);
            state.lock_identities.insert(key, identity);
            for prev_key in held_before {
                if let Some(&prev_identity) = state.lock_identities.get(&prev_key) {
                    state.lock_graph.add_edge(prev_identity, identity, span);
                }
            }
        }
    }
    Some(unit_)
}

const CHANNEL_METHODS: &[&str] = &["send", "try_send", "recv", "try_recv"];

/// Intercepts `.send()`/`.recv()`-family calls on a `Channel<T>` receiver
/// before ordinary method dispatch, enforcing that `T` is send-safe (§4.E,
/// §4.I "channel value restrictions"). Returns `None` for every other call
/// shape.
fn try_channel_call(state: &mut CheckerState<'_>, scope: ScopeId, callee: ExprId, args: &[ExprId], span: Span) -> Option<TypeId> {
    let NodeKind::Member { base, name } = state.builder.kind(callee).clone() else { return None };
    let method = state.resolver.resolve(name).to_string();
    if !CHANNEL_METHODS.contains(&method.as_str()) {
        return None;
    }
    let base_ty = type_expr(state, scope, base);
    let resolved = state.interner.resolve_alias(base_ty);
    let TypeTerm::Struct { name: type_name, type_args, .. } = state.interner.lookup(resolved).clone() else { return None };
    if type_name != state.names.channel {
        return None;
    }
    let unit_ = state.interner.builtins().unit_;
    let payload = type_args.first().copied().unwrap_or(unit_);
    if is_send_unsafe(state.interner, payload) {
        let payload_name = canonical_key(state.interner, state.resolver, payload);
        state.emit(
            Code::SemaChannelNotSendSafe,
            format!("'{payload_name}' is not send-safe: reference and pointer types cannot cross a channel"),
            span,
        );
    }
    for a in args {
        type_expr(state, scope, *a);
    }
    Some(match method.as_str() {
        "recv" => payload,
        "try_recv" => state.interner.intern(TypeTerm::Struct {
            name: state.names.option,
            fields: Vec::new(),
            type_args: vec![payload],
            value_args: Vec::new(),
        }),
        _ => unit_,
    })
}

/// A type crosses a channel unsafely if it is (or aliases to) a reference or
/// raw pointer: both denote a borrow or address local to the sending task
/// and don't survive being handed to another task.
fn is_send_unsafe(interner: &TypeInterner, ty: TypeId) -> bool {
    let resolved = interner.resolve_alias(ty);
    matches!(interner.lookup(resolved), TypeTerm::Reference { .. } | TypeTerm::Pointer { .. })
}

fn type_method_call(
    state: &mut CheckerState<'_>,
    scope: ScopeId,
    base: ExprId,
    name: StringId,
    args: &[ExprId],
    explicit_type_args: &[TypeNodeId],
    span: Span,
) -> TypeId {
    let base_ty = type_expr(state, scope, base);
    let method = state.resolver.resolve(name).to_string();
    if is_resize_method(&method) && is_view_expr_or_binding(state, base) {
        state.emit(Code::SemaTypeMismatch, format!("'{method}' cannot be called on an array view"), span);
    }
    let arg_types: Vec<TypeId> = args.iter().map(|a| type_expr(state, scope, *a)).collect();
    let receivers = receiver_candidates(state, base_ty);
    let arg_keys: Vec<String> = arg_types.iter().map(|t| canonical_key(state.interner, state.resolver, *t)).collect();

    match resolve_overload_named(&state.magic_index, state.resolver, &receivers, &method, &arg_keys) {
        MagicResolution::Found(symbol) => instantiate_call(state, scope, symbol, 1, &arg_types, explicit_type_args, span),
        MagicResolution::Ambiguous(_) => {
            state.emit(Code::SemaAmbiguousOverload, format!("ambiguous overload for '{method}'"), span);
            state.error_type()
        }
        MagicResolution::NoMatch => {
            let receiver_str = receivers.first().map(|r| state.resolver.resolve(*r)).unwrap_or("?");
            state.emit(Code::SemaNoOverload, format!("no matching overload for '{method}' on '{receiver_str}'"), span);
            state.error_type()
        }
    }
}

fn type_free_call(
    state: &mut CheckerState<'_>,
    scope: ScopeId,
    callee: ExprId,
    args: &[ExprId],
    explicit_type_args: &[TypeNodeId],
    span: Span,
) -> TypeId {
    let arg_types: Vec<TypeId> = args.iter().map(|a| type_expr(state, scope, *a)).collect();

    if let NodeKind::Identifier(_) = state.builder.kind(callee) {
        if let Some(symbol_id) = state.symbols.node_symbol(callee) {
            let kind = state.symbols.symbol(symbol_id).kind;
            if kind == SymbolKind::Function {
                return instantiate_call(state, scope, symbol_id, 0, &arg_types, explicit_type_args, span);
            }
        }
    }

    let callee_ty = type_expr(state, scope, callee);
    let resolved = state.interner.resolve_alias(callee_ty);
    match state.interner.lookup(resolved).clone() {
        TypeTerm::Fn { params, ret } => {
            if params.len() != arg_types.len() {
                state.emit(Code::SemaTypeMismatch, "argument count mismatch", span);
                return state.error_type();
            }
            for (p, a) in params.iter().zip(arg_types.iter()) {
                if p != a && !widens(state.interner, *a, *p, false) {
                    state.emit(Code::SemaTypeMismatch, "argument type mismatch", span);
                }
            }
            ret
        }
        _ => {
            state.emit(Code::SemaTypeMismatch, "called value is not callable", span);
            state.error_type()
        }
    }
}

/// Resolve a call against `symbol`'s declared signature, substituting
/// generic parameters from the argument types (and any explicit type
/// arguments) and recording the instantiation (§4.G, §8 Property 10).
/// `self_offset` is `1` for method calls (the receiver occupies `params[0]`
/// on the declared `Fn` type) and `0` for free calls.
fn instantiate_call(
    state: &mut CheckerState<'_>,
    scope: ScopeId,
    symbol_id: SymbolId,
    self_offset: usize,
    arg_types: &[TypeId],
    explicit_type_args: &[TypeNodeId],
    span: Span,
) -> TypeId {
    let symbol = state.symbols.symbol(symbol_id).clone();
    if state.in_nonblocking
        && state.options.enforce_nonblocking
        && !symbol.flags.contains(SymbolFlags::NONBLOCKING)
        && !symbol.flags.contains(SymbolFlags::INTRINSIC)
    {
        let callee_name = state.symbol_name_str(symbol_id).to_string();
        state.emit(
            Code::SemaNonblockingViolation,
            format!("cannot call blocking operation '{callee_name}' from a '@nonblocking' function"),
            span,
        );
    }
    let fn_ty = state.interner.resolve_alias(symbol.ty);
    let (params, ret) = match state.interner.lookup(fn_ty).clone() {
        TypeTerm::Fn { params, ret } => (params, ret),
        _ => return state.error_type(),
    };
    if params.len() < self_offset || params.len() - self_offset != arg_types.len() {
        state.emit(Code::SemaTypeMismatch, "argument count mismatch", span);
        return state.error_type();
    }
    let callee_params = &params[self_offset..];

    if symbol.type_params.is_empty() {
        for (p, a) in callee_params.iter().zip(arg_types.iter()) {
            if p == a {
                continue;
            }
            match resolve_implicit_to(state.interner, state.resolver, &state.magic_index, &state.names, *a, *p) {
                ToOutcome::NotNeeded | ToOutcome::Found(_) => {}
                ToOutcome::Ambiguous => state.emit(Code::SemaAmbiguousConversion, "ambiguous implicit conversion", span),
                ToOutcome::None if !widens(state.interner, *a, *p, false) => {
                    state.emit(Code::SemaTypeMismatch, "argument type mismatch", span);
                }
                ToOutcome::None => {}
            }
        }
        return ret;
    }

    let explicit: Vec<TypeId> = explicit_type_args.iter().map(|t| resolve_type_node(state, scope, *t)).collect();
    state.generics.push_scope(symbol_id, &symbol.type_params, &explicit);
    let mut bindings: FxHashMap<StringId, TypeId> = FxHashMap::default();
    for (name, ty) in symbol.type_params.iter().zip(explicit.iter()) {
        bindings.insert(*name, *ty);
    }
    for (p, a) in callee_params.iter().zip(arg_types.iter()) {
        unify(state.interner, symbol_id, *p, *a, &mut bindings);
    }
    state.generics.pop_scope();

    if let Some(missing) = symbol.type_params.iter().find(|n| !bindings.contains_key(*n)) {
        let name = state.resolver.resolve(*missing).to_string();
        let fn_name = state.symbol_name_str(symbol_id).to_string();
        state.emit(Code::SemaCannotInferTypeParam, format!("cannot infer type parameter {name} for {fn_name}"), span);
        return state.error_type();
    }

    enforce_bounds(state, symbol_id, &bindings, span);
    let result = substitute(state.interner, symbol_id, &bindings, ret);
    let ordered: Vec<TypeId> = symbol.type_params.iter().map(|n| bindings[n]).collect();
    state.result.record_instantiation(symbol_id, ordered);
    result
}

// ---- Aggregate literals -------------------------------------------------

fn type_array_literal(state: &mut CheckerState<'_>, scope: ScopeId, elems: &[ExprId], span: Span) -> TypeId {
    let mut elem_ty = None;
    for e in elems {
        let ty = type_expr(state, scope, *e);
        elem_ty = Some(match elem_ty {
            None => ty,
            Some(prev) => unify_branches(state.interner, prev, ty).unwrap_or_else(|| {
                state.emit(Code::SemaTypeMismatch, "array elements have mismatched types", span);
                prev
            }),
        });
    }
    let elem = elem_ty.unwrap_or_else(|| state.interner.builtins().nothing_);
    state.interner.array_term(elem, ArrayLen::Fixed(elems.len() as u64))
}

fn type_map_literal(state: &mut CheckerState<'_>, scope: ScopeId, pairs: &[(ExprId, ExprId)], span: Span) -> TypeId {
    let mut key_ty = None;
    let mut val_ty = None;
    for (k, v) in pairs {
        let kt = type_expr(state, scope, *k);
        let vt = type_expr(state, scope, *v);
        key_ty = Some(match key_ty {
            None => kt,
            Some(prev) => unify_branches(state.interner, prev, kt).unwrap_or(prev),
        });
        val_ty = Some(match val_ty {
            None => vt,
            Some(prev) => unify_branches(state.interner, prev, vt).unwrap_or(prev),
        });
    }
    let key = key_ty.unwrap_or_else(|| state.interner.builtins().nothing_);
    let val = val_ty.unwrap_or_else(|| state.interner.builtins().nothing_);
    if !pairs.is_empty() && !is_primitive_hashable(state.interner, key) {
        state.emit(Code::SemaTypeMismatch, "map key type is not hashable", span);
    }
    state.interner.intern(TypeTerm::Struct { name: state.names.map, fields: Vec::new(), type_args: vec![key, val], value_args: Vec::new() })
}

fn type_range_literal(state: &mut CheckerState<'_>, scope: ScopeId, start: ExprId, end: ExprId, span: Span) -> TypeId {
    let st = type_expr(state, scope, start);
    let et = type_expr(state, scope, end);
    if numeric_kind(state.interner, st).is_none() || st != et {
        state.emit(Code::SemaTypeMismatch, "range bounds must share the same numeric type", span);
    }
    state.interner.intern(TypeTerm::Struct { name: state.names.range, fields: Vec::new(), type_args: vec![st], value_args: Vec::new() })
}

fn type_index(state: &mut CheckerState<'_>, scope: ScopeId, base: ExprId, index: ExprId, expr: ExprId, span: Span) -> TypeId {
    let base_ty = type_expr(state, scope, base);
    let index_ty = type_expr(state, scope, index);
    let resolved = state.interner.resolve_alias(index_ty);
    let is_range = matches!(state.interner.lookup(resolved), TypeTerm::Struct { name, .. } if *name == state.names.range);
    if is_range {
        state.views.mark_view_expr(expr);
        return base_ty;
    }
    if let Some((k, v)) = state.interner.map_info(state.interner.resolve_alias(base_ty)) {
        if k != index_ty && !widens(state.interner, index_ty, k, is_literal_node(state, index)) {
            state.emit(Code::SemaTypeMismatch, "map index type does not match its key type", span);
        }
        return v;
    }
    array_elem_type(state, base_ty).unwrap_or_else(|| {
        state.emit(Code::SemaTypeMismatch, "this type cannot be indexed", span);
        state.error_type()
    })
}

fn type_member(state: &mut CheckerState<'_>, scope: ScopeId, base: ExprId, name: StringId, span: Span) -> TypeId {
    let base_ty = type_expr(state, scope, base);
    field_type(state, base_ty, name).unwrap_or_else(|| {
        let field = state.resolver.resolve(name).to_string();
        state.emit(Code::SemaTypeMismatch, format!("no field '{field}' on this type"), span);
        state.error_type()
    })
}

fn type_tuple_index(state: &mut CheckerState<'_>, scope: ScopeId, base: ExprId, index: u32, span: Span) -> TypeId {
    let base_ty = type_expr(state, scope, base);
    let resolved = state.interner.resolve_alias(base_ty);
    state.interner.tuple_info(resolved).and_then(|elems| elems.get(index as usize).copied()).unwrap_or_else(|| {
        state.emit(Code::SemaTypeMismatch, "tuple index out of range", span);
        state.error_type()
    })
}

fn type_cast(state: &mut CheckerState<'_>, scope: ScopeId, base: ExprId, target: TypeNodeId, span: Span) -> TypeId {
    let base_ty = type_expr(state, scope, base);
    let target_ty = resolve_type_node(state, scope, target);
    if base_ty == target_ty {
        return target_ty;
    }
    if numeric_kind(state.interner, base_ty).is_some() && numeric_kind(state.interner, target_ty).is_some() {
        return target_ty;
    }
    match resolve_implicit_to(state.interner, state.resolver, &state.magic_index, &state.names, base_ty, target_ty) {
        ToOutcome::NotNeeded => target_ty,
        ToOutcome::Found(symbol) => {
            state.result.to_symbols.insert(base, symbol);
            target_ty
        }
        ToOutcome::Ambiguous => {
            state.emit(Code::SemaAmbiguousConversion, "ambiguous implicit conversion", span);
            state.error_type()
        }
        ToOutcome::None => {
            state.emit(Code::SemaTypeMismatch, "no conversion exists for this cast", span);
            state.error_type()
        }
    }
}

fn type_compare(state: &mut CheckerState<'_>, scope: ScopeId, subject: ExprId, arms: &[semacore_ast::CompareArm], span: Span) -> TypeId {
    let subject_ty = type_expr(state, scope, subject);
    let mut result: Option<TypeId> = None;
    let mut matched_tags: Vec<StringId> = Vec::new();
    let mut has_catch_all = false;
    for arm in arms {
        type_pattern(state, scope, arm.pattern, &mut matched_tags, &mut has_catch_all);
        if let Some(guard) = arm.guard {
            let gt = type_expr(state, scope, guard);
            check_bool(state, gt, "compare guard", span);
        }
        let body_ty = type_expr(state, scope, arm.body);
        result = Some(match result {
            None => body_ty,
            Some(prev) => unify_branches(state.interner, prev, body_ty).unwrap_or_else(|| {
                state.emit(Code::SemaTypeMismatch, "compare arms have incompatible types", span);
                prev
            }),
        });
    }
    check_tagged_union_exhaustiveness(state, subject_ty, &matched_tags, has_catch_all, span);
    result.unwrap_or_else(|| state.interner.builtins().unit_)
}

/// Best-effort pattern typing: tag-constant identifiers (bare or called
/// with payload sub-patterns) resolve through their own `Tag` symbol kind
/// and are recorded into `matched`; anything else (a literal, or an
/// identifier that binds rather than matches) is typed as a normal
/// expression and treated as a catch-all for exhaustiveness purposes.
fn type_pattern(state: &mut CheckerState<'_>, scope: ScopeId, pattern: ExprId, matched: &mut Vec<StringId>, has_catch_all: &mut bool) {
    let tag_name = match state.builder.kind(pattern).clone() {
        NodeKind::Identifier(_) => tag_symbol_name(state, pattern),
        NodeKind::Call { callee, .. } => tag_symbol_name(state, callee),
        _ => None,
    };
    match tag_name {
        Some(name) => matched.push(name),
        None => *has_catch_all = true,
    }
    type_expr(state, scope, pattern);
}

/// If `expr` is an identifier resolved to a `Tag` symbol, its declared name.
fn tag_symbol_name(state: &CheckerState<'_>, expr: ExprId) -> Option<StringId> {
    let symbol_id = state.symbols.node_symbol(expr)?;
    let symbol = state.symbols.symbol(symbol_id);
    (symbol.kind == SymbolKind::Tag).then_some(symbol.name)
}

/// Tagged-union `compare` exhaustiveness (§4.E): every arm must either be a
/// catch-all or the tag set of the matched arms must cover every member of
/// the subject's union, including `Nothing`, which only a catch-all arm can
/// discharge since it carries no tag name of its own to match against.
fn check_tagged_union_exhaustiveness(state: &mut CheckerState<'_>, subject_ty: TypeId, matched: &[StringId], has_catch_all: bool, span: Span) {
    if has_catch_all {
        return;
    }
    let resolved = state.interner.resolve_alias(subject_ty);
    let Some(members) = state.interner.union_info(resolved).map(|info| info.members.to_vec()) else { return };
    let mut missing: Vec<String> = Vec::new();
    for member in &members {
        match member {
            UnionMember::Tag { tag_name, .. } if !matched.contains(tag_name) => {
                missing.push(state.resolver.resolve(*tag_name).to_string());
            }
            UnionMember::Nothing => missing.push("nothing".to_string()),
            UnionMember::Tag { .. } => {}
        }
    }
    if !missing.is_empty() {
        let type_name = canonical_key(state.interner, state.resolver, resolved);
        state.emit(Code::SemaNonExhaustiveCompare, format!("compare over '{type_name}' is not exhaustive: missing {}", missing.join(", ")), span);
    }
}

fn type_select(state: &mut CheckerState<'_>, scope: ScopeId, arms: &[semacore_ast::SelectArm], default: Option<ExprId>, span: Span) -> TypeId {
    let mut result: Option<TypeId> = None;
    for arm in arms {
        type_expr(state, scope, arm.awaitable);
        let body_ty = type_expr(state, scope, arm.body);
        result = Some(match result {
            None => body_ty,
            Some(prev) => unify_branches(state.interner, prev, body_ty).unwrap_or(prev),
        });
    }
    if let Some(d) = default {
        let dt = type_expr(state, scope, d);
        result = Some(match result {
            None => dt,
            Some(prev) => unify_branches(state.interner, prev, dt).unwrap_or_else(|| {
                state.emit(Code::SemaTypeMismatch, "select arms have incompatible types", span);
                prev
            }),
        });
    }
    result.unwrap_or_else(|| state.interner.builtins().unit_)
}

fn type_async_block(state: &mut CheckerState<'_>, scope: ScopeId, body: ExprId) -> TypeId {
    state.enter_async();
    let body_ty = type_expr(state, scope, body);
    state.exit_async();
    state.interner.intern(TypeTerm::Struct { name: state.names.task, fields: Vec::new(), type_args: vec![body_ty], value_args: Vec::new() })
}

fn type_spawn(state: &mut CheckerState<'_>, scope: ScopeId, body: ExprId, is_local: bool, expr: ExprId, span: Span) -> TypeId {
    if !is_local {
        let free = semacore_borrow::free_identifiers(state.builder, state.symbols, body);
        for sym in free {
            let has_active_borrow = state.borrows.borrows().iter().any(|b| b.place.base == sym && b.end_span.is_none());
            if has_active_borrow && !state.options.alien_hints {
                let name = state.symbol_name_str(sym).to_string();
                state.emit(
                    Code::SemaBorrowThreadEscape,
                    format!("borrow of '{name}' cannot be captured by a non-local spawn"),
                    span,
                );
            }
        }
    }
    state.enter_async();
    let body_ty = type_expr(state, scope, body);
    state.exit_async();
    if let Some(current_scope) = state.current_scope() {
        state.concurrency.spawn(current_scope, expr);
    }
    state.interner.intern(TypeTerm::Struct { name: state.names.task, fields: Vec::new(), type_args: vec![body_ty], value_args: Vec::new() })
}

fn type_struct_literal(state: &mut CheckerState<'_>, scope: ScopeId, ty: TypeNodeId, fields: &[semacore_ast::FieldInit], span: Span) -> TypeId {
    let struct_ty = resolve_type_node(state, scope, ty);
    let resolved = state.interner.resolve_alias(struct_ty);
    let declared_fields: Vec<(StringId, TypeId)> =
        state.interner.struct_info(resolved).map(|info| info.fields.to_vec()).unwrap_or_default();

    let mut provided = Vec::new();
    for f in fields {
        let value_ty = type_expr(state, scope, f.value);
        match declared_fields.iter().find(|(n, _)| *n == f.name) {
            Some((_, expected)) => {
                if *expected != value_ty && !widens(state.interner, value_ty, *expected, is_literal_node(state, f.value)) {
                    state.emit(Code::SemaTypeMismatch, "field value does not match its declared type", span);
                }
            }
            None => {
                let name = state.resolver.resolve(f.name).to_string();
                state.emit(Code::SemaTypeMismatch, format!("no field '{name}' on this type"), span);
            }
        }
        provided.push(f.name);
    }
    for (name, field_ty) in &declared_fields {
        if provided.contains(name) {
            continue;
        }
        match is_defaultable(state.interner, state.resolver, &state.magic_index, &state.names, *field_ty) {
            Some(default_symbol) if default_symbol.is_some() => {
                state.result.record_instantiation(default_symbol, Vec::new());
            }
            Some(_) => {}
            None => {
                let n = state.resolver.resolve(*name).to_string();
                state.emit(Code::SemaTypeMismatch, format!("missing field '{n}' with no default"), span);
            }
        }
    }
    struct_ty
}

fn type_block(state: &mut CheckerState<'_>, scope: ScopeId, stmts: &[ExprId], tail: Option<ExprId>, block_expr: ExprId, span: Span) -> TypeId {
    let block_scope = state.symbols.item_scope(block_expr).unwrap_or(scope);
    let pushed = block_scope != scope;
    if pushed {
        state.push_scope(block_scope);
    }
    for s in stmts {
        type_expr(state, block_scope, *s);
    }
    let ty = match tail {
        Some(t) => type_expr(state, block_scope, t),
        None => state.interner.builtins().unit_,
    };
    if pushed {
        state.pop_scope(span);
    }
    ty
}

// ---- Statements ------------------------------------------------------

pub(crate) fn validate_attrs(state: &mut CheckerState<'_>, attrs: &[semacore_ast::Attr], context: &str, span: Span) {
    const KNOWN: &[&str] = &["copy", "deprecated", "requires_lock", "acquires_lock", "releases_lock", "nonblocking", "local", "overload", "entrypoint"];
    for attr in attrs {
        let name = state.resolver.resolve(attr.name).to_string();
        if !KNOWN.contains(&name.as_str()) {
            state.emit(Code::SemaUnknownAttr, format!("unknown attribute '{name}' on {context}"), span);
        }
    }
}

fn type_let(
    state: &mut CheckerState<'_>,
    scope: ScopeId,
    symbol: SymbolId,
    ty: Option<TypeNodeId>,
    init: Option<ExprId>,
    attrs: &[semacore_ast::Attr],
    span: Span,
) -> TypeId {
    validate_attrs(state, attrs, "let", span);
    let declared = ty.map(|t| resolve_type_node(state, scope, t));
    let unit_ = state.interner.builtins().unit_;

    let final_ty = match (declared, init) {
        (Some(decl), Some(value)) => {
            let value_ty = type_expr(state, scope, value);
            if decl != value_ty {
                match resolve_implicit_to(state.interner, state.resolver, &state.magic_index, &state.names, value_ty, decl) {
                    ToOutcome::NotNeeded | ToOutcome::Found(_) => {}
                    ToOutcome::Ambiguous => state.emit(Code::SemaAmbiguousConversion, "ambiguous implicit conversion", span),
                    ToOutcome::None if !widens(state.interner, value_ty, decl, is_literal_node(state, value)) => {
                        state.emit(Code::SemaTypeMismatch, "initializer does not match the declared type", span);
                    }
                    ToOutcome::None => {}
                }
            }
            decl
        }
        (None, Some(value)) => type_expr(state, scope, value),
        (Some(decl), None) => {
            match is_defaultable(state.interner, state.resolver, &state.magic_index, &state.names, decl) {
                Some(default_symbol) if default_symbol.is_some() => {
                    state.result.record_instantiation(default_symbol, Vec::new());
                }
                Some(_) => {}
                None => state.emit(Code::SemaTypeMismatch, "type has no initializer and no default", span),
            }
            decl
        }
        (None, None) => {
            state.emit(Code::SemaTypeMismatch, "let binding needs a type or an initializer", span);
            state.error_type()
        }
    };

    state.symbols.symbol_mut(symbol).ty = final_ty;
    state.result.set_binding_type(symbol, final_ty);
    if state.interner.is_copy_primitive(final_ty) {
        state.result.mark_copy_type(final_ty);
    }
    if let Some(value) = init {
        if let NodeKind::Spawn { .. } = state.builder.kind(value) {
            state.concurrency.bind(symbol, value);
        }
        if state.views.is_view_expr(value) {
            state.views.mark_view_binding(symbol);
        }
    }
    unit_
}

fn type_const_stmt(state: &mut CheckerState<'_>, scope: ScopeId, symbol: SymbolId, ty: Option<TypeNodeId>, init: ExprId, span: Span) -> TypeId {
    if !state.begin_const_eval(symbol, span) {
        return state.interner.builtins().unit_;
    }
    let declared = ty.map(|t| resolve_type_node(state, scope, t));
    let value_ty = type_expr(state, scope, init);
    let final_ty = declared.unwrap_or(value_ty);
    if let Some(decl) = declared {
        if decl != value_ty && !widens(state.interner, value_ty, decl, is_literal_node(state, init)) {
            state.emit(Code::SemaTypeMismatch, "const initializer does not match its declared type", span);
        }
    }
    state.symbols.symbol_mut(symbol).ty = final_ty;
    state.result.set_binding_type(symbol, final_ty);
    state.end_const_eval(symbol);
    state.interner.builtins().unit_
}

fn type_return(state: &mut CheckerState<'_>, scope: ScopeId, value: Option<ExprId>, span: Span) -> TypeId {
    let unit_ = state.interner.builtins().unit_;
    let actual = match value {
        Some(e) => type_expr(state, scope, e),
        None => unit_,
    };
    if let Some(ctx) = state.current_return_context().copied() {
        if actual != ctx.expected {
            match resolve_implicit_to(state.interner, state.resolver, &state.magic_index, &state.names, actual, ctx.expected) {
                ToOutcome::NotNeeded | ToOutcome::Found(_) => {}
                ToOutcome::Ambiguous => state.emit(Code::SemaAmbiguousConversion, "ambiguous implicit conversion", span),
                ToOutcome::None if !widens(state.interner, actual, ctx.expected, value.is_some_and(|e| is_literal_node(state, e))) => {
                    state.emit(Code::SemaTypeMismatch, "returned value does not match the function's return type", span);
                }
                ToOutcome::None => {}
            }
        }
    }
    state.mark_terminal_return();
    if let Some(e) = value {
        if matches!(state.builder.kind(e), NodeKind::Spawn { .. }) {
            state.concurrency.resolve(e, TaskResolution::Returned);
        } else if let NodeKind::Identifier(_) = state.builder.kind(e) {
            if let Some(sym) = state.symbols.node_symbol(e) {
                if let Some(task_expr) = state.concurrency.binding_task(sym) {
                    state.concurrency.resolve(task_expr, TaskResolution::Returned);
                }
            }
        }
    }
    unit_
}

fn type_if(state: &mut CheckerState<'_>, scope: ScopeId, cond: ExprId, then_branch: ExprId, else_branch: Option<ExprId>, span: Span) -> TypeId {
    let cond_ty = type_expr(state, scope, cond);
    check_bool(state, cond_ty, "if condition", span);

    let base_locks = state.lock_state.clone();
    let then_ty = type_expr(state, scope, then_branch);
    let then_locks = state.lock_state.clone();

    state.lock_state = base_locks;
    let else_ty = else_branch.map(|e| type_expr(state, scope, e));
    let else_locks = state.lock_state.clone();

    let (merged, unbalanced) = LockState::merge(&then_locks, &else_locks);
    if !unbalanced.is_empty() && !then_locks.uses_try_lock() && !else_locks.uses_try_lock() && !state.options.relax_lock_balance_under_try_lock {
        state.emit(Code::SemaLockUnbalanced, "lock is held on one branch but not the other", span);
    }
    state.lock_state = merged;

    match else_ty {
        Some(et) => unify_branches(state.interner, then_ty, et).unwrap_or_else(|| {
            state.emit(Code::SemaTypeMismatch, "if branches have incompatible types", span);
            state.error_type()
        }),
        None => state.interner.builtins().unit_,
    }
}

fn type_while(state: &mut CheckerState<'_>, scope: ScopeId, cond: ExprId, body: ExprId, span: Span) -> TypeId {
    let cond_ty = type_expr(state, scope, cond);
    check_bool(state, cond_ty, "while condition", span);
    let before = state.lock_state.clone();
    type_expr(state, scope, body);
    let (merged, unbalanced) = LockState::merge(&before, &state.lock_state);
    if !unbalanced.is_empty() && !state.lock_state.uses_try_lock() && !state.options.relax_lock_balance_under_try_lock {
        state.emit(Code::SemaLockUnbalanced, "lock held on one loop path but not another", span);
    }
    state.lock_state = merged;
    state.interner.builtins().unit_
}

fn type_for(state: &mut CheckerState<'_>, scope: ScopeId, init: Option<ExprId>, cond: Option<ExprId>, step: Option<ExprId>, body: ExprId, span: Span) -> TypeId {
    if let Some(i) = init {
        type_expr(state, scope, i);
    }
    if let Some(c) = cond {
        let ct = type_expr(state, scope, c);
        check_bool(state, ct, "for condition", span);
    }
    let before = state.lock_state.clone();
    type_expr(state, scope, body);
    if let Some(s) = step {
        type_expr(state, scope, s);
    }
    let (merged, unbalanced) = LockState::merge(&before, &state.lock_state);
    if !unbalanced.is_empty() && !state.lock_state.uses_try_lock() && !state.options.relax_lock_balance_under_try_lock {
        state.emit(Code::SemaLockUnbalanced, "lock held on one loop path but not another", span);
    }
    state.lock_state = merged;
    state.interner.builtins().unit_
}

fn type_for_in(state: &mut CheckerState<'_>, scope: ScopeId, binding: SymbolId, iterable: ExprId, body: ExprId, span: Span) -> TypeId {
    let iterable_ty = type_expr(state, scope, iterable);
    let elem_ty = array_elem_type(state, iterable_ty).unwrap_or_else(|| {
        let receivers = receiver_candidates(state, iterable_ty);
        match resolve_overload_named(&state.magic_index, state.resolver, &receivers, "__iter", &[]) {
            MagicResolution::Found(symbol) => fn_ret_type(state, symbol),
            _ => {
                state.emit(Code::SemaIteratorNotImplemented, "this type does not implement an iterator protocol", span);
                state.error_type()
            }
        }
    });
    state.symbols.symbol_mut(binding).ty = elem_ty;
    state.result.set_binding_type(binding, elem_ty);
    type_expr(state, scope, body);
    state.interner.builtins().unit_
}
