//! `CheckerState`: the single struct threaded through the Walker and
//! Expression Typer, owning every sub-component's mutable state for one
//! file's `check()` run.

use rustc_hash::FxHashMap;
use semacore_ast::{Builder, FileId, SymbolTable};
use semacore_borrow::{BorrowTable, ViewTable};
use semacore_common::{
    AnalyzerOptions, CancellationToken, Code, Diagnostic, DiagnosticBag, ExprId, ScopeId, Span, StringId, SymbolId, TypeId,
};
use semacore_concurrency::{ConcurrencyTracker, LockIdentity, LockKey, LockOrderGraph, LockState};
use semacore_types::{NameResolver, TypeInterner};

use crate::contracts::ContractShape;
use crate::conversion::WellKnownNames;
use crate::generics::GenericEnv;
use crate::magic_index::MagicIndex;
use crate::result::CheckResult;

/// The expected return type and source span of the function currently being
/// walked, plus whether a guaranteed terminal `return` has been seen on every
/// path (used for `MissingReturn`).
#[derive(Clone, Copy, Debug)]
pub struct ReturnContext {
    pub expected: TypeId,
    pub span: Span,
    pub terminal_return_seen: bool,
}

pub struct CheckerState<'a> {
    pub builder: &'a Builder,
    /// Mutable because the checker attaches auxiliary info back onto
    /// symbols it doesn't own the declaration of: memoized `const` types
    /// (with cycle detection) and contract-bound field/method sets.
    pub symbols: &'a mut SymbolTable,
    pub interner: &'a mut TypeInterner,
    pub diagnostics: &'a mut DiagnosticBag,
    pub options: &'a AnalyzerOptions,
    pub resolver: &'a dyn NameResolver,
    pub lock_graph: &'a mut LockOrderGraph,
    pub file: FileId,
    pub cancel: CancellationToken,
    pub names: WellKnownNames,

    pub magic_index: MagicIndex,
    pub borrows: BorrowTable,
    pub views: ViewTable,
    pub concurrency: ConcurrencyTracker,
    pub generics: GenericEnv,
    pub lock_state: LockState,
    /// Which `LockIdentity` a currently-held local `LockKey` maps to, so
    /// acquiring a new lock while others are held can emit lock-order-graph
    /// edges from every previously-held identity (§4.K).
    pub lock_identities: FxHashMap<LockKey, LockIdentity>,

    pub scope_stack: Vec<ScopeId>,
    pub await_depth: u32,
    /// Set for the duration of an entrypoint function's body, so `.await()`
    /// inside an entrypoint is accepted without a surrounding async block.
    pub in_entrypoint: bool,
    /// Set for the duration of a `@nonblocking` function's body, so a
    /// `blocking` block or a direct call to a non-`@nonblocking` function
    /// can be flagged when `AnalyzerOptions::enforce_nonblocking` is on.
    pub in_nonblocking: bool,
    pub return_stack: Vec<ReturnContext>,
    pub result: CheckResult,
    /// `const` symbols currently being evaluated, for `SemaConstCycle` detection.
    pub evaluating_consts: Vec<SymbolId>,
    /// Every declared contract's resolved field/method shape, keyed by its
    /// symbol, built once up front (§4.F) so bound satisfaction can be
    /// checked at any generic instantiation site regardless of declaration
    /// order.
    pub contract_shapes: FxHashMap<SymbolId, ContractShape>,
    /// `(owning item, type-parameter name) -> [(contract, contract type
    /// args)]`, the resolved contract bounds declared on each type
    /// parameter, built alongside `contract_shapes`.
    pub type_param_bounds: FxHashMap<(SymbolId, StringId), Vec<(SymbolId, Vec<TypeId>)>>,
}

impl<'a> CheckerState<'a> {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        builder: &'a Builder,
        symbols: &'a mut SymbolTable,
        interner: &'a mut TypeInterner,
        diagnostics: &'a mut DiagnosticBag,
        options: &'a AnalyzerOptions,
        resolver: &'a dyn NameResolver,
        lock_graph: &'a mut LockOrderGraph,
        file: FileId,
        cancel: CancellationToken,
        names: WellKnownNames,
    ) -> Self {
        let magic_index = MagicIndex::build(&*symbols, &*interner, resolver);
        let mut this = Self {
            builder,
            symbols,
            interner,
            diagnostics,
            options,
            resolver,
            lock_graph,
            file,
            cancel,
            names,
            magic_index,
            borrows: BorrowTable::new(),
            views: ViewTable::new(),
            concurrency: ConcurrencyTracker::new(),
            generics: GenericEnv::new(),
            lock_state: LockState::new(),
            lock_identities: FxHashMap::default(),
            scope_stack: Vec::new(),
            await_depth: 0,
            in_entrypoint: false,
            in_nonblocking: false,
            return_stack: Vec::new(),
            result: CheckResult::new(),
            evaluating_consts: Vec::new(),
            contract_shapes: FxHashMap::default(),
            type_param_bounds: FxHashMap::default(),
        };

        let invalid_to = this.magic_index.invalid_to.clone();
        for symbol_id in invalid_to {
            let span = this.builder.span(this.symbols.symbol(symbol_id).decl_site);
            let name = this.symbol_name_str(symbol_id).to_string();
            this.emit(
                Code::SemaInvalidToSignature,
                format!("'{name}' has an invalid '__to' signature: it must take exactly one parameter and return the conversion target"),
                span,
            );
        }
        this
    }

    pub fn push_scope(&mut self, scope: ScopeId) {
        self.scope_stack.push(scope);
    }

    /// Pop the current scope, tearing down its borrows and checking for
    /// unmatched spawned tasks (§4.I scope teardown, §4.L leak reporting).
    pub fn pop_scope(&mut self, span: Span) {
        if let Some(scope) = self.scope_stack.pop() {
            self.borrows.end_scope(scope, span);
            let leaked = self.concurrency.leaked_in_scope(scope);
            for task in leaked {
                let task_span = self.builder.span(task);
                self.emit(Code::SemaTaskNotAwaited, "spawned task is never awaited, returned, or stored", task_span);
            }
        }
    }

    #[must_use]
    pub fn current_scope(&self) -> Option<ScopeId> {
        self.scope_stack.last().copied()
    }

    pub fn push_return_context(&mut self, expected: TypeId, span: Span) {
        self.return_stack.push(ReturnContext { expected, span, terminal_return_seen: false });
    }

    pub fn pop_return_context(&mut self) -> Option<ReturnContext> {
        self.return_stack.pop()
    }

    #[must_use]
    pub fn current_return_context(&self) -> Option<&ReturnContext> {
        self.return_stack.last()
    }

    pub fn mark_terminal_return(&mut self) {
        if let Some(ctx) = self.return_stack.last_mut() {
            ctx.terminal_return_seen = true;
        }
    }

    pub fn enter_async(&mut self) {
        self.await_depth += 1;
    }

    pub fn exit_async(&mut self) {
        self.await_depth = self.await_depth.saturating_sub(1);
    }

    #[must_use]
    pub fn in_async_context(&self) -> bool {
        self.await_depth > 0 || self.in_entrypoint
    }

    /// Record the type of an expression in the result (§3 invariant: every
    /// visited `ExprID` gets an `ExprTypes` entry, possibly `NoTypeID`).
    pub fn set_expr_type(&mut self, expr: ExprId, ty: TypeId) -> TypeId {
        self.result.set_expr_type(expr, ty);
        ty
    }

    #[must_use]
    pub fn error_type(&self) -> TypeId {
        self.interner.builtins().error_
    }

    pub fn emit(&mut self, code: Code, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::new(code, code.default_severity(), message, span));
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn symbol_name_str(&self, symbol: SymbolId) -> &str {
        self.resolver.resolve(self.symbols.symbol(symbol).name)
    }

    /// Returns `false` (and emits `SemaConstCycle`) if `symbol` is already
    /// being evaluated on this stack; otherwise pushes it and returns `true`.
    pub fn begin_const_eval(&mut self, symbol: SymbolId, span: Span) -> bool {
        if self.evaluating_consts.contains(&symbol) {
            self.emit(Code::SemaConstCycle, "const definition cycle detected", span);
            return false;
        }
        self.evaluating_consts.push(symbol);
        true
    }

    pub fn end_const_eval(&mut self, symbol: SymbolId) {
        self.evaluating_consts.retain(|&s| s != symbol);
    }
}

