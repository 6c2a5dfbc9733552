//! Semantic analysis core entry point.
//!
//! Lexing, parsing, and name resolution are external collaborators (§ input
//! contract in `semacore-ast`); this crate wires their output — a flat node
//! arena and symbol table — through the type interner (`semacore-types`)
//! and the component crates (`semacore-check`, `semacore-borrow`,
//! `semacore-concurrency`) and produces one file's `CheckOutcome`.

use semacore_ast::{Builder, FileId, SymbolTable};
use semacore_check::{walk_file, CheckResult, CheckerState, WellKnownNames};
use semacore_common::{AnalyzerOptions, CancellationToken, DiagnosticBag, ScopeId};
use semacore_concurrency::LockOrderGraph;
use semacore_types::{NameResolver, TypeInterner};

/// Everything the checker needs to analyze one file, borrowed for the
/// duration of the call.
pub struct CheckContext<'a> {
    pub builder: &'a Builder,
    pub symbols: &'a mut SymbolTable,
    pub interner: &'a mut TypeInterner,
    pub resolver: &'a dyn NameResolver,
    pub options: AnalyzerOptions,
    pub file: FileId,
    /// The scope `builder.items()` executes in — typically the file's root scope.
    pub module_scope: ScopeId,
    pub names: WellKnownNames,
}

/// The outcome of checking one file: the typed artifact plus whatever
/// diagnostics were raised walking it.
#[derive(Debug, Default)]
pub struct CheckOutcome {
    pub result: CheckResult,
    pub diagnostics: DiagnosticBag,
}

/// Owns the one piece of state that spans an entire compilation rather
/// than resetting per file: the lock-order graph (§4.K). A lock-order
/// cycle can span two modules that never call each other directly, so a
/// single `Session` checks every file of a compilation in turn, sharing
/// its graph across calls.
#[derive(Debug, Default)]
pub struct Session {
    lock_graph: LockOrderGraph,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run expression typing, borrow/move checking, contract matching,
    /// generic instantiation, and lock discipline over one file.
    #[tracing::instrument(level = "debug", skip_all, fields(file = ctx.file.0))]
    pub fn check(&mut self, ctx: CheckContext<'_>, cancel: CancellationToken) -> CheckOutcome {
        let mut diagnostics = DiagnosticBag::new();
        let result = {
            let mut state = CheckerState::new(
                ctx.builder,
                ctx.symbols,
                ctx.interner,
                &mut diagnostics,
                &ctx.options,
                ctx.resolver,
                &mut self.lock_graph,
                ctx.file,
                cancel,
                ctx.names,
            );
            walk_file(&mut state, ctx.module_scope);
            state.result
        };
        tracing::debug!(diagnostic_count = diagnostics.len(), "file checked");
        CheckOutcome { result, diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semacore_ast::{NodeKind, Symbol, SymbolFlags, SymbolKind, TypeNode};
    use semacore_common::{ExprId, Span, StringId, TypeId};
    use std::collections::HashMap;

    struct FakeResolver(HashMap<StringId, String>);
    impl NameResolver for FakeResolver {
        fn resolve(&self, id: StringId) -> &str {
            self.0.get(&id).map(String::as_str).unwrap_or("?")
        }
    }

    fn well_known_names() -> WellKnownNames {
        WellKnownNames {
            to: StringId::new(100),
            default: StringId::new(101),
            array: StringId::new(102),
            array_fixed: StringId::new(103),
            range: StringId::new(104),
            task: StringId::new(105),
            option: StringId::new(106),
            result: StringId::new(107),
            channel: StringId::new(108),
            map: StringId::new(109),
        }
    }

    fn let_symbol(scope: ScopeId, name: StringId) -> Symbol {
        Symbol {
            name,
            kind: SymbolKind::Let,
            scope,
            decl_site: ExprId::new(0),
            ty: TypeId::NONE,
            type_params: Vec::new(),
            type_param_symbols: Vec::new(),
            flags: SymbolFlags::empty(),
            receiver_key: None,
        }
    }

    #[test]
    fn an_empty_file_checks_clean() {
        let builder = Builder::new();
        let mut symbols = SymbolTable::new();
        let mut interner = TypeInterner::new();
        let resolver = FakeResolver(HashMap::new());
        let module_scope = symbols.push_scope(None);

        let mut session = Session::new();
        let ctx = CheckContext {
            builder: &builder,
            symbols: &mut symbols,
            interner: &mut interner,
            resolver: &resolver,
            options: AnalyzerOptions::default(),
            file: FileId(0),
            module_scope,
            names: well_known_names(),
        };
        let outcome = session.check(ctx, CancellationToken::new());
        assert!(outcome.diagnostics.is_empty());
        assert!(outcome.result.expr_types.is_empty());
    }

    #[test]
    fn a_bool_let_initialized_with_an_int_literal_is_flagged() {
        let mut builder = Builder::new();
        let mut symbols = SymbolTable::new();
        let mut interner = TypeInterner::new();

        let mut names_map = HashMap::new();
        names_map.insert(StringId::new(50), "bool".to_string());
        let resolver = FakeResolver(names_map);

        let module_scope = symbols.push_scope(None);
        let let_sym = symbols.push_symbol(let_symbol(module_scope, StringId::new(1)));

        let bool_ty_node = builder.push_type_node(TypeNode::Named {
            name: StringId::new(50),
            type_args: Vec::new(),
            value_args: Vec::new(),
        });
        let init = builder.push_node(NodeKind::LiteralInt(1), Span::dummy());
        let let_stmt = builder.push_node(
            NodeKind::LetStmt { symbol: let_sym, ty: Some(bool_ty_node), init: Some(init), attrs: Vec::new() },
            Span::dummy(),
        );
        let body = builder.push_node(NodeKind::Block { stmts: vec![let_stmt], tail: None }, Span::dummy());

        let fn_sym = symbols.push_symbol(Symbol {
            name: StringId::new(2),
            kind: SymbolKind::Function,
            scope: module_scope,
            decl_site: ExprId::new(0),
            ty: TypeId::NONE,
            type_params: Vec::new(),
            type_param_symbols: Vec::new(),
            flags: SymbolFlags::empty(),
            receiver_key: None,
        });
        let function_item = builder.push_node(
            NodeKind::FunctionItem {
                symbol: fn_sym,
                params: Vec::new(),
                ret: None,
                type_params: Vec::new(),
                body: Some(body),
                is_async: false,
                is_entrypoint: false,
                attrs: Vec::new(),
            },
            Span::dummy(),
        );
        builder.push_item(function_item);

        let mut session = Session::new();
        let ctx = CheckContext {
            builder: &builder,
            symbols: &mut symbols,
            interner: &mut interner,
            resolver: &resolver,
            options: AnalyzerOptions::default(),
            file: FileId(0),
            module_scope,
            names: well_known_names(),
        };
        let outcome = session.check(ctx, CancellationToken::new());
        assert!(outcome.diagnostics.has_code(semacore_common::Code::SemaTypeMismatch));
    }
}
