//! End-to-end `walk_file` scenarios: hand-built node/symbol trees standing
//! in for what an external parser/binder would hand the checker, the same
//! shape the teacher's own `tests/*.rs` integration tests use (parse,
//! bind, then drive the checker and assert on the emitted diagnostics).

use rustc_hash::FxHashMap;
use semacore_ast::{Attr, Builder, CompareArm, FileId, NodeKind, Symbol, SymbolFlags, SymbolKind, SymbolTable, TypeNode, TypeParamDecl};
use semacore_check::{walk_file, CheckerState, WellKnownNames};
use semacore_common::{AnalyzerOptions, CancellationToken, Code, DiagnosticBag, ExprId, Span, StringId, TypeId};
use semacore_concurrency::LockOrderGraph;
use semacore_types::{NameResolver, TypeInterner, TypeTerm, UnionMember};

struct FakeResolver(FxHashMap<StringId, String>);

impl NameResolver for FakeResolver {
    fn resolve(&self, id: StringId) -> &str {
        self.0.get(&id).map(String::as_str).unwrap_or("?")
    }
}

fn well_known_names() -> WellKnownNames {
    WellKnownNames {
        to: StringId::new(900),
        default: StringId::new(901),
        array: StringId::new(902),
        array_fixed: StringId::new(903),
        range: StringId::new(904),
        task: StringId::new(905),
        option: StringId::new(906),
        result: StringId::new(907),
        channel: StringId::new(908),
        map: StringId::new(909),
    }
}

fn plain_symbol(kind: SymbolKind, name: StringId, scope: semacore_common::ScopeId) -> Symbol {
    Symbol {
        name,
        kind,
        scope,
        decl_site: ExprId::new(0),
        ty: TypeId::NONE,
        type_params: Vec::new(),
        type_param_symbols: Vec::new(),
        flags: SymbolFlags::empty(),
        receiver_key: None,
    }
}

/// A function declared to return `int` whose body never reaches a
/// `return` on any path is `SemaMissingReturn`.
#[test]
fn a_non_unit_function_with_no_return_is_flagged() {
    let mut builder = Builder::new();
    let mut symbols = SymbolTable::new();
    let mut interner = TypeInterner::new();

    let mut names_map = FxHashMap::default();
    names_map.insert(StringId::new(50), "int".to_string());
    let resolver = FakeResolver(names_map);

    let module_scope = symbols.push_scope(None);
    let fn_sym = symbols.push_symbol(plain_symbol(SymbolKind::Function, StringId::new(1), module_scope));

    let ret_node = builder.push_type_node(TypeNode::Named { name: StringId::new(50), type_args: Vec::new(), value_args: Vec::new() });
    let body = builder.push_node(NodeKind::Block { stmts: Vec::new(), tail: None }, Span::dummy());
    let function_item = builder.push_node(
        NodeKind::FunctionItem {
            symbol: fn_sym,
            params: Vec::new(),
            ret: Some(ret_node),
            type_params: Vec::new(),
            body: Some(body),
            is_async: false,
            is_entrypoint: false,
            attrs: Vec::new(),
        },
        Span::dummy(),
    );
    builder.push_item(function_item);

    let mut diagnostics = DiagnosticBag::new();
    let mut lock_graph = LockOrderGraph::new();
    let options = AnalyzerOptions::default();
    let mut state = CheckerState::new(
        &builder,
        &mut symbols,
        &mut interner,
        &mut diagnostics,
        &options,
        &resolver,
        &mut lock_graph,
        FileId(0),
        CancellationToken::new(),
        well_known_names(),
    );
    walk_file(&mut state, module_scope);

    assert!(diagnostics.has_code(Code::SemaMissingReturn));
}

/// A type parameter bounded by a plain struct (not a contract) is
/// `SemaContractBoundNotContract`; a bound naming nothing resolvable is
/// `SemaContractBoundNotFound`.
#[test]
fn a_non_contract_bound_and_an_unresolved_bound_are_both_flagged() {
    let mut builder = Builder::new();
    let mut symbols = SymbolTable::new();
    let mut interner = TypeInterner::new();
    let resolver = FakeResolver(FxHashMap::default());

    let module_scope = symbols.push_scope(None);

    // A plain struct type, bound into scope under the name "Point".
    let point_name = StringId::new(10);
    let point_sym = symbols.push_symbol(plain_symbol(SymbolKind::Type, point_name, module_scope));
    symbols.bind(module_scope, point_name, point_sym);

    let point_bound = builder.push_type_node(TypeNode::Named { name: point_name, type_args: Vec::new(), value_args: Vec::new() });
    let missing_bound = builder.push_type_node(TypeNode::Named {
        name: StringId::new(999),
        type_args: Vec::new(),
        value_args: Vec::new(),
    });

    let type_param = TypeParamDecl { name: StringId::new(20), is_const: false, const_type: None, bounds: vec![point_bound, missing_bound] };

    let alias_sym = symbols.push_symbol(plain_symbol(SymbolKind::Type, StringId::new(30), module_scope));
    let alias_target = builder.push_type_node(TypeNode::Named { name: point_name, type_args: Vec::new(), value_args: Vec::new() });
    let alias_item = builder.push_node(
        NodeKind::AliasItem { symbol: alias_sym, target: alias_target, type_params: vec![type_param] },
        Span::dummy(),
    );
    builder.push_item(alias_item);

    let mut diagnostics = DiagnosticBag::new();
    let mut lock_graph = LockOrderGraph::new();
    let options = AnalyzerOptions::default();
    let mut state = CheckerState::new(
        &builder,
        &mut symbols,
        &mut interner,
        &mut diagnostics,
        &options,
        &resolver,
        &mut lock_graph,
        FileId(0),
        CancellationToken::new(),
        well_known_names(),
    );
    walk_file(&mut state, module_scope);

    assert!(diagnostics.has_code(Code::SemaContractBoundNotContract));
    assert!(diagnostics.has_code(Code::SemaContractBoundNotFound));
}

/// A `@nonblocking` function calling a callee that is neither
/// `@nonblocking` nor intrinsic is `SemaNonblockingViolation`.
#[test]
fn a_nonblocking_function_calling_a_blocking_function_is_flagged() {
    let mut builder = Builder::new();
    let mut symbols = SymbolTable::new();
    let mut interner = TypeInterner::new();
    let nonblocking_name = StringId::new(42);
    let mut names_map = FxHashMap::default();
    names_map.insert(nonblocking_name, "nonblocking".to_string());
    let resolver = FakeResolver(names_map);

    let module_scope = symbols.push_scope(None);
    let unit_ = interner.builtins().unit_;
    let fn_ty = interner.intern(TypeTerm::Fn { params: Vec::new(), ret: unit_ });

    let blocking_name = StringId::new(40);
    let mut blocking_sym = plain_symbol(SymbolKind::Function, blocking_name, module_scope);
    blocking_sym.ty = fn_ty;
    let blocking_fn = symbols.push_symbol(blocking_sym);
    symbols.bind(module_scope, blocking_name, blocking_fn);

    let callee_node = builder.push_node(NodeKind::Identifier(blocking_name), Span::dummy());
    symbols.set_node_symbol(callee_node, blocking_fn);
    let call_node = builder.push_node(NodeKind::Call { callee: callee_node, args: Vec::new(), explicit_type_args: Vec::new() }, Span::dummy());
    let body = builder.push_node(NodeKind::Block { stmts: vec![call_node], tail: None }, Span::dummy());

    let mut caller_sym = plain_symbol(SymbolKind::Function, StringId::new(41), module_scope);
    caller_sym.ty = interner.intern(TypeTerm::Fn { params: Vec::new(), ret: unit_ });
    let caller_fn = symbols.push_symbol(caller_sym);

    let function_item = builder.push_node(
        NodeKind::FunctionItem {
            symbol: caller_fn,
            params: Vec::new(),
            ret: None,
            type_params: Vec::new(),
            body: Some(body),
            is_async: false,
            is_entrypoint: false,
            attrs: vec![Attr::simple(nonblocking_name)],
        },
        Span::dummy(),
    );
    builder.push_item(function_item);

    let mut diagnostics = DiagnosticBag::new();
    let mut lock_graph = LockOrderGraph::new();
    let options = AnalyzerOptions { enforce_nonblocking: true, ..AnalyzerOptions::default() };
    let mut state = CheckerState::new(
        &builder,
        &mut symbols,
        &mut interner,
        &mut diagnostics,
        &options,
        &resolver,
        &mut lock_graph,
        FileId(0),
        CancellationToken::new(),
        well_known_names(),
    );
    walk_file(&mut state, module_scope);

    assert!(diagnostics.has_code(Code::SemaNonblockingViolation));
}

/// A `compare` over a tagged union with no catch-all arm and a missing tag
/// is `SemaNonExhaustiveCompare`.
#[test]
fn a_non_exhaustive_compare_over_a_tagged_union_is_flagged() {
    let mut builder = Builder::new();
    let mut symbols = SymbolTable::new();
    let mut interner = TypeInterner::new();
    let resolver = FakeResolver(FxHashMap::default());

    let module_scope = symbols.push_scope(None);

    let ok_tag = StringId::new(50);
    let err_tag = StringId::new(51);
    let union_name = StringId::new(52);
    let union_ty = interner.intern(TypeTerm::Union {
        name: union_name,
        members: vec![
            UnionMember::Tag { tag_name: ok_tag, tag_args: Vec::new() },
            UnionMember::Tag { tag_name: err_tag, tag_args: Vec::new() },
        ],
        type_args: Vec::new(),
    });

    let mut ok_sym = plain_symbol(SymbolKind::Tag, ok_tag, module_scope);
    ok_sym.ty = union_ty;
    let ok_symbol = symbols.push_symbol(ok_sym);

    let unit_ = interner.builtins().unit_;
    let mut subject_sym = plain_symbol(SymbolKind::Param, StringId::new(53), module_scope);
    subject_sym.ty = union_ty;
    let subject_symbol = symbols.push_symbol(subject_sym);

    let subject_node = builder.push_node(NodeKind::Identifier(StringId::new(53)), Span::dummy());
    symbols.set_node_symbol(subject_node, subject_symbol);

    let pattern_node = builder.push_node(NodeKind::Identifier(ok_tag), Span::dummy());
    symbols.set_node_symbol(pattern_node, ok_symbol);
    let arm_body = builder.push_node(NodeKind::LiteralNothing, Span::dummy());
    let compare_node = builder.push_node(
        NodeKind::Compare { subject: subject_node, arms: vec![CompareArm { pattern: pattern_node, guard: None, body: arm_body }] },
        Span::dummy(),
    );
    let body = builder.push_node(NodeKind::Block { stmts: Vec::new(), tail: Some(compare_node) }, Span::dummy());

    let mut fn_sym = plain_symbol(SymbolKind::Function, StringId::new(54), module_scope);
    fn_sym.ty = interner.intern(TypeTerm::Fn { params: Vec::new(), ret: unit_ });
    let fn_symbol = symbols.push_symbol(fn_sym);
    let function_item = builder.push_node(
        NodeKind::FunctionItem {
            symbol: fn_symbol,
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

    let mut diagnostics = DiagnosticBag::new();
    let mut lock_graph = LockOrderGraph::new();
    let options = AnalyzerOptions::default();
    let mut state = CheckerState::new(
        &builder,
        &mut symbols,
        &mut interner,
        &mut diagnostics,
        &options,
        &resolver,
        &mut lock_graph,
        FileId(0),
        CancellationToken::new(),
        well_known_names(),
    );
    walk_file(&mut state, module_scope);

    assert!(diagnostics.has_code(Code::SemaNonExhaustiveCompare));
}

/// An entrypoint function declaring its own generic type parameters is
/// `SemaEntrypointGeneric`.
#[test]
fn an_entrypoint_function_with_type_params_is_flagged() {
    let mut builder = Builder::new();
    let mut symbols = SymbolTable::new();
    let mut interner = TypeInterner::new();
    let resolver = FakeResolver(FxHashMap::default());

    let module_scope = symbols.push_scope(None);
    let unit_ = interner.builtins().unit_;

    let mut fn_sym = plain_symbol(SymbolKind::Function, StringId::new(60), module_scope);
    fn_sym.ty = interner.intern(TypeTerm::Fn { params: Vec::new(), ret: unit_ });
    fn_sym.type_params = vec![StringId::new(61)];
    let fn_symbol = symbols.push_symbol(fn_sym);

    let body = builder.push_node(NodeKind::Block { stmts: Vec::new(), tail: None }, Span::dummy());
    let type_param = TypeParamDecl { name: StringId::new(61), is_const: false, const_type: None, bounds: Vec::new() };
    let function_item = builder.push_node(
        NodeKind::FunctionItem {
            symbol: fn_symbol,
            params: Vec::new(),
            ret: None,
            type_params: vec![type_param],
            body: Some(body),
            is_async: false,
            is_entrypoint: true,
            attrs: Vec::new(),
        },
        Span::dummy(),
    );
    builder.push_item(function_item);

    let mut diagnostics = DiagnosticBag::new();
    let mut lock_graph = LockOrderGraph::new();
    let options = AnalyzerOptions::default();
    let mut state = CheckerState::new(
        &builder,
        &mut symbols,
        &mut interner,
        &mut diagnostics,
        &options,
        &resolver,
        &mut lock_graph,
        FileId(0),
        CancellationToken::new(),
        well_known_names(),
    );
    walk_file(&mut state, module_scope);

    assert!(diagnostics.has_code(Code::SemaEntrypointGeneric));
}
