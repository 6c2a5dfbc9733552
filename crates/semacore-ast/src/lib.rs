//! External input contracts consumed by the semantic analysis core.
//!
//! Lexing, parsing, AST construction, and name resolution are out of scope
//! for this crate (and for the core as a whole) — they are treated as
//! external collaborators with a fixed contract. This crate defines only
//! the *shapes* those collaborators hand to the core: a flat node arena
//! (`Builder`), the tagged node kinds it stores, and a symbol/scope table
//! (`SymbolTable`) addressed by dense integer ids, matching
//! `tsz_parser::NodeArena` / `tsz_binder::SymbolTable`'s flat-arena idiom.
//!
//! Nothing here parses source text; tests and the checker's own test suite
//! construct these contracts directly via `Builder`'s push methods, the way
//! `tsz-checker`'s unit tests build `NodeArena`s by hand rather than
//! invoking the scanner/parser.

pub mod attr;
pub mod builder;
pub mod node;
pub mod symbol;
pub mod type_node;

pub use attr::{Attr, AttrArg};
pub use builder::Builder;
pub use node::{
    BinaryOp, CompareArm, ContractMethod, FieldInit, Node, NodeKind, Param, SelectArm, TypeParamDecl, UnaryOp,
};
pub use symbol::{Scope, Symbol, SymbolFlags, SymbolKind, SymbolTable};
pub use type_node::{ConstArg, TypeNode, TypeNodeId};

use semacore_common::ExprId;

/// Opaque identifier for a source file within a compilation session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FileId(pub u32);

/// Cross-file magic-method discovery table, built by the driver from every
/// other file's Magic Index and handed to this file's checker so `impl`s in
/// one module are visible from another.
#[derive(Clone, Debug, Default)]
pub struct ModuleExports {
    pub receiver_methods: rustc_hash::FxHashMap<semacore_common::StringId, Vec<ExprId>>,
}
