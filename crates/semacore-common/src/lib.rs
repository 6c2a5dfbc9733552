//! Common types shared across the semantic analysis core.
//!
//! This crate provides foundational types used by every other
//! `semacore-*` crate:
//! - Dense interned ids (`StringId`, `ExprId`, `SymbolId`, `ScopeId`, `TypeId`, `BorrowId`)
//! - Source spans (`Span`)
//! - Diagnostics (`Diagnostic`, `Code`, `Severity`, `DiagnosticBag`)
//! - Analyzer options (`AnalyzerOptions`)
//! - Named limits (recursion depth caps, etc.)

pub mod cancel;
pub mod diagnostics;
pub mod ids;
pub mod limits;
pub mod options;
pub mod span;

pub use cancel::CancellationToken;
pub use diagnostics::{Code, Diagnostic, DiagnosticBag, Severity};
pub use ids::{BorrowId, ExprId, ScopeId, StringId, SymbolId, TypeId};
pub use options::AnalyzerOptions;
pub use span::Span;
