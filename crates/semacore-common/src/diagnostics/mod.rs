//! Diagnostic types and message lookup for the semantic analysis core.
//!
//! Stable message text lives in `data.rs`. Every diagnostic carries a
//! stable numeric `Code` so downstream tooling (editors, CI) can key off
//! it independent of message wording.

mod data;
pub use data::{diagnostic_codes, diagnostic_messages};

use crate::span::Span;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Suggestion,
}

/// A single diagnostic message, spanning a location in the file under check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: Code,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub related: Vec<RelatedInfo>,
}

/// A "see also" location attached to a diagnostic (e.g. where a contract was declared).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedInfo {
    pub message: String,
    pub span: Span,
}

/// A proposed edit, attached when the checker can mechanically suggest a fix
/// (e.g. replacing a value operand with its type in an `is`/`to` expression).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuickFix {
    pub span: Span,
    pub replacement: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(code: Code, severity: Severity, message: impl Into<String>, span: Span) -> Self {
        Self { code, severity, message: message.into(), span, related: Vec::new() }
    }

    #[must_use]
    pub fn error(code: Code, message: impl Into<String>, span: Span) -> Self {
        Self::new(code, Severity::Error, message, span)
    }

    #[must_use]
    pub fn with_related(mut self, message: impl Into<String>, span: Span) -> Self {
        self.related.push(RelatedInfo { message: message.into(), span });
        self
    }
}

/// Stable diagnostic code families, one variant per `Sema*` group named in §6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Code {
    // --- Type mismatch & core typing ---
    SemaTypeMismatch,
    SemaExpectTypeOperand,
    SemaNoOverload,
    SemaAmbiguousOverload,
    SemaAmbiguousConversion,
    SemaIntrinsicBadContext,
    SemaMissingReturn,
    SemaIteratorNotImplemented,
    SemaCannotInferTypeParam,
    SemaTypeCannotBeUsedAsValue,
    SemaNonExhaustiveCompare,
    SemaInvalidToSignature,
    SemaEntrypointGeneric,

    // --- Const evaluation ---
    SemaConstCycle,

    // --- Borrow checker ---
    SemaBorrowConflict,
    SemaBorrowMutation,
    SemaBorrowMove,
    SemaBorrowThreadEscape,

    // --- Contract matcher ---
    SemaContractMissingField,
    SemaContractFieldTypeError,
    SemaContractMissingMethod,
    SemaContractMethodMismatch,
    SemaContractSelfType,
    SemaContractBoundDuplicate,
    SemaContractBoundNotFound,
    SemaContractBoundNotContract,

    // --- Lock analyzer / lock order graph ---
    SemaLockUnbalanced,
    SemaLockDoubleAcquire,
    SemaLockReleaseNotHeld,
    SemaLockNotReleasedOnExit,
    SemaLockPotentialDeadlock,

    // --- Structured concurrency ---
    SemaTaskNotAwaited,
    SemaTaskEscapesScope,
    SemaChannelNotSendSafe,
    SemaNonblockingViolation,

    // --- Attribute validation ---
    SemaUnknownAttr,
}

impl Code {
    /// Numeric code, stable across releases; grouped by family in blocks of 100.
    #[must_use]
    pub fn number(self) -> u32 {
        diagnostic_codes::number(self)
    }

    #[must_use]
    pub fn default_severity(self) -> Severity {
        use Code::*;
        match self {
            SemaLockUnbalanced | SemaUnknownAttr => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, ... with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Append-only collection of diagnostics produced during a check run.
///
/// Diagnostics are appended in walk order, which (per §5) is source order
/// for a given file; callers never need to sort before presenting them.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    #[must_use]
    pub fn has_code(&self, code: Code) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_message_substitutes_positional_args() {
        let out = format_message("expected '{0}', found '{1}'", &["int", "string"]);
        assert_eq!(out, "expected 'int', found 'string'");
    }

    #[test]
    fn bag_preserves_insertion_order() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::error(Code::SemaTypeMismatch, "a", Span::at(0)));
        bag.push(Diagnostic::error(Code::SemaBorrowMove, "b", Span::at(1)));
        let drained = bag.drain();
        assert_eq!(drained[0].code, Code::SemaTypeMismatch);
        assert_eq!(drained[1].code, Code::SemaBorrowMove);
        assert!(bag.is_empty());
    }
}
