//! Analyzer options threaded through the walker and its sub-components.
//!
//! Mirrors `CheckerOptions::apply_strict_defaults`'s pattern of a single
//! coarse flag fanning out to finer-grained ones.

/// Compiler/analyzer options for a single `check()` run.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    /// Enables every strictness flag below.
    pub strict: bool,
    /// Narrowing numeric literals without an explicit `to` is an error, not a warning.
    pub strict_narrowing: bool,
    /// `@nonblocking` functions that call a blocking-shaped function are an error.
    pub enforce_nonblocking: bool,
    /// Relax `LockUnbalanced` diagnostics inside functions using `try_lock` family calls.
    pub relax_lock_balance_under_try_lock: bool,
    /// When true, an external module-exports table is consulted for cross-file magic-method
    /// discovery during Magic Index construction.
    pub cross_file_magic_methods: bool,
    /// Hint from the driver that this compilation involves FFI/alien code, relaxing some
    /// borrow-thread-escape diagnostics for `@local` spawns (see `AlienHints` in §6).
    pub alien_hints: bool,
}

impl AnalyzerOptions {
    #[must_use]
    pub fn apply_strict_defaults(mut self) -> Self {
        if self.strict {
            self.strict_narrowing = true;
            self.enforce_nonblocking = true;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_flag_fans_out() {
        let opts = AnalyzerOptions { strict: true, ..Default::default() }.apply_strict_defaults();
        assert!(opts.strict_narrowing);
        assert!(opts.enforce_nonblocking);
    }

    #[test]
    fn non_strict_leaves_defaults() {
        let opts = AnalyzerOptions::default().apply_strict_defaults();
        assert!(!opts.strict_narrowing);
    }
}
