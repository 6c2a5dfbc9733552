//! Stable numeric codes and message templates for each `Code` variant.
//!
//! Message templates use `{0}`, `{1}`, ... placeholders filled in by
//! `format_message`. Numbers are grouped in blocks of 100 by family so a
//! new member can be added to a family without renumbering its neighbors.

use super::Code;

pub mod diagnostic_codes {
    use super::Code;

    #[must_use]
    pub fn number(code: Code) -> u32 {
        use Code::*;
        match code {
            SemaTypeMismatch => 1000,
            SemaExpectTypeOperand => 1001,
            SemaNoOverload => 1002,
            SemaAmbiguousOverload => 1003,
            SemaAmbiguousConversion => 1004,
            SemaIntrinsicBadContext => 1005,
            SemaMissingReturn => 1006,
            SemaIteratorNotImplemented => 1007,
            SemaCannotInferTypeParam => 1008,
            SemaTypeCannotBeUsedAsValue => 1009,
            SemaNonExhaustiveCompare => 1010,
            SemaInvalidToSignature => 1011,
            SemaEntrypointGeneric => 1012,

            SemaConstCycle => 1100,

            SemaBorrowConflict => 1200,
            SemaBorrowMutation => 1201,
            SemaBorrowMove => 1202,
            SemaBorrowThreadEscape => 1203,

            SemaContractMissingField => 1300,
            SemaContractFieldTypeError => 1301,
            SemaContractMissingMethod => 1302,
            SemaContractMethodMismatch => 1303,
            SemaContractSelfType => 1304,
            SemaContractBoundDuplicate => 1305,
            SemaContractBoundNotFound => 1306,
            SemaContractBoundNotContract => 1307,

            SemaLockUnbalanced => 1400,
            SemaLockDoubleAcquire => 1401,
            SemaLockReleaseNotHeld => 1402,
            SemaLockNotReleasedOnExit => 1403,
            SemaLockPotentialDeadlock => 1404,

            SemaTaskNotAwaited => 1500,
            SemaTaskEscapesScope => 1501,
            SemaChannelNotSendSafe => 1502,
            SemaNonblockingViolation => 1503,

            SemaUnknownAttr => 1600,
        }
    }
}

pub mod diagnostic_messages {
    pub const TYPE_MISMATCH: &str = "type mismatch: expected '{0}', found '{1}'";
    pub const EXPECT_TYPE_OPERAND: &str = "expected a type here, found a value";
    pub const NO_OVERLOAD: &str = "no matching overload for '{0}' on '{1}'";
    pub const AMBIGUOUS_OVERLOAD: &str = "ambiguous overload for '{0}': more than one candidate matches";
    pub const AMBIGUOUS_CONVERSION: &str =
        "ambiguous implicit conversion from '{0}' to '{1}': more than one '__to' candidate matches";
    pub const INTRINSIC_BAD_CONTEXT: &str = "'{0}' is not valid in this context";
    pub const MISSING_RETURN: &str = "function '{0}' is missing a return in some code path";
    pub const ITERATOR_NOT_IMPLEMENTED: &str = "'{0}' does not implement an iterator protocol";
    pub const CANNOT_INFER_TYPE_PARAM: &str =
        "cannot infer type parameter {0} for {1}; specify {1}::<{0}> or annotate";
    pub const TYPE_CANNOT_BE_USED_AS_VALUE: &str = "type '{0}' cannot be used as a value";
    pub const NON_EXHAUSTIVE_COMPARE: &str = "compare over '{0}' is not exhaustive: missing {1}";
    pub const INVALID_TO_SIGNATURE: &str = "'{0}' has an invalid '__to' signature: it must take exactly one parameter and return the conversion target";
    pub const ENTRYPOINT_GENERIC: &str = "entrypoint function '{0}' cannot declare generic type parameters";

    pub const CONST_CYCLE: &str = "const '{0}' depends on itself through a cycle";

    pub const BORROW_CONFLICT: &str = "cannot borrow '{0}' because it is already borrowed";
    pub const BORROW_MUTATION: &str = "cannot assign to '{0}' because it is borrowed";
    pub const BORROW_MOVE: &str = "cannot move '{0}' because it is borrowed";
    pub const BORROW_THREAD_ESCAPE: &str =
        "borrow of '{0}' cannot be captured by a non-local spawn or blocking block";

    pub const CONTRACT_MISSING_FIELD: &str = "type '{0}' is missing field '{1}' required by '{2}'";
    pub const CONTRACT_FIELD_TYPE_ERROR: &str =
        "field '{0}' on '{1}' has type '{2}', expected '{3}' to satisfy '{4}'";
    pub const CONTRACT_MISSING_METHOD: &str = "type '{0}' is missing method '{1}' required by '{2}'";
    pub const CONTRACT_METHOD_MISMATCH: &str = "method '{0}' on '{1}' does not match the signature required by '{2}'";
    pub const CONTRACT_SELF_TYPE: &str = "method '{0}' on '{1}' has an incompatible receiver type";
    pub const CONTRACT_BOUND_DUPLICATE: &str = "duplicate contract bound '{0}'";
    pub const CONTRACT_BOUND_NOT_FOUND: &str = "unknown contract '{0}'";
    pub const CONTRACT_BOUND_NOT_CONTRACT: &str = "'{0}' is not a contract and cannot be used as a bound";

    pub const LOCK_UNBALANCED: &str = "lock '{0}' is held on one branch but not the other";
    pub const LOCK_DOUBLE_ACQUIRE: &str = "lock '{0}' is already held";
    pub const LOCK_RELEASE_NOT_HELD: &str = "cannot release lock '{0}': it is not held";
    pub const LOCK_NOT_RELEASED_ON_EXIT: &str = "lock '{0}' is still held at function exit";
    pub const LOCK_POTENTIAL_DEADLOCK: &str = "potential deadlock: lock order cycle {0}";

    pub const TASK_NOT_AWAITED: &str = "task from '{0}' is never awaited, returned, or stored";
    pub const TASK_ESCAPES_SCOPE: &str = "module-level binding '{0}' holds an unawaited task";
    pub const CHANNEL_NOT_SEND_SAFE: &str = "'{0}' is not send-safe: reference and pointer types cannot cross a channel";
    pub const NONBLOCKING_VIOLATION: &str = "'@nonblocking' function '{0}' cannot call blocking operation '{1}'";

    pub const UNKNOWN_ATTR: &str = "unknown attribute '{0}' on {1}";
}

#[cfg(test)]
mod tests {
    use super::super::Code;
    use super::diagnostic_codes;

    #[test]
    fn every_family_has_a_distinct_number() {
        let codes = [
            Code::SemaTypeMismatch,
            Code::SemaBorrowConflict,
            Code::SemaContractMissingField,
            Code::SemaLockPotentialDeadlock,
            Code::SemaTaskNotAwaited,
            Code::SemaUnknownAttr,
        ];
        let mut numbers: Vec<u32> = codes.iter().map(|c| diagnostic_codes::number(*c)).collect();
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), codes.len());
    }
}
