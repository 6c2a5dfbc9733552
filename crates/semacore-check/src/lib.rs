//! Expression typing, item/statement walking, generics, contracts,
//! conversion, and result assembly — the components that sit directly on
//! top of the interners/indexes (`semacore-types`) and the borrow/lock
//! trackers (`semacore-borrow`, `semacore-concurrency`).

pub mod context;
pub mod contracts;
pub mod conversion;
pub mod expr;
pub mod generics;
pub mod magic_index;
pub mod result;
pub mod types;
pub mod walker;

pub use context::{CheckerState, ReturnContext};
pub use contracts::{check_contract, validate_bounds, BoundIssue, ContractIssue, ContractMethodSig, ContractShape};
pub use conversion::{is_defaultable, resolve_implicit_to, unify_branches, widens, ToOutcome, WellKnownNames};
pub use expr::type_expr;
pub use generics::{substitute, unify, GenericEnv, GenericScope};
pub use magic_index::{resolve_overload, resolve_overload_named, MagicIndex, Resolution, Signature};
pub use result::{ArgTuple, CheckResult, ImplicitConversion};
pub use types::resolve_type_node;
pub use walker::walk_file;
