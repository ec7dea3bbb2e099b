//! The five error kinds the core exposes.
//!
//! `UnknownName` and `ArityMismatch` are programming errors: callers are
//! expected to propagate them with `?` rather than match on them at every
//! call site. `InternalInvariant` additionally poisons the owning
//! [`crate::registry::TypeRegistry`] (see its doc comment).

use std::fmt;

/// Failure kinds for registry- and substitution-level operations.
///
/// Unification failures (`Conflict`, `Cycle`) are a separate type,
/// [`crate::unify::UnifyFailure`], returned as *data* from `unify` rather
/// than treated as exceptional control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// `lookup(name)` on a name the registry has never seen.
    UnknownName(String),
    /// `data_types` declaring a name that is already bound.
    DuplicateName(String),
    /// `substitute`/`apply` called with the wrong number of arguments for a
    /// scheme or datatype's declared arity.
    ArityMismatch { expected: u32, found: u32 },
    /// A DFS-shaped operation (recursive-datatype substitution, unification)
    /// ran past its [`crate::recursion::RecursionProfile`] budget. Not fatal
    /// by itself; the registry is not poisoned.
    RecursionLimitExceeded { operation: &'static str },
    /// A core structural invariant was violated. Fatal: the registry that raised this is
    /// poisoned and must be discarded.
    InternalInvariant(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::UnknownName(name) => write!(f, "unknown name: {name}"),
            CoreError::DuplicateName(name) => write!(f, "name already declared: {name}"),
            CoreError::ArityMismatch { expected, found } => {
                write!(f, "arity mismatch: expected {expected} argument(s), found {found}")
            }
            CoreError::RecursionLimitExceeded { operation } => {
                write!(f, "recursion limit exceeded during {operation}")
            }
            CoreError::InternalInvariant(detail) => {
                write!(f, "internal invariant violated: {detail}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;
