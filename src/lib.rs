//! Type keys, the interning registry, recursive-datatype substitution, and
//! Martelli–Montanari unification for an ML-family interpreter.
//!
//! This crate is the type core only: it has no parser, no AST walker, no
//! evaluator, and does no I/O. A caller
//! builds [`Key`]s, asks a [`TypeRegistry`] for their canonical
//! [`TypeId`]s, converts those into [`Term`]s, and calls [`unify::unify`]
//! to solve a constraint set.

pub mod atom;
pub mod error;
pub mod key;
pub mod recursion;
pub mod registry;
pub mod substitute;
pub mod term;
pub mod transaction;
pub mod types;
pub mod unify;

pub use atom::{Atom, AtomTable};
pub use error::{CoreError, CoreResult};
pub use key::{Key, Primitive};
pub use recursion::{RecursionGuard, RecursionProfile, RecursionResult};
pub use registry::{DataTypeDef, TypeRegistry};
pub use term::{term_from_type, reify, Operator, Term};
pub use transaction::Transaction;
pub use types::{DataTypeNode, Type, TypeId};
pub use unify::{unify, Action, NoopTracer, Substitution, Tracer, TermPair, UnifyFailure};
