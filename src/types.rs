//! The canonical [`Type`] nodes and the [`TypeId`] arena handle that
//! identifies them.
//!
//! `Type` values are immutable once registered; the registry is the only
//! thing that builds one, via [`crate::key::Key::substitute`] plus a lookup
//! or fresh allocation in its arena.

use crate::atom::Atom;
use crate::key::Primitive;

/// An index into a [`crate::registry::TypeRegistry`]'s arena. Two `TypeId`s
/// are equal iff they name the same arena slot; because the registry
/// guarantees at most one `Type` per reachable `Key`, `TypeId` equality
/// *is* the uniqueness invariant — no
/// separate structural comparison is ever needed once two types are
/// interned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub(crate) const fn from_index(index: u32) -> Self {
        TypeId(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

// Fixed slots assigned at registry construction: the registry
// constructor pre-populates the six primitives and the distinguished
// `dummy` type. The order here must match
// `TypeRegistry::new`'s insertion order.
impl TypeId {
    pub const BOOL: TypeId = TypeId(0);
    pub const CHAR: TypeId = TypeId(1);
    pub const INT: TypeId = TypeId(2);
    pub const REAL: TypeId = TypeId(3);
    pub const STRING: TypeId = TypeId(4);
    pub const UNIT: TypeId = TypeId(5);
    pub const DUMMY: TypeId = TypeId(6);
}

/// A datatype node: name, applied argument types (empty until applied),
/// and an ordered constructor map. `arity` is the datatype's *declared*
/// parameter count; `args.len()` is either `0` (un-applied) or `arity`
/// (fully applied) — partial application is never allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeNode {
    pub name: Atom,
    pub arity: u32,
    pub args: Vec<TypeId>,
    /// Declaration order, not label order — constructors are not records.
    pub constructors: Vec<(Atom, TypeId)>,
    /// Set for datatypes declared together in one `data_types` call;
    /// used only for diagnostics
    /// the core itself never renders, kept for callers that want to know
    /// which sibling types a recursive reference could resolve to.
    pub mutual_group: Option<u32>,
}

/// A canonical type node. Every variant that holds children holds them
/// as [`TypeId`]s — already-canonical, so hashing/equating a composite
/// `Key` never needs to hash a child's full structure, only its `TypeId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Primitive(Primitive),
    /// An inference variable or a scheme/datatype-bound ordinal, depending
    /// on which counter produced it. The core never
    /// tags which; it is a caller discipline, enforced structurally by
    /// `apply` always stripping bound ordinals before a type can reach the
    /// unifier.
    Var(u32),
    Function { param: TypeId, result: TypeId },
    List(TypeId),
    /// Length >= 2.
    Tuple(Vec<TypeId>),
    /// Ascending label order; never tuple-shaped (both invariants enforced
    /// at construction by [`crate::key::Key::record`] before interning).
    Record {
        fields: Vec<(Atom, TypeId)>,
        /// A progressive record may gain fields on demand.
        progressive: bool,
    },
    DataType(DataTypeNode),
    Scheme { body: TypeId, arity: u32 },
    Alias { name: Atom, body: TypeId },
    /// A finite set of candidate types, resolved by
    /// unification via intersection.
    Overloaded(Vec<TypeId>),
    /// The single distinguished payload type for nullary constructors.
    /// Distinct from `unit`: `unit` is a general-purpose type, `Dummy` is
    /// only ever valid as a constructor payload.
    Dummy,
}

impl Type {
    pub fn is_dummy(&self) -> bool {
        matches!(self, Type::Dummy)
    }

    /// Direct children, in the order substitution/DFS should visit them.
    /// Used by both the recursive-datatype DFS and generalization; does
    /// not recurse itself.
    pub fn children(&self) -> Vec<TypeId> {
        match self {
            Type::Primitive(_) | Type::Var(_) | Type::Dummy => vec![],
            Type::Function { param, result } => vec![*param, *result],
            Type::List(elem) => vec![*elem],
            Type::Tuple(elems) => elems.clone(),
            Type::Record { fields, .. } => fields.iter().map(|(_, t)| *t).collect(),
            Type::DataType(node) => node
                .args
                .iter()
                .copied()
                .chain(node.constructors.iter().map(|(_, t)| *t))
                .collect(),
            Type::Scheme { body, .. } => vec![*body],
            Type::Alias { body, .. } => vec![*body],
            Type::Overloaded(candidates) => candidates.clone(),
        }
    }
}
