//! The unifier's term language: Variable, Atom, Sequence,
//! encoding functions, tuples, records, lists, and datatypes uniformly so
//! the unifier's three queues never need a type-specific rule.
//!
//! Converting a [`crate::types::TypeId`] into a [`Term`] and reifying a
//! solved [`Term`] back into a `TypeId` live here too — the unifier itself
//! only ever sees `Term`s, but every caller thinks in `TypeId`s.

use crate::atom::Atom;
use crate::error::CoreResult;
use crate::key::Primitive;
use crate::registry::TypeRegistry;
use crate::types::{Type, TypeId};
use rustc_hash::FxHashMap;
use std::fmt;

/// The symbol half of a Sequence/Atom term. Two Sequences are compatible
/// iff their `Operator`s are
/// equal — arity is baked into the variants that need it (`Tuple`,
/// `Record`, `Named`) so operator-equality alone decides compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Fn,
    List,
    Tuple { arity: usize },
    /// Labels sorted by the record-label ordering policy; the label list
    /// itself is part of the operator, so `{x:_}` and `{x:_,y:_}` are
    /// incompatible operators, not an arity mismatch on one operator.
    Record { labels: Vec<Atom> },
    Primitive(Primitive),
    /// A user-defined nullary name (atom, arity 0) or an applied datatype
    /// name with its argument count (sequence, arity = `arity`).
    Named { name: Atom, arity: usize },
}

impl Operator {
    pub fn arity(&self) -> usize {
        match self {
            Operator::Fn => 2,
            Operator::List => 1,
            Operator::Tuple { arity } => *arity,
            Operator::Record { labels } => labels.len(),
            Operator::Primitive(_) => 0,
            Operator::Named { arity, .. } => *arity,
        }
    }
}

/// A term in the unification problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// An inference variable. Distinct from a scheme's bound ordinal; the
    /// unifier never sees ordinals, only variables produced by
    /// `fresh_var`/caller-supplied identifiers.
    Variable(u32),
    Atom(Operator),
    /// Always non-empty; an empty-children Sequence would just be an Atom.
    Sequence(Operator, Vec<Term>),
}

impl Term {
    pub fn var(id: u32) -> Term {
        Term::Variable(id)
    }

    pub fn operator(&self) -> Option<&Operator> {
        match self {
            Term::Variable(_) => None,
            Term::Atom(op) | Term::Sequence(op, _) => Some(op),
        }
    }

    pub fn children(&self) -> &[Term] {
        match self {
            Term::Sequence(_, children) => children,
            Term::Variable(_) | Term::Atom(_) => &[],
        }
    }

    /// Total symbol count, used only by the termination argument in
    /// `crate::unify` doc comments / tests — not load-bearing at runtime
    /// since the engine terminates via the recursion/iteration budget too.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(Term::size).sum::<usize>()
    }

    /// Does this term mention `v` anywhere (including itself)? Used by the
    /// occurs-check.
    pub fn contains_var(&self, v: u32) -> bool {
        match self {
            Term::Variable(w) => *w == v,
            Term::Atom(_) => false,
            Term::Sequence(_, children) => children.iter().any(|c| c.contains_var(v)),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Fn => write!(f, "fn"),
            Operator::List => write!(f, "list"),
            Operator::Tuple { arity } => write!(f, "tuple/{arity}"),
            Operator::Record { labels } => write!(f, "record/{}", labels.len()),
            Operator::Primitive(p) => write!(f, "{}", p.name()),
            Operator::Named { arity, .. } => write!(f, "name/{arity}"),
        }
    }
}

/// Converts a `TypeId` into a `Term`, numbering every distinct `Var(i)`
/// ordinal it reaches as the identically-numbered `Term::Variable(i)` —
/// valid because by this point in the pipeline a type handed to the
/// unifier only contains inference variables, never bound scheme/datatype
/// ordinals (those are stripped by `apply` before unification ever sees
/// the type).
pub fn term_from_type(registry: &TypeRegistry, id: TypeId) -> Term {
    match registry.resolve(id) {
        Type::Var(i) => Term::Variable(i),
        Type::Primitive(p) => Term::Atom(Operator::Primitive(p)),
        Type::Dummy => Term::Atom(Operator::Named {
            name: registry.intern_string("dummy"),
            arity: 0,
        }),
        Type::Function { param, result } => Term::Sequence(
            Operator::Fn,
            vec![term_from_type(registry, param), term_from_type(registry, result)],
        ),
        Type::List(elem) => Term::Sequence(Operator::List, vec![term_from_type(registry, elem)]),
        Type::Tuple(elems) => Term::Sequence(
            Operator::Tuple { arity: elems.len() },
            elems.iter().map(|e| term_from_type(registry, *e)).collect(),
        ),
        Type::Record { fields, .. } => {
            let labels: Vec<Atom> = fields.iter().map(|(l, _)| *l).collect();
            let children = fields.iter().map(|(_, t)| term_from_type(registry, *t)).collect();
            Term::Sequence(Operator::Record { labels }, children)
        }
        Type::DataType(node) => {
            let op = Operator::Named {
                name: node.name,
                arity: node.args.len(),
            };
            if node.args.is_empty() {
                Term::Atom(op)
            } else {
                Term::Sequence(
                    op,
                    node.args.iter().map(|a| term_from_type(registry, *a)).collect(),
                )
            }
        }
        Type::Alias { body, .. } => term_from_type(registry, body),
        Type::Scheme { .. } | Type::Overloaded(_) => {
            // Unification never receives a bare scheme or overload set
            // directly; callers apply/resolve first. Represented opaquely
            // so a stray occurrence doesn't panic.
            Term::Atom(Operator::Named {
                name: registry.intern_string("<unsupported-term-source>"),
                arity: 0,
            })
        }
    }
}

/// Rebuilds a concrete `TypeId` from a `Term` fully resolved through a
/// substitution (every reachable `Variable` must map to a non-variable
/// term, or `unresolved` is used as a stand-in — practically, callers
/// reify only after confirming the substitution closes every variable
/// they care about).
pub fn reify(
    registry: &TypeRegistry,
    term: &Term,
    bindings: &FxHashMap<u32, Term>,
    unresolved: TypeId,
) -> CoreResult<TypeId> {
    match term {
        Term::Variable(v) => match bindings.get(v) {
            Some(bound) => reify(registry, bound, bindings, unresolved),
            None => Ok(unresolved),
        },
        Term::Atom(Operator::Primitive(p)) => registry.type_for(&crate::key::Key::Primitive(*p)),
        Term::Atom(Operator::Named { name, .. }) => registry.lookup(&registry.resolve_atom(*name)),
        Term::Atom(_) => Err(crate::error::CoreError::InternalInvariant(
            "atom term with a non-nullary operator".to_string(),
        )),
        Term::Sequence(Operator::Fn, children) => {
            let param = reify(registry, &children[0], bindings, unresolved)?;
            let result = reify(registry, &children[1], bindings, unresolved)?;
            registry.fn_type(param, result)
        }
        Term::Sequence(Operator::List, children) => {
            let elem = reify(registry, &children[0], bindings, unresolved)?;
            registry.list_type(elem)
        }
        Term::Sequence(Operator::Tuple { .. }, children) => {
            let elems = children
                .iter()
                .map(|c| reify(registry, c, bindings, unresolved))
                .collect::<CoreResult<Vec<_>>>()?;
            registry.tuple_type(&elems)
        }
        Term::Sequence(Operator::Record { labels }, children) => {
            let fields = labels
                .iter()
                .zip(children)
                .map(|(label, c)| {
                    reify(registry, c, bindings, unresolved)
                        .map(|ty| (registry.resolve_atom(*label), ty))
                })
                .collect::<CoreResult<Vec<_>>>()?;
            registry.record_type(&fields)
        }
        Term::Sequence(Operator::Named { name, .. }, children) => {
            let scheme_or_datatype = registry.lookup(&registry.resolve_atom(*name))?;
            let args = children
                .iter()
                .map(|c| reify(registry, c, bindings, unresolved))
                .collect::<CoreResult<Vec<_>>>()?;
            registry.apply(scheme_or_datatype, &args)
        }
        Term::Sequence(Operator::Primitive(_), _) => Err(crate::error::CoreError::InternalInvariant(
            "primitive operator used with children".to_string(),
        )),
    }
}
