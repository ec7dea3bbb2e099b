//! The Martelli–Montanari unification engine: three shape-partitioned
//! queues (`delete`, `sequence-sequence`, `variable-any`), an occurs-check,
//! and an `Action` hook fired after each variable is bound.
//!
//! `Substitution` remembers *insertion order* separately from the
//! `ena`-backed union-find table that actually resolves a variable's
//! current binding; the table makes repeated lookups during rebucketing
//! cheap, the `Vec<u32>` makes iteration deterministic.

use crate::term::{Operator, Term};
use ena::unify::{InPlaceUnificationTable, NoError, UnifyKey, UnifyValue};
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_BY: usize = 1024 * 1024;

/// Recurse with a guard against stack overflow on deeply nested terms.
fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_BY, f)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InferVar(u32);

impl UnifyKey for InferVar {
    type Value = Option<()>;
    fn index(&self) -> u32 {
        self.0
    }
    fn from_index(i: u32) -> Self {
        InferVar(i)
    }
    fn tag() -> &'static str {
        "InferVar"
    }
}

impl UnifyValue for Option<()> {
    type Error = NoError;
    fn unify_values(a: &Self, b: &Self) -> Result<Self, NoError> {
        Ok(a.or(*b))
    }
}

pub type TermPair = (Term, Term);

/// Failure kinds the unifier returns as data rather than raising.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifyFailure {
    Conflict { left: Term, right: Term },
    Cycle { variable: u32, term: Term },
}

/// The result of a successful `unify`: a stable-order mapping from
/// variable to its solved term.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    order: Vec<u32>,
    bindings: FxHashMap<u32, Term>,
}

impl Substitution {
    pub fn get(&self, var: u32) -> Option<&Term> {
        self.bindings.get(&var)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Term)> {
        self.order.iter().map(move |v| (*v, &self.bindings[v]))
    }

    fn insert(&mut self, var: u32, term: Term) {
        if self.bindings.insert(var, term).is_none() {
            self.order.push(var);
        }
    }

    /// Fully resolves `term` by repeated lookup, used by callers (and by
    /// `idempotence of unifier`-style tests) to apply the substitution to
    /// an arbitrary term.
    pub fn resolve(&self, term: &Term) -> Term {
        with_stack(|| self.resolve_inner(term))
    }

    fn resolve_inner(&self, term: &Term) -> Term {
        match term {
            Term::Variable(v) => match self.bindings.get(v) {
                Some(bound) => self.resolve_inner(bound),
                None => term.clone(),
            },
            Term::Atom(_) => term.clone(),
            Term::Sequence(op, children) => Term::Sequence(
                op.clone(),
                children.iter().map(|c| self.resolve_inner(c)).collect(),
            ),
        }
    }
}

/// Caller hook fired once after `v`'s binding is recorded. May enqueue more
/// pairs through `add_pair`; must not mutate the substitution directly, so
/// it only receives a read view of it.
pub trait Action {
    fn run(&mut self, var: u32, term: &Term, bindings: &Substitution, add_pair: &mut dyn FnMut(Term, Term));
}

/// Structured tracer events; every method is a no-op by default, so
/// implementers only override what they observe.
pub trait Tracer {
    fn delete(&mut self, _left: &Term, _right: &Term) {}
    fn decompose(&mut self, _left: &Term, _right: &Term) {}
    fn variable(&mut self, _var: u32, _term: &Term) {}
    fn conflict(&mut self, _left: &Term, _right: &Term) {}
    fn cycle(&mut self, _var: u32, _term: &Term) {}
    fn swap(&mut self, _left: &Term, _right: &Term) {}
    fn substitute(&mut self, _var: u32, _term: &Term, _pair: &TermPair) {}
}

pub struct NoopTracer;
impl Tracer for NoopTracer {}

const MAX_ACTION_REENTRY: u32 = 2;

struct Queues {
    delete: VecDeque<TermPair>,
    seq_seq: VecDeque<TermPair>,
    var_any: VecDeque<TermPair>,
}

impl Queues {
    fn new() -> Self {
        Queues {
            delete: VecDeque::new(),
            seq_seq: VecDeque::new(),
            var_any: VecDeque::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.seq_seq.is_empty() && self.var_any.is_empty()
    }

    /// Routes `pair` into the queue matching its shape, keeping the
    /// `Variable` always on the left of a `var_any` pair.
    fn add(&mut self, pair: TermPair, tracer: &mut dyn Tracer) {
        let (left, right) = pair;
        if left == right {
            self.delete.push_back((left, right));
            return;
        }
        match (&left, &right) {
            (Term::Variable(_), _) => self.var_any.push_back((left, right)),
            (_, Term::Variable(_)) => {
                tracer.swap(&left, &right);
                self.var_any.push_back((right, left));
            }
            _ => self.seq_seq.push_back((left, right)),
        }
    }

    fn drain_all(&mut self) -> Vec<TermPair> {
        let mut all = Vec::with_capacity(self.delete.len() + self.seq_seq.len() + self.var_any.len());
        all.extend(self.delete.drain(..));
        all.extend(self.seq_seq.drain(..));
        all.extend(self.var_any.drain(..));
        all
    }
}

fn substitute_var(term: &Term, var: u32, replacement: &Term) -> Term {
    with_stack(|| substitute_var_inner(term, var, replacement))
}

fn substitute_var_inner(term: &Term, var: u32, replacement: &Term) -> Term {
    match term {
        Term::Variable(v) if *v == var => replacement.clone(),
        Term::Variable(_) | Term::Atom(_) => term.clone(),
        Term::Sequence(op, children) => Term::Sequence(
            op.clone(),
            children
                .iter()
                .map(|c| substitute_var_inner(c, var, replacement))
                .collect(),
        ),
    }
}

fn collect_vars(term: &Term, bits: &mut FixedBitSet) {
    with_stack(|| collect_vars_inner(term, bits))
}

fn collect_vars_inner(term: &Term, bits: &mut FixedBitSet) {
    match term {
        Term::Variable(v) => {
            let idx = *v as usize;
            if idx >= bits.len() {
                bits.grow(idx + 1);
            }
            bits.insert(idx);
        }
        Term::Atom(_) => {}
        Term::Sequence(_, children) => {
            for c in children {
                collect_vars_inner(c, bits);
            }
        }
    }
}

fn occurs_in(term: &Term, var: u32) -> bool {
    let mut bits = FixedBitSet::new();
    collect_vars(term, &mut bits);
    (var as usize) < bits.len() && bits[var as usize]
}

/// Solves `pairs` to a most-general unifier, or the first conflict/cycle
/// encountered.
///
/// `variable_count` must exceed the largest `Variable` ordinal reachable
/// from `pairs` or any `Action`-enqueued pair; it pre-sizes the internal
/// union-find table. Every `Variable(i)` the caller uses is expected to
/// satisfy `i < variable_count`, matching the Registry's dense
/// `fresh_var` allocation.
pub fn unify(
    pairs: Vec<TermPair>,
    variable_count: u32,
    actions: &mut FxHashMap<u32, Box<dyn Action>>,
    tracer: &mut dyn Tracer,
) -> Result<Substitution, UnifyFailure> {
    let mut table: InPlaceUnificationTable<InferVar> = InPlaceUnificationTable::new();
    for _ in 0..variable_count {
        table.new_key(None);
    }

    let mut queues = Queues::new();
    for pair in pairs {
        queues.add(pair, tracer);
    }

    let mut result = Substitution::default();
    let mut fire_counts: FxHashMap<u32, u32> = FxHashMap::default();

    while !queues.is_empty() {
        if let Some((left, right)) = queues.delete.pop_front() {
            tracer.delete(&left, &right);
            continue;
        }
        if let Some((left, right)) = queues.seq_seq.pop_front() {
            let left_op = left.operator().expect("seq_seq pair has non-variable left");
            let right_op = right.operator().expect("seq_seq pair has non-variable right");
            if left_op != right_op {
                tracer.conflict(&left, &right);
                return Err(UnifyFailure::Conflict { left, right });
            }
            tracer.decompose(&left, &right);
            for (lc, rc) in left.children().iter().zip(right.children().iter()) {
                queues.add((lc.clone(), rc.clone()), tracer);
            }
            continue;
        }
        if let Some((left, right)) = queues.var_any.pop_front() {
            let var = match left {
                Term::Variable(v) => v,
                _ => unreachable!("var_any pair always has a Variable on the left"),
            };
            if occurs_in(&right, var) {
                tracer.cycle(var, &right);
                return Err(UnifyFailure::Cycle {
                    variable: var,
                    term: right,
                });
            }

            let _ = table.unify_var_value(InferVar(var), Some(()));
            result.insert(var, right.clone());
            tracer.variable(var, &right);

            let remaining = queues.drain_all();
            for pair in remaining {
                let new_left = substitute_var(&pair.0, var, &right);
                let new_right = substitute_var(&pair.1, var, &right);
                if new_left != pair.0 || new_right != pair.1 {
                    tracer.substitute(var, &right, &pair);
                }
                queues.add((new_left, new_right), tracer);
            }

            fire_action(var, &right, &result, actions, &mut fire_counts, &mut queues, tracer);
            continue;
        }
    }

    Ok(result)
}

/// Fires `actions[var]`, if any, deferring every pair it enqueues to the
/// main loop rather than processing them inline — so a re-entrant binding
/// triggered by the action's own pairs is just another turn of the `while`
/// loop above, never a nested Rust call. `fire_counts` bounds how many
/// times any single variable's action may run, guarding against an action
/// that keeps re-deriving a pair that re-binds (and re-fires) the same
/// variable.
fn fire_action(
    var: u32,
    term: &Term,
    bindings: &Substitution,
    actions: &mut FxHashMap<u32, Box<dyn Action>>,
    fire_counts: &mut FxHashMap<u32, u32>,
    queues: &mut Queues,
    tracer: &mut dyn Tracer,
) {
    let count = fire_counts.entry(var).or_insert(0);
    if *count >= MAX_ACTION_REENTRY {
        return;
    }
    *count += 1;
    let Some(action) = actions.get_mut(&var) else {
        return;
    };
    let mut pending: Vec<TermPair> = Vec::new();
    {
        let mut add_pair = |a: Term, b: Term| pending.push((a, b));
        action.run(var, term, bindings, &mut add_pair);
    }
    for pair in pending {
        queues.add(pair, tracer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Primitive;

    fn int() -> Term {
        Term::Atom(Operator::Primitive(Primitive::Int))
    }

    fn bool_() -> Term {
        Term::Atom(Operator::Primitive(Primitive::Bool))
    }

    #[test]
    fn variable_with_itself_deletes() {
        let pairs = vec![(Term::Variable(0), Term::Variable(0))];
        let mut actions = FxHashMap::default();
        let subst = unify(pairs, 1, &mut actions, &mut NoopTracer).unwrap();
        assert!(subst.is_empty());
    }

    #[test]
    fn distinct_atoms_conflict() {
        let pairs = vec![(int(), bool_())];
        let mut actions = FxHashMap::default();
        let err = unify(pairs, 0, &mut actions, &mut NoopTracer).unwrap_err();
        assert_eq!(
            err,
            UnifyFailure::Conflict {
                left: int(),
                right: bool_()
            }
        );
    }

    #[test]
    fn list_alpha_with_list_int_binds_alpha() {
        let pairs = vec![(
            Term::Sequence(Operator::List, vec![Term::Variable(0)]),
            Term::Sequence(Operator::List, vec![int()]),
        )];
        let mut actions = FxHashMap::default();
        let subst = unify(pairs, 1, &mut actions, &mut NoopTracer).unwrap();
        assert_eq!(subst.get(0), Some(&int()));
    }

    #[test]
    fn occurs_check_rejects_self_reference() {
        let pairs = vec![(
            Term::Variable(0),
            Term::Sequence(Operator::List, vec![Term::Variable(0)]),
        )];
        let mut actions = FxHashMap::default();
        let err = unify(pairs, 1, &mut actions, &mut NoopTracer).unwrap_err();
        assert_eq!(
            err,
            UnifyFailure::Cycle {
                variable: 0,
                term: Term::Sequence(Operator::List, vec![Term::Variable(0)]),
            }
        );
    }

    #[test]
    fn record_arity_mismatch_conflicts() {
        // {x:int} vs {x:int,y:bool}: different label sets => different
        // operators => conflict, never a same-operator arity mismatch.
        let table = crate::atom::AtomTable::new();
        let lx = table.intern("x");
        let ly = table.intern("y");
        let left = Term::Sequence(Operator::Record { labels: vec![lx] }, vec![int()]);
        let right = Term::Sequence(
            Operator::Record {
                labels: vec![lx, ly],
            },
            vec![int(), bool_()],
        );
        let pairs = vec![(left.clone(), right.clone())];
        let mut actions = FxHashMap::default();
        let err = unify(pairs, 0, &mut actions, &mut NoopTracer).unwrap_err();
        assert_eq!(err, UnifyFailure::Conflict { left, right });
    }

    #[test]
    fn polymorphic_list_identity_scenario() {
        // unify (alpha -> alpha, beta -> int) => {alpha: int, beta: int}
        let pairs = vec![(
            Term::Sequence(Operator::Fn, vec![Term::Variable(0), Term::Variable(0)]),
            Term::Sequence(Operator::Fn, vec![Term::Variable(1), int()]),
        )];
        let mut actions = FxHashMap::default();
        let subst = unify(pairs, 2, &mut actions, &mut NoopTracer).unwrap();
        assert_eq!(subst.get(0), Some(&int()));
        assert_eq!(subst.get(1), Some(&int()));
    }

    #[test]
    fn idempotence_of_unifier() {
        let pairs = vec![(
            Term::Sequence(Operator::List, vec![Term::Variable(0)]),
            Term::Sequence(Operator::List, vec![int()]),
        )];
        let mut actions = FxHashMap::default();
        let subst = unify(pairs.clone(), 1, &mut actions, &mut NoopTracer).unwrap();
        let resolved: Vec<TermPair> = pairs
            .into_iter()
            .map(|(a, b)| (subst.resolve(&a), subst.resolve(&b)))
            .collect();
        let mut actions2 = FxHashMap::default();
        let subst2 = unify(resolved, 1, &mut actions2, &mut NoopTracer).unwrap();
        assert!(subst2.is_empty());
    }
}
