//! Substitution and instantiation: turning a scheme or an un-applied
//! datatype plus a list of argument types into a concrete
//! [`crate::types::TypeId`].
//!
//! Two algorithms live here. `apply` on a `Scheme` is the ordinary case:
//! rebuild the body's `Key` with bound ordinals replaced by the arguments'
//! own keys, then intern ([`substitute_via_key`]). `apply` on an
//! un-applied `DataType` needs a DFS: a recursive datatype's own
//! constructors refer back to the un-applied datatype by `TypeId`, and that
//! reference has to end up pointing at the *newly applied* result — which,
//! since [`crate::key::Key`]'s `DataType` equality ignores constructors,
//! is just the ordinary by-key placeholder that `TypeRegistry` already
//! allocated before the DFS started. No rewrite-and-swap step is needed;
//! the self-reference resolves itself.

use crate::atom::Atom;
use crate::error::{CoreError, CoreResult};
use crate::key::Key;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::registry::{DataTypeDef, TypeRegistry};
use crate::transaction::Transaction;
use crate::types::{DataTypeNode, Type, TypeId};
use rustc_hash::{FxHashMap, FxHashSet};

/// Applies a scheme or un-applied datatype to concrete argument types.
pub(crate) fn apply(
    registry: &TypeRegistry,
    scheme_or_datatype: TypeId,
    args: &[TypeId],
) -> CoreResult<TypeId> {
    match registry.resolve(scheme_or_datatype) {
        Type::Scheme { body, arity } => {
            if args.len() != arity as usize {
                return Err(CoreError::ArityMismatch {
                    expected: arity,
                    found: args.len() as u32,
                });
            }
            substitute_via_key(registry, body, args)
        }
        Type::DataType(node) if node.args.is_empty() => {
            if args.len() != node.arity as usize {
                return Err(CoreError::ArityMismatch {
                    expected: node.arity,
                    found: args.len() as u32,
                });
            }
            instantiate_datatype(registry, scheme_or_datatype, &node, args)
        }
        Type::DataType(_) => {
            if args.is_empty() {
                Ok(scheme_or_datatype)
            } else {
                Err(CoreError::ArityMismatch {
                    expected: 0,
                    found: args.len() as u32,
                })
            }
        }
        _ => Err(CoreError::InternalInvariant(
            "apply's target is neither a Scheme nor an un-applied DataType".to_string(),
        )),
    }
}

/// Plain (non-recursive-datatype) substitution: rebuild `body`'s key with
/// `args`' keys standing in for bound ordinals, then intern the result.
/// Correct for scheme bodies because a scheme's body never refers back to
/// the scheme itself — only datatypes can be self-referential.
fn substitute_via_key(registry: &TypeRegistry, body: TypeId, args: &[TypeId]) -> CoreResult<TypeId> {
    let arg_keys: Vec<Key> = args.iter().map(|a| registry.key_of(*a)).collect();
    let substituted = registry.key_of(body).substitute(&arg_keys);
    registry.type_for(&substituted)
}

/// Instantiate an un-applied datatype's whole recursive structure.
/// `node_id` must resolve to `node`, an un-applied (`args.is_empty()`)
/// [`DataTypeNode`].
fn instantiate_datatype(
    registry: &TypeRegistry,
    node_id: TypeId,
    node: &DataTypeNode,
    args: &[TypeId],
) -> CoreResult<TypeId> {
    let arg_keys: Vec<Key> = args.iter().map(|a| registry.key_of(*a)).collect();
    let stub_key = Key::data_type_stub(node.name, node.arity, arg_keys);

    if let Some(existing) = registry.lookup_by_key(&stub_key) {
        return Ok(existing);
    }

    let placeholder_ty = Type::DataType(DataTypeNode {
        name: node.name,
        arity: node.arity,
        args: args.to_vec(),
        constructors: Vec::new(),
        mutual_group: node.mutual_group,
    });
    let placeholder_id = registry.allocate_placeholder(stub_key.clone(), placeholder_ty);
    let mut txn = Transaction::new(registry);
    txn.bind_key(stub_key.clone());

    let mut guard = RecursionGuard::with_profile(RecursionProfile::DatatypeSubstitution);
    let mut new_ctors = Vec::with_capacity(node.constructors.len());
    for (ctor_name, payload) in &node.constructors {
        let new_payload = match substitute_reachable(registry, *payload, args, &mut guard) {
            Ok(id) => id,
            Err(e) => {
                txn.rollback();
                return Err(e);
            }
        };
        new_ctors.push((*ctor_name, new_payload));
    }

    registry.finalize_placeholder(
        placeholder_id,
        stub_key,
        Type::DataType(DataTypeNode {
            name: node.name,
            arity: node.arity,
            args: args.to_vec(),
            constructors: new_ctors,
            mutual_group: node.mutual_group,
        }),
    );
    txn.commit();
    Ok(placeholder_id)
}

/// Walks the `TypeId` graph reachable from `id` inside an un-applied
/// datatype's own constructors, replacing bound-ordinal `Var`s with `args`
/// and leaving everything else either untouched (no dependency on the
/// datatype's parameters) or rebuilt through the ordinary interning
/// constructors. A nested un-applied `DataType` (self or mutual-recursive
/// sibling sharing the same parameter list) recurses into
/// `instantiate_datatype`, which resolves immediately via `by_key` once
/// that datatype's own placeholder already exists — true for `node_id`
/// itself from the moment its placeholder is allocated, which is why this
/// never actually recurses through a real cycle.
fn substitute_reachable(
    registry: &TypeRegistry,
    id: TypeId,
    args: &[TypeId],
    guard: &mut RecursionGuard<TypeId>,
) -> CoreResult<TypeId> {
    match guard.enter(id) {
        RecursionResult::Cycle => {
            return Err(CoreError::InternalInvariant(format!(
                "unresolved cycle while instantiating a recursive datatype at {id:?}"
            )))
        }
        RecursionResult::Exceeded => {
            return Err(CoreError::RecursionLimitExceeded {
                operation: "recursive-datatype substitution",
            })
        }
        RecursionResult::Entered => {}
    }

    let result = (|| -> CoreResult<TypeId> {
        match registry.resolve(id) {
            Type::Var(i) => Ok(args.get(i as usize).copied().unwrap_or(id)),
            Type::Primitive(_) | Type::Dummy => Ok(id),
            Type::Function { param, result } => {
                let p = substitute_reachable(registry, param, args, guard)?;
                let r = substitute_reachable(registry, result, args, guard)?;
                registry.fn_type(p, r)
            }
            Type::List(elem) => {
                let e = substitute_reachable(registry, elem, args, guard)?;
                registry.list_type(e)
            }
            Type::Tuple(elems) => {
                let mut new_elems = Vec::with_capacity(elems.len());
                for e in elems {
                    new_elems.push(substitute_reachable(registry, e, args, guard)?);
                }
                registry.tuple_type(&new_elems)
            }
            Type::Record { fields, .. } => {
                let mut new_fields = Vec::with_capacity(fields.len());
                for (label, field_ty) in fields {
                    let new_ty = substitute_reachable(registry, field_ty, args, guard)?;
                    new_fields.push((registry.resolve_atom(label), new_ty));
                }
                registry.record_type(&new_fields)
            }
            Type::DataType(inner) if inner.args.is_empty() => {
                if inner.arity as usize != args.len() {
                    return Err(CoreError::InternalInvariant(
                        "recursive reference to a datatype of different arity inside a declaration"
                            .to_string(),
                    ));
                }
                instantiate_datatype(registry, id, &inner, args)
            }
            Type::DataType(_) => Ok(id),
            Type::Scheme { .. } | Type::Alias { .. } | Type::Overloaded(_) => Ok(id),
        }
    })();

    guard.leave(id);
    result
}

/// Closes `ty` over its free variables, producing a `Type::Scheme`. The
/// inverse of `apply` on a scheme: `generalize(apply(forall_of(t), fresh))`
/// round-trips back to (an alpha-equivalent of) `forall_of(t)`.
///
/// Collection is a post-order walk that does not descend into a
/// `DataType`'s or nested `Scheme`'s own children: both represent an
/// already-closed scope, and `Var(u32)` carries no tag distinguishing a
/// datatype's bound ordinal from a genuinely free inference variable that
/// happens to share the same numeral, so partially descending into one
/// would risk renumbering a bound ordinal as if it were free. `Alias` is
/// transparent — its body is the real type.
pub(crate) fn generalize(registry: &TypeRegistry, ty: TypeId) -> CoreResult<TypeId> {
    let mut seen = FxHashSet::default();
    let mut order = Vec::new();
    collect_free_vars(registry, ty, &mut seen, &mut order);

    let renumber: FxHashMap<u32, u32> = order
        .iter()
        .enumerate()
        .map(|(new_ordinal, old_ordinal)| (*old_ordinal, new_ordinal as u32))
        .collect();

    let body_key = generalize_key(registry, ty, &renumber);
    let body_id = registry.type_for(&body_key)?;
    registry.forall_type(body_id, order.len() as u32)
}

/// Free-variable ordinals reachable from `id`, in first-occurrence order,
/// opaque at `DataType`/`Scheme` boundaries. See `generalize`.
fn collect_free_vars(registry: &TypeRegistry, id: TypeId, seen: &mut FxHashSet<u32>, order: &mut Vec<u32>) {
    match registry.resolve(id) {
        Type::Var(i) => {
            if seen.insert(i) {
                order.push(i);
            }
        }
        Type::Alias { body, .. } => collect_free_vars(registry, body, seen, order),
        // Opaque, mirroring `generalize_key`: `DataType`/`Scheme` are
        // already-closed scopes, and `Overloaded` has no `Key` form to
        // rebuild through in the first place (see types.rs/key.rs).
        Type::DataType(_) | Type::Scheme { .. } | Type::Overloaded(_) => {}
        other => {
            for child in other.children() {
                collect_free_vars(registry, child, seen, order);
            }
        }
    }
}

/// Rebuilds `id`'s key with every free `Var` ordinal replaced by its
/// renumbered slot. Mirrors `collect_free_vars`'s traversal exactly:
/// `DataType`/`Scheme` children are left untouched (their already-canonical
/// key is reused verbatim), `Alias` is unwrapped.
fn generalize_key(registry: &TypeRegistry, id: TypeId, renumber: &FxHashMap<u32, u32>) -> Key {
    match registry.resolve(id) {
        Type::Var(i) => Key::Ordinal(*renumber.get(&i).unwrap_or(&i)),
        Type::Primitive(p) => Key::Primitive(p),
        Type::Dummy => Key::Dummy,
        Type::Function { param, result } => Key::Fn(
            Box::new(generalize_key(registry, param, renumber)),
            Box::new(generalize_key(registry, result, renumber)),
        ),
        Type::List(elem) => Key::List(Box::new(generalize_key(registry, elem, renumber))),
        Type::Tuple(elems) => Key::Tuple(
            elems
                .iter()
                .map(|e| generalize_key(registry, *e, renumber))
                .collect(),
        ),
        Type::Record { fields, .. } => Key::Record(
            fields
                .iter()
                .map(|(label, t)| (*label, generalize_key(registry, *t, renumber)))
                .collect(),
        ),
        Type::Alias { name, body } => Key::Alias(name, Box::new(generalize_key(registry, body, renumber))),
        // Opaque: reuse the already-canonical key unchanged rather than
        // rebuild through these nodes' own bound scopes.
        Type::DataType(_) | Type::Scheme { .. } | Type::Overloaded(_) => registry.key_of(id),
    }
}

/// Declare a (possibly mutually recursive) batch of datatypes.
/// Allocates one un-applied placeholder per definition before building any
/// constructor, so `Key::GroupRef` self/sibling references resolve through
/// ordinary interning.
pub(crate) fn declare_data_types(
    registry: &TypeRegistry,
    txn: &mut Transaction<'_>,
    defs: &[DataTypeDef],
) -> CoreResult<Vec<TypeId>> {
    if defs.is_empty() {
        return Ok(Vec::new());
    }

    let mut name_atoms = Vec::with_capacity(defs.len());
    for def in defs {
        if registry.lookup(&def.name).is_ok() {
            return Err(CoreError::DuplicateName(def.name.clone()));
        }
        name_atoms.push(registry.intern_string(&def.name));
    }
    for i in 0..name_atoms.len() {
        if name_atoms[i + 1..].contains(&name_atoms[i]) {
            return Err(CoreError::DuplicateName(defs[i].name.clone()));
        }
    }

    let mutual_group = if defs.len() > 1 { Some(0u32) } else { None };

    let mut placeholder_ids = Vec::with_capacity(defs.len());
    for (def, atom) in defs.iter().zip(&name_atoms) {
        let stub_key = Key::data_type_stub(*atom, def.arity, Vec::new());
        if registry.lookup_by_key(&stub_key).is_some() {
            return Err(CoreError::DuplicateName(def.name.clone()));
        }
        let placeholder_ty = Type::DataType(DataTypeNode {
            name: *atom,
            arity: def.arity,
            args: Vec::new(),
            constructors: Vec::new(),
            mutual_group,
        });
        placeholder_ids.push(registry.allocate_placeholder(stub_key.clone(), placeholder_ty));
        txn.bind_key(stub_key);
    }

    for (idx, def) in defs.iter().enumerate() {
        let mut ctor_ids = Vec::with_capacity(def.ctors.len());
        for (ctor_name, key) in &def.ctors {
            check_ordinal_range(key, def.arity)?;
            let rewritten = rewrite_group_refs(key, &name_atoms, defs)?;
            let ctor_type_id = registry.type_for(&rewritten)?;
            ctor_ids.push((registry.intern_string(ctor_name), ctor_type_id));
        }
        let stub_key = Key::data_type_stub(name_atoms[idx], def.arity, Vec::new());
        registry.finalize_placeholder(
            placeholder_ids[idx],
            stub_key,
            Type::DataType(DataTypeNode {
                name: name_atoms[idx],
                arity: def.arity,
                args: Vec::new(),
                constructors: ctor_ids,
                mutual_group,
            }),
        );
    }

    for (atom, id) in name_atoms.iter().zip(&placeholder_ids) {
        txn.bind_name(*atom, *id);
    }

    Ok(placeholder_ids)
}

/// Checks every `Key::Ordinal` reachable in a constructor payload against
/// the declaring datatype's own arity: every ordinal appearing in any
/// constructor payload must be < arity.
fn check_ordinal_range(key: &Key, arity: u32) -> CoreResult<()> {
    match key {
        Key::Ordinal(i) => {
            if *i >= arity {
                return Err(CoreError::ArityMismatch {
                    expected: arity,
                    found: *i + 1,
                });
            }
            Ok(())
        }
        Key::Primitive(_) | Key::Dummy | Key::GroupRef(_) => Ok(()),
        Key::Fn(p, r) => {
            check_ordinal_range(p, arity)?;
            check_ordinal_range(r, arity)
        }
        Key::List(e) => check_ordinal_range(e, arity),
        Key::Tuple(elems) => elems.iter().try_for_each(|e| check_ordinal_range(e, arity)),
        Key::Record(fields) => fields.iter().try_for_each(|(_, k)| check_ordinal_range(k, arity)),
        Key::DataType { args, ctors, .. } => {
            args.iter().try_for_each(|a| check_ordinal_range(a, arity))?;
            ctors.iter().try_for_each(|(_, k)| check_ordinal_range(k, arity))
        }
        Key::Forall(body, _) => check_ordinal_range(body, arity),
        Key::Apply(scheme, sargs) => {
            check_ordinal_range(scheme, arity)?;
            sargs.iter().try_for_each(|a| check_ordinal_range(a, arity))
        }
        Key::Alias(_, body) => check_ordinal_range(body, arity),
    }
}

/// Replaces every `Key::GroupRef(j)` in `key` with the `j`-th sibling's
/// `(name, arity)` stub key. `defs`/`name_atoms` are the batch currently
/// being declared; the stub always has empty `args`, matching the
/// placeholder each sibling was just given.
fn rewrite_group_refs(key: &Key, name_atoms: &[Atom], defs: &[DataTypeDef]) -> CoreResult<Key> {
    Ok(match key {
        Key::GroupRef(j) => {
            let j = *j as usize;
            let (name, arity) = name_atoms
                .get(j)
                .zip(defs.get(j))
                .map(|(n, d)| (*n, d.arity))
                .ok_or_else(|| {
                    CoreError::InternalInvariant(format!(
                        "GroupRef({j}) has no matching sibling in this declaration"
                    ))
                })?;
            Key::data_type_stub(name, arity, Vec::new())
        }
        Key::Primitive(_) | Key::Ordinal(_) | Key::Dummy => key.clone(),
        Key::Fn(p, r) => Key::Fn(
            Box::new(rewrite_group_refs(p, name_atoms, defs)?),
            Box::new(rewrite_group_refs(r, name_atoms, defs)?),
        ),
        Key::List(e) => Key::List(Box::new(rewrite_group_refs(e, name_atoms, defs)?)),
        Key::Tuple(elems) => {
            let mut out = Vec::with_capacity(elems.len());
            for e in elems {
                out.push(rewrite_group_refs(e, name_atoms, defs)?);
            }
            Key::Tuple(out)
        }
        Key::Record(fields) => {
            let mut out = Vec::with_capacity(fields.len());
            for (label, k) in fields {
                out.push((*label, rewrite_group_refs(k, name_atoms, defs)?));
            }
            Key::Record(out)
        }
        Key::DataType {
            name,
            arity,
            args,
            ctors,
        } => {
            let mut new_args = Vec::with_capacity(args.len());
            for a in args {
                new_args.push(rewrite_group_refs(a, name_atoms, defs)?);
            }
            let mut new_ctors = Vec::with_capacity(ctors.len());
            for (c, k) in ctors {
                new_ctors.push((*c, rewrite_group_refs(k, name_atoms, defs)?));
            }
            Key::DataType {
                name: *name,
                arity: *arity,
                args: new_args,
                ctors: new_ctors,
            }
        }
        Key::Forall(body, arity) => Key::Forall(
            Box::new(rewrite_group_refs(body, name_atoms, defs)?),
            *arity,
        ),
        Key::Apply(scheme, sargs) => {
            let mut new_sargs = Vec::with_capacity(sargs.len());
            for a in sargs {
                new_sargs.push(rewrite_group_refs(a, name_atoms, defs)?);
            }
            Key::Apply(
                Box::new(rewrite_group_refs(scheme, name_atoms, defs)?),
                new_sargs,
            )
        }
        Key::Alias(name, body) => {
            Key::Alias(*name, Box::new(rewrite_group_refs(body, name_atoms, defs)?))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Primitive;

    #[test]
    fn apply_scheme_substitutes_body() {
        let reg = TypeRegistry::new();
        let scheme_key = Key::Forall(Box::new(Key::List(Box::new(Key::Ordinal(0)))), 1);
        let scheme_id = reg.type_for(&scheme_key).unwrap();
        let applied = reg.apply(scheme_id, &[TypeId::INT]).unwrap();
        assert_eq!(applied, reg.list_type(TypeId::INT).unwrap());
    }

    #[test]
    fn apply_scheme_wrong_arity_errors() {
        let reg = TypeRegistry::new();
        let scheme_key = Key::Forall(Box::new(Key::Ordinal(0)), 1);
        let scheme_id = reg.type_for(&scheme_key).unwrap();
        assert_eq!(
            reg.apply(scheme_id, &[]),
            Err(CoreError::ArityMismatch {
                expected: 1,
                found: 0
            })
        );
    }

    fn declare_tree(reg: &TypeRegistry) -> TypeId {
        let def = DataTypeDef {
            name: "tree".to_string(),
            arity: 1,
            ctors: vec![
                ("Leaf".to_string(), Key::Primitive(Primitive::Unit)),
                (
                    "Node".to_string(),
                    Key::Tuple(vec![Key::Ordinal(0), Key::GroupRef(0), Key::GroupRef(0)]),
                ),
            ],
        };
        reg.data_types(&[def]).unwrap()[0]
    }

    #[test]
    fn recursive_datatype_declares_and_instantiates() {
        let reg = TypeRegistry::new();
        let tree = declare_tree(&reg);
        let tree_int = reg.apply(tree, &[TypeId::INT]).unwrap();
        match reg.resolve(tree_int) {
            Type::DataType(node) => {
                assert_eq!(node.args, vec![TypeId::INT]);
                assert_eq!(node.constructors.len(), 2);
                let (_, node_payload) = node.constructors[1];
                match reg.resolve(node_payload) {
                    Type::Tuple(elems) => {
                        assert_eq!(elems[0], TypeId::INT);
                        assert_eq!(elems[1], tree_int, "recursive child must be tree<int> itself");
                        assert_eq!(elems[2], tree_int);
                    }
                    other => panic!("expected Tuple, got {other:?}"),
                }
            }
            other => panic!("expected DataType, got {other:?}"),
        }
    }

    #[test]
    fn applying_same_args_twice_returns_same_type_id() {
        let reg = TypeRegistry::new();
        let tree = declare_tree(&reg);
        let a = reg.apply(tree, &[TypeId::INT]).unwrap();
        let b = reg.apply(tree, &[TypeId::INT]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn applying_different_args_gives_distinct_types() {
        let reg = TypeRegistry::new();
        let tree = declare_tree(&reg);
        let int_tree = reg.apply(tree, &[TypeId::INT]).unwrap();
        let bool_tree = reg.apply(tree, &[TypeId::BOOL]).unwrap();
        assert_ne!(int_tree, bool_tree);
    }

    #[test]
    fn duplicate_name_rejected() {
        let reg = TypeRegistry::new();
        let def = DataTypeDef {
            name: "int".to_string(),
            arity: 0,
            ctors: vec![],
        };
        assert_eq!(
            reg.data_types(&[def]),
            Err(CoreError::DuplicateName("int".to_string()))
        );
    }

    #[test]
    fn generalize_renumbers_free_variables_by_first_occurrence() {
        let reg = TypeRegistry::new();
        let a = reg.fresh_var(); // ordinal 0
        let b = reg.fresh_var(); // ordinal 1
        // `b` occurs first in the walk order even though `a` was allocated
        // first, so generalization must renumber by where each variable is
        // first *seen*, not by its inference-time ordinal.
        let list_b = reg.list_type(b).unwrap();
        let pair = reg.tuple_type(&[list_b, a]).unwrap();

        let scheme = reg.generalize(pair).unwrap();
        match reg.resolve(scheme) {
            Type::Scheme { body, arity } => {
                assert_eq!(arity, 2);
                match reg.resolve(body) {
                    Type::Tuple(elems) => {
                        match reg.resolve(elems[0]) {
                            Type::List(e) => assert_eq!(reg.resolve(e), Type::Var(0)),
                            other => panic!("expected List, got {other:?}"),
                        }
                        assert_eq!(reg.resolve(elems[1]), Type::Var(1));
                    }
                    other => panic!("expected Tuple, got {other:?}"),
                }
            }
            other => panic!("expected Scheme, got {other:?}"),
        }
    }

    #[test]
    fn apply_then_generalize_round_trips_to_the_original_scheme() {
        let reg = TypeRegistry::new();
        let scheme_key = Key::Forall(
            Box::new(Key::Fn(
                Box::new(Key::Ordinal(0)),
                Box::new(Key::Ordinal(0)),
            )),
            1,
        );
        let scheme = reg.type_for(&scheme_key).unwrap();

        let fresh = reg.fresh_var();
        let monomorphic = reg.apply(scheme, &[fresh]).unwrap();
        let regeneralized = reg.generalize(monomorphic).unwrap();

        assert_eq!(regeneralized, scheme, "fresh-instantiate-then-generalize must recover the original scheme");
    }

    #[test]
    fn generalize_of_a_closed_type_produces_a_zero_arity_scheme() {
        let reg = TypeRegistry::new();
        let scheme = reg.generalize(TypeId::INT).unwrap();
        match reg.resolve(scheme) {
            Type::Scheme { body, arity } => {
                assert_eq!(arity, 0);
                assert_eq!(body, TypeId::INT);
            }
            other => panic!("expected Scheme, got {other:?}"),
        }
    }

    #[test]
    fn generalize_does_not_capture_a_recursive_datatypes_own_ordinals() {
        let reg = TypeRegistry::new();
        let tree = declare_tree(&reg);
        let free = reg.fresh_var();
        let pair = reg.tuple_type(&[tree, free]).unwrap();

        let scheme = reg.generalize(pair).unwrap();
        match reg.resolve(scheme) {
            Type::Scheme { body, arity } => {
                // Only `free` closes over; `tree`'s own un-applied ordinal
                // is untouched because DataType children are opaque here.
                assert_eq!(arity, 1);
                match reg.resolve(body) {
                    Type::Tuple(elems) => {
                        assert_eq!(elems[0], tree);
                        assert_eq!(reg.resolve(elems[1]), Type::Var(0));
                    }
                    other => panic!("expected Tuple, got {other:?}"),
                }
            }
            other => panic!("expected Scheme, got {other:?}"),
        }
    }

    #[test]
    fn mutual_recursion_tree_and_forest() {
        let reg = TypeRegistry::new();
        let tree_def = DataTypeDef {
            name: "tree".to_string(),
            arity: 1,
            ctors: vec![(
                "Node".to_string(),
                Key::Tuple(vec![Key::Ordinal(0), Key::GroupRef(1)]),
            )],
        };
        let forest_def = DataTypeDef {
            name: "forest".to_string(),
            arity: 1,
            ctors: vec![
                ("Empty".to_string(), Key::Primitive(Primitive::Unit)),
                (
                    "Cons".to_string(),
                    Key::Tuple(vec![Key::GroupRef(0), Key::GroupRef(1)]),
                ),
            ],
        };
        let ids = reg.data_types(&[tree_def, forest_def]).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(reg.lookup("tree").is_ok());
        assert!(reg.lookup("forest").is_ok());
    }
}
