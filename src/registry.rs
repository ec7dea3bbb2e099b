//! The Type Registry: the interning table mapping a
//! structural [`Key`] to its canonical [`Type`], plus the `by_name` table of
//! user-introduced names and the monotonic fresh-variable counter.
//!
//! `DataType` keys hash and compare by `(name, arity, args)` only (see
//! [`Key`]'s manual `Hash`/`Eq` impl) — the constructor map is a
//! deterministic function of those three, and treating it as part of the
//! key would make a directly-recursive datatype's own key infinite. That
//! choice is what lets every operation below — including recursive
//! declaration and instantiation — go through the single `type_for` path
//! instead of a bespoke swap-at-commit mechanism.

use crate::atom::{Atom, AtomTable};
use crate::error::{CoreError, CoreResult};
use crate::key::{Key, Primitive};
use crate::transaction::Transaction;
use crate::types::{DataTypeNode, Type};
use crate::TypeId;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::RwLock;
use tracing::trace;

/// One datatype definition as handed to [`TypeRegistry::data_types`].
/// `ctors`' payload keys may use [`Key::Ordinal`] for the datatype's own
/// generic parameters (`0..arity`) and [`Key::GroupRef`] to reference a
/// sibling definition by its index in the same `defs` slice (including
/// itself, for direct recursion).
#[derive(Debug, Clone)]
pub struct DataTypeDef {
    pub name: String,
    pub arity: u32,
    pub ctors: Vec<(String, Key)>,
}

/// The interning table + name table + fresh-variable counter.
/// Single-owner, single-threaded-cooperative — the internal `RwLock`s exist
/// to give every operation a `&self` signature, not to claim safe
/// concurrent mutation.
pub struct TypeRegistry {
    pub(crate) atoms: AtomTable,
    arena: RwLock<Vec<Type>>,
    /// Parallel to `arena`: the canonical `Key` for slot `i`. Kept in
    /// lockstep so building a parent key for an already-interned child
    /// never re-walks the child's subtree.
    keys: RwLock<Vec<Key>>,
    by_key: RwLock<FxHashMap<Key, TypeId>>,
    by_name: RwLock<FxHashMap<Atom, TypeId>>,
    fresh_var: AtomicU32,
    /// Set once an `InternalInvariant` fires; every subsequent call fails
    /// fast rather than risk building on top of corrupted state.
    poisoned: AtomicBool,
}

impl TypeRegistry {
    /// Pre-populated with the six primitives and the distinguished `dummy`
    /// type.
    pub fn new() -> Self {
        let atoms = AtomTable::new();
        let mut arena = Vec::new();
        let mut keys = Vec::new();
        let mut by_key = FxHashMap::default();
        let mut by_name = FxHashMap::default();

        for p in Primitive::ALL {
            let id = TypeId::from_index(arena.len() as u32);
            arena.push(Type::Primitive(p));
            keys.push(Key::Primitive(p));
            by_key.insert(Key::Primitive(p), id);
            by_name.insert(atoms.intern(p.name()), id);
        }
        let dummy_id = TypeId::from_index(arena.len() as u32);
        arena.push(Type::Dummy);
        keys.push(Key::Dummy);
        by_key.insert(Key::Dummy, dummy_id);

        debug_assert_eq!(dummy_id, TypeId::DUMMY);

        trace!("type registry initialized with {} primitives", arena.len() - 1);

        TypeRegistry {
            atoms,
            arena: RwLock::new(arena),
            keys: RwLock::new(keys),
            by_key: RwLock::new(by_key),
            by_name: RwLock::new(by_name),
            fresh_var: AtomicU32::new(0),
            poisoned: AtomicBool::new(false),
        }
    }

    fn check_alive(&self) -> CoreResult<()> {
        if self.poisoned.load(Ordering::Acquire) {
            return Err(CoreError::InternalInvariant(
                "registry poisoned by a prior invariant violation".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn poison(&self, detail: impl Into<String>) -> CoreError {
        self.poisoned.store(true, Ordering::Release);
        CoreError::InternalInvariant(detail.into())
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }

    pub fn intern_string(&self, text: &str) -> Atom {
        self.atoms.intern(text)
    }

    pub fn resolve_atom(&self, atom: Atom) -> String {
        self.atoms.as_str_cloned(atom)
    }

    /// Looks up a previously declared name in the `by_name` table.
    pub fn lookup(&self, name: &str) -> CoreResult<TypeId> {
        self.check_alive()?;
        let atom = self.atoms.intern(name);
        self.by_name
            .read()
            .unwrap()
            .get(&atom)
            .copied()
            .ok_or_else(|| CoreError::UnknownName(name.to_string()))
    }

    /// The canonical `Type` for `id`. Internal callers use this freely;
    /// external ones mostly want `lookup`/`type_for`, but this is the only
    /// way to inspect a type's shape once you have a `TypeId`.
    pub fn resolve(&self, id: TypeId) -> Type {
        self.arena.read().unwrap()[id.index() as usize].clone()
    }

    /// The canonical `Key` for `id` — the inverse of `type_for`. Useful for
    /// callers that want to `describe()` a type or rebuild a related key
    /// (e.g. wrapping it in a new composite) without re-deriving structure
    /// by hand.
    pub fn key_of(&self, id: TypeId) -> Key {
        self.keys.read().unwrap()[id.index() as usize].clone()
    }

    pub(crate) fn lookup_by_key(&self, key: &Key) -> Option<TypeId> {
        self.by_key.read().unwrap().get(key).copied()
    }

    /// Evict `key` from `by_key`, used only to unwind a placeholder that a
    /// rolled-back transaction installed. Leaves the arena/`keys` slot in
    /// place — see the module-level orphaned-placeholder note.
    pub(crate) fn by_key_remove(&self, key: &Key) {
        self.by_key.write().unwrap().remove(key);
    }

    /// Allocate a new arena slot, recording both its `Type` payload and its
    /// canonical `Key`, and index it in `by_key`. The only place a fresh
    /// `TypeId` is minted.
    fn push_type(&self, key: Key, ty: Type) -> TypeId {
        let mut arena = self.arena.write().unwrap();
        let mut keys = self.keys.write().unwrap();
        let id = TypeId::from_index(arena.len() as u32);
        arena.push(ty);
        keys.push(key.clone());
        drop(arena);
        drop(keys);
        self.by_key.write().unwrap().insert(key, id);
        id
    }

    /// Overwrite an existing slot's payload in place, keeping the same
    /// `TypeId` and the same `by_key` entry (valid because `DataType` keys
    /// ignore `ctors` — see the module doc comment). This is how a
    /// recursive-datatype placeholder becomes definitive without any
    /// "swap" visible to holders of the `TypeId`.
    fn overwrite_type(&self, id: TypeId, key: Key, ty: Type) {
        self.arena.write().unwrap()[id.index() as usize] = ty;
        self.keys.write().unwrap()[id.index() as usize] = key;
    }

    /// Returns the interned `Type` for `key`, constructing
    /// it (and any not-yet-seen children) if absent.
    pub fn type_for(&self, key: &Key) -> CoreResult<TypeId> {
        self.check_alive()?;
        if let Key::Apply(scheme_key, arg_keys) = key {
            let scheme_id = self.type_for(scheme_key)?;
            let mut arg_ids = Vec::with_capacity(arg_keys.len());
            for k in arg_keys {
                arg_ids.push(self.type_for(k)?);
            }
            return crate::substitute::apply(self, scheme_id, &arg_ids);
        }
        if let Some(id) = self.lookup_by_key(key) {
            return Ok(id);
        }
        let ty = self.build_type(key)?;
        Ok(self.push_type(key.clone(), ty))
    }

    pub fn types_for(&self, keys: &[Key]) -> CoreResult<Vec<TypeId>> {
        keys.iter().map(|k| self.type_for(k)).collect()
    }

    fn build_type(&self, key: &Key) -> CoreResult<Type> {
        Ok(match key {
            Key::Primitive(p) => Type::Primitive(*p),
            Key::Dummy => Type::Dummy,
            Key::Ordinal(i) => Type::Var(*i),
            Key::Fn(param, result) => Type::Function {
                param: self.type_for(param)?,
                result: self.type_for(result)?,
            },
            Key::List(elem) => Type::List(self.type_for(elem)?),
            Key::Tuple(elems) => {
                let mut ids = Vec::with_capacity(elems.len());
                for e in elems {
                    ids.push(self.type_for(e)?);
                }
                Type::Tuple(ids)
            }
            Key::Record(fields) => {
                let mut ids = Vec::with_capacity(fields.len());
                for (label, k) in fields {
                    ids.push((*label, self.type_for(k)?));
                }
                Type::Record {
                    fields: ids,
                    progressive: false,
                }
            }
            Key::DataType {
                name,
                arity,
                args,
                ctors,
            } => {
                let mut arg_ids = Vec::with_capacity(args.len());
                for a in args {
                    arg_ids.push(self.type_for(a)?);
                }
                let mut ctor_ids = Vec::with_capacity(ctors.len());
                for (c, k) in ctors {
                    ctor_ids.push((*c, self.type_for(k)?));
                }
                Type::DataType(DataTypeNode {
                    name: *name,
                    arity: *arity,
                    args: arg_ids,
                    constructors: ctor_ids,
                    mutual_group: None,
                })
            }
            Key::Forall(body, arity) => Type::Scheme {
                body: self.type_for(body)?,
                arity: *arity,
            },
            Key::Alias(name, body) => Type::Alias {
                name: *name,
                body: self.type_for(body)?,
            },
            Key::Apply(..) => unreachable!("Key::Apply normalized in type_for"),
            Key::GroupRef(i) => {
                return Err(self.poison(format!(
                    "GroupRef({i}) escaped a data_types declaration into type_for"
                )))
            }
        })
    }

    // --- convenience constructors ---

    pub fn fn_type(&self, param: TypeId, result: TypeId) -> CoreResult<TypeId> {
        let key = Key::Fn(Box::new(self.key_of(param)), Box::new(self.key_of(result)));
        self.type_for(&key)
    }

    pub fn list_type(&self, elem: TypeId) -> CoreResult<TypeId> {
        self.type_for(&Key::List(Box::new(self.key_of(elem))))
    }

    pub fn tuple_type(&self, elems: &[TypeId]) -> CoreResult<TypeId> {
        if elems.len() < 2 {
            return Err(self.poison(format!(
                "tuple_type requires >= 2 elements, got {}",
                elems.len()
            )));
        }
        let keys = elems.iter().map(|e| self.key_of(*e)).collect();
        self.type_for(&Key::Tuple(keys))
    }

    /// Canonicalizing record constructor: empty -> `unit`, tuple-shaped
    /// labels -> `Tuple`, otherwise a sorted `Record`. `fields` pairs a
    /// label string with its field's `TypeId`.
    pub fn record_type(&self, fields: &[(String, TypeId)]) -> CoreResult<TypeId> {
        let labeled: Vec<(Atom, String)> = fields
            .iter()
            .map(|(label, _)| (self.atoms.intern(label), label.clone()))
            .collect();
        let by_atom: FxHashMap<Atom, TypeId> = fields
            .iter()
            .map(|(label, id)| (self.atoms.intern(label), *id))
            .collect();
        let key = Key::record(labeled, |atom| self.key_of(by_atom[atom]));
        self.type_for(&key)
    }

    /// Fresh inference variable. Ordinals strictly increase across the
    /// registry's lifetime; disjoint from any scheme/datatype's own local
    /// `0..arity` ordinal numbering.
    pub fn fresh_var(&self) -> TypeId {
        let ordinal = self.fresh_var.fetch_add(1, Ordering::Relaxed);
        // Never reuses an existing Var(ordinal) slot because the ordinal is
        // globally unique; still routed through type_for for uniform
        // arena/key bookkeeping.
        self.type_for(&Key::Ordinal(ordinal))
            .expect("fresh ordinal keys never fail to intern")
    }

    pub fn forall_type(&self, body: TypeId, arity: u32) -> CoreResult<TypeId> {
        self.type_for(&Key::Forall(Box::new(self.key_of(body)), arity))
    }

    pub fn alias_type(&self, name: &str, body: TypeId) -> CoreResult<TypeId> {
        let atom = self.atoms.intern(name);
        self.type_for(&Key::Alias(atom, Box::new(self.key_of(body))))
    }

    /// Declare a (possibly mutually recursive) batch of datatypes
    /// atomically. Returns their canonical
    /// `TypeId`s in input order. See `crate::substitute::declare_data_types`
    /// for the algorithm.
    pub fn data_types(&self, defs: &[DataTypeDef]) -> CoreResult<Vec<TypeId>> {
        self.check_alive()?;
        let mut txn = Transaction::new(self);
        match crate::substitute::declare_data_types(self, &mut txn, defs) {
            Ok(ids) => {
                txn.commit();
                Ok(ids)
            }
            Err(e) => {
                txn.rollback();
                Err(e)
            }
        }
    }

    /// Apply a scheme or un-applied datatype to concrete argument types.
    pub fn apply(&self, scheme_or_datatype: TypeId, args: &[TypeId]) -> CoreResult<TypeId> {
        self.check_alive()?;
        crate::substitute::apply(self, scheme_or_datatype, args)
    }

    /// Close over `ty`'s free variables, producing a `Scheme`. See
    /// `crate::substitute::generalize` for the traversal.
    pub fn generalize(&self, ty: TypeId) -> CoreResult<TypeId> {
        self.check_alive()?;
        crate::substitute::generalize(self, ty)
    }

    pub(crate) fn by_name_insert(&self, name: Atom, id: TypeId) -> Option<TypeId> {
        self.by_name.write().unwrap().insert(name, id)
    }

    pub(crate) fn by_name_remove(&self, name: Atom) {
        self.by_name.write().unwrap().remove(&name);
    }

    pub(crate) fn by_name_restore(&self, name: Atom, previous: Option<TypeId>) {
        match previous {
            Some(id) => {
                self.by_name.write().unwrap().insert(name, id);
            }
            None => {
                self.by_name.write().unwrap().remove(&name);
            }
        }
    }

    pub(crate) fn allocate_placeholder(&self, key: Key, ty: Type) -> TypeId {
        self.push_type(key, ty)
    }

    pub(crate) fn finalize_placeholder(&self, id: TypeId, key: Key, ty: Type) {
        self.overwrite_type(id, key, ty)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_preregistered() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.lookup("int").unwrap(), TypeId::INT);
        assert_eq!(reg.lookup("bool").unwrap(), TypeId::BOOL);
        assert_eq!(reg.resolve(TypeId::UNIT), Type::Primitive(Primitive::Unit));
    }

    #[test]
    fn unknown_name_errors() {
        let reg = TypeRegistry::new();
        assert_eq!(
            reg.lookup("frobnicate"),
            Err(CoreError::UnknownName("frobnicate".to_string()))
        );
    }

    #[test]
    fn interning_is_deduplicated_by_identity() {
        let reg = TypeRegistry::new();
        let a = reg.list_type(TypeId::INT).unwrap();
        let b = reg.list_type(TypeId::INT).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn record_with_tuple_shaped_labels_becomes_tuple() {
        let reg = TypeRegistry::new();
        let record = reg
            .record_type(&[
                ("1".to_string(), TypeId::INT),
                ("2".to_string(), TypeId::BOOL),
            ])
            .unwrap();
        let tuple = reg.tuple_type(&[TypeId::INT, TypeId::BOOL]).unwrap();
        assert_eq!(record, tuple);
    }

    #[test]
    fn record_empty_is_unit() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.record_type(&[]).unwrap(), TypeId::UNIT);
    }

    #[test]
    fn record_single_field_stays_record() {
        let reg = TypeRegistry::new();
        let id = reg.record_type(&[("x".to_string(), TypeId::INT)]).unwrap();
        match reg.resolve(id) {
            Type::Record { fields, .. } => assert_eq!(fields.len(), 1),
            other => panic!("expected Record, got {other:?}"),
        }
    }

    #[test]
    fn fresh_var_ordinals_strictly_increase() {
        let reg = TypeRegistry::new();
        let a = reg.fresh_var();
        let b = reg.fresh_var();
        assert_ne!(a, b);
        match (reg.resolve(a), reg.resolve(b)) {
            (Type::Var(x), Type::Var(y)) => assert!(y > x),
            _ => panic!("expected Var"),
        }
    }

    #[test]
    fn poisoned_registry_rejects_further_calls() {
        let reg = TypeRegistry::new();
        let _ = reg.poison("test poison");
        assert!(matches!(reg.lookup("int"), Err(CoreError::InternalInvariant(_))));
    }
}
