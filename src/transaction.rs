//! Scoped rollback log for [`crate::registry::TypeRegistry::data_types`]
//! and single-datatype instantiation: records every `by_name` and
//! `by_key` insertion made while declaring a batch of datatypes (or
//! instantiating one recursive datatype) so that a failure partway
//! through (duplicate name, arity mismatch, depth budget exceeded) can
//! undo exactly those insertions and leave the registry as if the call
//! had never happened.
//!
//! Placeholder arena slots allocated during a failed declaration are left
//! in place rather than compacted out — nothing promises `TypeId` values
//! are dense or reused, only that committed names/keys resolve correctly,
//! so an orphaned placeholder is harmless, just a little slack in the
//! arena.

use crate::atom::Atom;
use crate::key::Key;
use crate::registry::TypeRegistry;
use crate::types::TypeId;

enum Undo {
    /// Restore `by_name[name]` to whatever it was before this transaction
    /// touched it (`None` meaning "didn't exist").
    Name { name: Atom, previous: Option<TypeId> },
    /// Evict `key` from `by_key`. Only ever used for a key this transaction
    /// itself installed (a fresh placeholder never had a prior occupant to
    /// restore), so rollback is always a plain removal.
    Key { key: Key },
}

/// A transaction's only externally visible effect is whether the
/// `by_name` changes it staged are kept ([`Transaction::commit`]) or
/// undone ([`Transaction::rollback`]). Dropping a transaction without
/// calling either rolls back: a `?`-propagated error out of the
/// declaration body never leaves a half-applied transaction live.
pub struct Transaction<'a> {
    registry: &'a TypeRegistry,
    log: Vec<Undo>,
    resolved: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(registry: &'a TypeRegistry) -> Self {
        Transaction {
            registry,
            log: Vec::new(),
            resolved: false,
        }
    }

    /// Insert or overwrite `by_name[name]`, remembering how to restore the
    /// prior binding.
    pub(crate) fn bind_name(&mut self, name: Atom, id: TypeId) {
        let previous = self.registry.by_name_insert(name, id);
        self.log.push(Undo::Name { name, previous });
    }

    /// Record that `key` was just installed in `by_key` (by a placeholder
    /// allocation this transaction is covering), so a rollback evicts it
    /// again instead of leaving an orphaned stub behind.
    pub(crate) fn bind_key(&mut self, key: Key) {
        self.log.push(Undo::Key { key });
    }

    pub(crate) fn commit(mut self) {
        self.resolved = true;
        self.log.clear();
    }

    pub(crate) fn rollback(mut self) {
        self.resolved = true;
        self.unwind();
    }

    fn unwind(&mut self) {
        while let Some(undo) = self.log.pop() {
            match undo {
                Undo::Name { name, previous } => self.registry.by_name_restore(name, previous),
                Undo::Key { key } => self.registry.by_key_remove(&key),
            }
        }
    }
}

impl<'a> Drop for Transaction<'a> {
    fn drop(&mut self) {
        if !self.resolved {
            self.unwind();
        }
    }
}
