//! String interning for constructor names, record labels, and datatype
//! names.
//!
//! Keys and Types reference names by [`Atom`] rather than by `String` so
//! that structural equality of keys is a cheap integer comparison and the
//! registry never clones the same identifier twice.

use rustc_hash::FxHashMap;
use std::sync::RwLock;

/// An interned string handle. Two `Atom`s are equal iff they were produced
/// by interning the same text in the same [`AtomTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// The interning table behind [`Atom`]. Owned by the
/// [`crate::registry::TypeRegistry`]; not exposed for independent
/// construction so every `Atom` a caller holds is resolvable against the
/// registry that produced it.
#[derive(Debug, Default)]
pub struct AtomTable {
    strings: RwLock<AtomTableInner>,
}

#[derive(Debug, Default)]
struct AtomTableInner {
    by_text: FxHashMap<Box<str>, Atom>,
    by_atom: Vec<Box<str>>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, text: &str) -> Atom {
        if let Some(atom) = self.strings.read().unwrap().by_text.get(text) {
            return *atom;
        }
        let mut inner = self.strings.write().unwrap();
        if let Some(atom) = inner.by_text.get(text) {
            return *atom;
        }
        let id = Atom(inner.by_atom.len() as u32);
        inner.by_atom.push(text.into());
        inner.by_text.insert(text.into(), id);
        id
    }

    pub fn resolve(&self, atom: Atom) -> std::sync::Arc<str> {
        // Re-derive an owned string cheaply enough for display/debug use;
        // the table itself stores `Box<str>` so we clone out of the lock.
        let guard = self.strings.read().unwrap();
        std::sync::Arc::from(&*guard.by_atom[atom.0 as usize])
    }

    pub fn as_str_cloned(&self, atom: Atom) -> String {
        self.strings.read().unwrap().by_atom[atom.0 as usize].to_string()
    }
}
