//! Type Keys: structural identifiers for every type
//! shape. Two types are equal iff their keys are equal; keys hash and
//! equate by structure, not identity, and know how to render themselves and
//! how to `substitute` bound ordinals for argument keys.
//!
//! `Key` construction is quarantined to this module and to
//! [`crate::registry::TypeRegistry`]: nothing outside these two should ever
//! build a `Key` variant by hand, so that the record-canonicalization and
//! tuple-detection policies below are the only way a `Record`/`Tuple` key
//! comes into existence.

use crate::atom::Atom;
use std::cmp::Ordering;
use std::fmt;

/// The six fixed primitive type names, plus `unit` (the empty record/tuple).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Bool,
    Char,
    Int,
    Real,
    String,
    Unit,
}

impl Primitive {
    pub const ALL: [Primitive; 6] = [
        Primitive::Bool,
        Primitive::Char,
        Primitive::Int,
        Primitive::Real,
        Primitive::String,
        Primitive::Unit,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Real => "real",
            Primitive::String => "string",
            Primitive::Unit => "unit",
        }
    }
}

/// A structural identifier for a [`crate::types::Type`]. One variant per
/// Type variant, plus the internal `Dummy` key for
/// nullary-constructor payloads.
///
/// `Record` and `Apply` are never constructed directly outside
/// [`Key::record`] / the registry's `apply` normalization — see the module
/// doc comment.
#[derive(Debug, Clone)]
pub enum Key {
    Primitive(Primitive),
    /// A bound ordinal: a scheme/datatype parameter, *not* an inference
    /// variable; ordinals and inference variables live in disjoint spaces.
    Ordinal(u32),
    Fn(Box<Key>, Box<Key>),
    List(Box<Key>),
    /// Length >= 2; the canonical tuple-or-record collapse (see
    /// [`Key::record`]) guarantees a `Tuple` key never models a record whose
    /// labels happen to be contiguous integers starting at 1 and a `Record`
    /// key never has tuple-shaped labels.
    Tuple(Vec<Key>),
    /// Labels sorted by the record-label ordering policy (numeric labels by
    /// numeric value, then non-numeric labels lexicographically, numeric
    /// before non-numeric). Never tuple-shaped and never empty — both
    /// collapse to other variants in [`Key::record`].
    Record(Vec<(Atom, Key)>),
    DataType {
        name: Atom,
        arity: u32,
        args: Vec<Key>,
        /// Insertion order as declared, not sorted — constructor order is
        /// part of the programmer's surface syntax, unlike record labels.
        ctors: Vec<(Atom, Key)>,
    },
    Forall(Box<Key>, u32),
    /// A requested-but-not-yet-reduced application. `TypeRegistry::type_for`
    /// always normalizes this to the substituted key before interning or
    /// lookup; no canonical `by_key` entry is ever stored under `Apply`
    /// itself — `Apply` is a constructor, not a normal form.
    Apply(Box<Key>, Vec<Key>),
    Alias(Atom, Box<Key>),
    /// The single distinguished payload type for nullary constructors.
    Dummy,
    /// Only valid inside a [`crate::registry::TypeRegistry::data_types`]
    /// declaration's constructor payloads: refers to the `j`-th datatype in
    /// the mutually recursive group currently being declared. `data_types`
    /// rewrites every `GroupRef` to the sibling's own `(name, arity, args)`
    /// stub key before interning; a `GroupRef` never appears in a key
    /// reachable from a committed `Type`.
    GroupRef(u32),
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        use Key::*;
        match (self, other) {
            (Primitive(a), Primitive(b)) => a == b,
            (Ordinal(a), Ordinal(b)) => a == b,
            (Fn(ap, ar), Fn(bp, br)) => ap == bp && ar == br,
            (List(a), List(b)) => a == b,
            (Tuple(a), Tuple(b)) => a == b,
            (Record(a), Record(b)) => a == b,
            // DataType identity is (name, arity, args) alone: the
            // constructor map is a deterministic function of those three
            // (it comes from one declaration plus substitution), and a
            // self-referential ctor payload makes an infinite Key tree
            // if it is folded into equality/hash. See DESIGN.md.
            (
                DataType {
                    name: an,
                    arity: aa,
                    args: aargs,
                    ..
                },
                DataType {
                    name: bn,
                    arity: ba,
                    args: bargs,
                    ..
                },
            ) => an == bn && aa == ba && aargs == bargs,
            (Forall(ab, aa), Forall(bb, ba)) => ab == bb && aa == ba,
            (Apply(asch, aargs), Apply(bsch, bargs)) => asch == bsch && aargs == bargs,
            (Alias(an, ab), Alias(bn, bb)) => an == bn && ab == bb,
            (Dummy, Dummy) => true,
            (GroupRef(a), GroupRef(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Key::Primitive(p) => p.hash(state),
            Key::Ordinal(i) => i.hash(state),
            Key::Fn(p, r) => {
                p.hash(state);
                r.hash(state);
            }
            Key::List(e) => e.hash(state),
            Key::Tuple(elems) => elems.hash(state),
            Key::Record(fields) => fields.hash(state),
            Key::DataType {
                name, arity, args, ..
            } => {
                name.hash(state);
                arity.hash(state);
                args.hash(state);
            }
            Key::Forall(body, arity) => {
                body.hash(state);
                arity.hash(state);
            }
            Key::Apply(scheme, args) => {
                scheme.hash(state);
                args.hash(state);
            }
            Key::Alias(name, body) => {
                name.hash(state);
                body.hash(state);
            }
            Key::Dummy => {}
            Key::GroupRef(i) => i.hash(state),
        }
    }
}

/// Operator precedence for `describe`. Lower binds looser.
mod prec {
    pub const ALIAS_NAME: u8 = 0;
    pub const FN: u8 = 2;
    pub const TUPLE: u8 = 4;
    pub const POSTFIX: u8 = 6;
    pub const ATOM: u8 = 8;
}

impl Key {
    /// The canonicalizing `Record` constructor: empty
    /// maps to `unit`, tuple-shaped label sets (`"1".."n"`, n>=2) collapse
    /// to `Tuple`, a single field stays a one-field `Record` (never
    /// silently unwrapped), everything else is sorted per the record-label
    /// ordering policy and kept as `Record`.
    pub fn record(mut fields: Vec<(Atom, String)>, resolve: impl Fn(&Atom) -> Key) -> Key {
        // `fields` pairs an Atom (the label, already interned) with the
        // label's *text* for ordering/shape tests, and `resolve` turns an
        // atom into its already-built field-type key.
        if fields.is_empty() {
            return Key::Primitive(Primitive::Unit);
        }
        fields.sort_by(|(_, a), (_, b)| compare_labels(a, b));
        if fields.len() != 1 && is_tuple_shaped(fields.iter().map(|(_, l)| l.as_str())) {
            return Key::Tuple(fields.iter().map(|(a, _)| resolve(a)).collect());
        }
        Key::Record(
            fields
                .into_iter()
                .map(|(atom, _)| (atom, resolve(&atom)))
                .collect(),
        )
    }

    /// Replace ordinal `i` with `args[i]`'s key. Leaf keys with no ordinals
    /// reachable return themselves unchanged.
    pub fn substitute(&self, args: &[Key]) -> Key {
        match self {
            Key::Ordinal(i) => args
                .get(*i as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Key::Primitive(_) | Key::Dummy => self.clone(),
            Key::Fn(p, r) => Key::Fn(Box::new(p.substitute(args)), Box::new(r.substitute(args))),
            Key::List(e) => Key::List(Box::new(e.substitute(args))),
            Key::Tuple(elems) => Key::Tuple(elems.iter().map(|k| k.substitute(args)).collect()),
            Key::Record(fields) => Key::Record(
                fields
                    .iter()
                    .map(|(l, k)| (*l, k.substitute(args)))
                    .collect(),
            ),
            Key::DataType {
                name,
                arity,
                args: dargs,
                ctors,
            } => Key::DataType {
                name: *name,
                arity: *arity,
                args: dargs.iter().map(|k| k.substitute(args)).collect(),
                ctors: ctors
                    .iter()
                    .map(|(c, k)| (*c, k.substitute(args)))
                    .collect(),
            },
            Key::Forall(body, arity) => {
                // A nested scheme's own ordinals shadow the outer ones; only
                // substitute if arities differ in namespace is never mixed
                // by construction (callers only substitute into a scheme's
                // body through `apply`, which strips the Forall first).
                Key::Forall(Box::new(body.substitute(args)), *arity)
            }
            Key::Apply(scheme, sargs) => Key::Apply(
                Box::new(scheme.substitute(args)),
                sargs.iter().map(|k| k.substitute(args)).collect(),
            ),
            Key::Alias(name, body) => Key::Alias(*name, Box::new(body.substitute(args))),
            Key::GroupRef(i) => Key::GroupRef(*i),
        }
    }

    /// The finite `(name, arity, args)` stub that stands in for a datatype
    /// under construction — equal, by [`Key`]'s own `DataType` equality, to
    /// that datatype's eventual definitive key. Used to break the
    /// self-reference cycle when declaring recursive datatypes and
    /// when instantiating one.
    pub fn data_type_stub(name: Atom, arity: u32, args: Vec<Key>) -> Key {
        Key::DataType {
            name,
            arity,
            args,
            ctors: Vec::new(),
        }
    }

    /// Render to text with precedence-driven parenthesization (see
    /// precedence table).
    pub fn describe(&self, resolve_atom: &impl Fn(Atom) -> String) -> String {
        let mut buf = String::new();
        self.write(&mut buf, resolve_atom, 0);
        buf
    }

    fn write(&self, buf: &mut String, resolve: &impl Fn(Atom) -> String, min_prec: u8) {
        use std::fmt::Write;
        match self {
            Key::Primitive(p) => buf.push_str(p.name()),
            Key::Dummy => buf.push_str("<dummy>"),
            Key::Ordinal(i) => {
                let _ = write!(buf, "'t{i}");
            }
            Key::Fn(param, result) => {
                let parenthesize = min_prec > prec::FN;
                if parenthesize {
                    buf.push('(');
                }
                param.write(buf, resolve, prec::FN + 1);
                buf.push_str(" -> ");
                result.write(buf, resolve, prec::FN);
                if parenthesize {
                    buf.push(')');
                }
            }
            Key::List(elem) => {
                let parenthesize = min_prec > prec::POSTFIX;
                if parenthesize {
                    buf.push('(');
                }
                elem.write(buf, resolve, prec::POSTFIX);
                buf.push_str(" list");
                if parenthesize {
                    buf.push(')');
                }
            }
            Key::Tuple(elems) => {
                let parenthesize = min_prec > prec::TUPLE;
                if parenthesize {
                    buf.push('(');
                }
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(" * ");
                    }
                    e.write(buf, resolve, prec::TUPLE + 1);
                }
                if parenthesize {
                    buf.push(')');
                }
            }
            Key::Record(fields) => {
                buf.push('{');
                for (i, (label, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    buf.push_str(&resolve(*label));
                    buf.push(':');
                    ty.write(buf, resolve, 0);
                }
                buf.push('}');
            }
            Key::DataType { name, args, .. } => {
                let parenthesize = min_prec > prec::POSTFIX;
                if parenthesize {
                    buf.push('(');
                }
                match args.len() {
                    0 => {}
                    1 => {
                        args[0].write(buf, resolve, prec::POSTFIX);
                        buf.push(' ');
                    }
                    _ => {
                        buf.push('(');
                        for (i, a) in args.iter().enumerate() {
                            if i > 0 {
                                buf.push_str(", ");
                            }
                            a.write(buf, resolve, prec::TUPLE + 1);
                        }
                        buf.push_str(") ");
                    }
                }
                buf.push_str(&resolve(*name));
                if parenthesize {
                    buf.push(')');
                }
            }
            Key::Forall(body, arity) => {
                let _ = write!(buf, "forall{arity}. ");
                body.write(buf, resolve, 0);
            }
            Key::Apply(scheme, args) => {
                scheme.write(buf, resolve, prec::ATOM);
                buf.push('<');
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    a.write(buf, resolve, 0);
                }
                buf.push('>');
            }
            Key::Alias(name, _) => buf.push_str(&resolve(*name)),
            Key::GroupRef(i) => {
                let _ = write!(buf, "<group#{i}>");
            }
        }
    }
}

/// Numeric-string labels sort numerically and before all non-numeric
/// labels, which sort lexicographically among themselves. Total and
/// deterministic.
fn compare_labels(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// True iff `labels` is exactly `{"1", "2", ..., "n"}` for some n >= 2
/// (contiguous-integer detection). Caller must pass labels
/// already sorted by [`compare_labels`].
fn is_tuple_shaped<'a>(labels: impl Iterator<Item = &'a str>) -> bool {
    let mut expected = 1u64;
    let mut count = 0u64;
    for label in labels {
        match label.parse::<u64>() {
            Ok(n) if n == expected => {
                expected += 1;
                count += 1;
            }
            _ => return false,
        }
    }
    count >= 2
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_labels_numeric_before_alpha() {
        assert_eq!(compare_labels("1", "a"), Ordering::Less);
        assert_eq!(compare_labels("10", "2"), Ordering::Greater);
        assert_eq!(compare_labels("a", "b"), Ordering::Less);
    }

    #[test]
    fn tuple_shape_detection() {
        assert!(is_tuple_shaped(["1", "2", "3"].into_iter()));
        assert!(!is_tuple_shaped(["1", "3"].into_iter()));
        assert!(!is_tuple_shaped(["1"].into_iter()));
        assert!(!is_tuple_shaped(["0", "1"].into_iter()));
        assert!(!is_tuple_shaped(std::iter::empty()));
    }

    #[test]
    fn substitute_identity_on_leaf() {
        let k = Key::Primitive(Primitive::Int);
        assert_eq!(k.substitute(&[]), k);
    }

    #[test]
    fn substitute_ordinal() {
        let k = Key::Ordinal(0);
        let args = vec![Key::Primitive(Primitive::Bool)];
        assert_eq!(k.substitute(&args), Key::Primitive(Primitive::Bool));
    }

    #[test]
    fn substitute_composite_rebuilds_children() {
        let k = Key::List(Box::new(Key::Ordinal(0)));
        let args = vec![Key::Primitive(Primitive::String)];
        assert_eq!(
            k.substitute(&args),
            Key::List(Box::new(Key::Primitive(Primitive::String)))
        );
    }

    #[test]
    fn describe_function_is_right_associative_no_parens() {
        let k = Key::Fn(
            Box::new(Key::Primitive(Primitive::Int)),
            Box::new(Key::Fn(
                Box::new(Key::Primitive(Primitive::Int)),
                Box::new(Key::Primitive(Primitive::Bool)),
            )),
        );
        assert_eq!(k.describe(&|_| String::new()), "int -> int -> bool");
    }

    #[test]
    fn describe_function_parenthesizes_fn_param() {
        let param = Key::Fn(
            Box::new(Key::Primitive(Primitive::Int)),
            Box::new(Key::Primitive(Primitive::Int)),
        );
        let k = Key::Fn(Box::new(param), Box::new(Key::Primitive(Primitive::Bool)));
        assert_eq!(k.describe(&|_| String::new()), "(int -> int) -> bool");
    }

    #[test]
    fn describe_list_is_postfix() {
        let k = Key::List(Box::new(Key::Primitive(Primitive::Int)));
        assert_eq!(k.describe(&|_| String::new()), "int list");
    }

    #[test]
    fn describe_tuple_uses_star() {
        let k = Key::Tuple(vec![
            Key::Primitive(Primitive::Int),
            Key::Primitive(Primitive::Bool),
        ]);
        assert_eq!(k.describe(&|_| String::new()), "int * bool");
    }
}
