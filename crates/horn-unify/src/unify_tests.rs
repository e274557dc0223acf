use std::rc::Rc;

use horn_term::{
    ground, Binding, Bindings, Location, OpaqueTerm, PatternError, Term, TermUnifier, Unified,
    Value, VarIdGen,
};
use horn_term::{ArrayPart, ObjectPart};

use crate::{UnifyAction, Unifier};

fn loc() -> Location {
    Location::unknown()
}

fn unifier() -> Unifier {
    Unifier::new(VarIdGen::starting_at(500))
}

/// Unify and unwrap the success case.
fn must_unify(left: &Term, right: &Term) -> Bindings {
    unifier()
        .unify(left, right, &Bindings::new(), &loc())
        .expect("no pattern error")
        .expect("unification should succeed")
}

fn must_fail(left: &Term, right: &Term) {
    let result = unifier()
        .unify(left, right, &Bindings::new(), &loc())
        .expect("no pattern error");
    assert!(result.is_none(), "expected failure for {left} ~ {right}");
}

fn resolved(bindings: &Bindings, var: &horn_term::VarId) -> Term {
    ground(&Term::Var(var.clone()), bindings).expect("groundable")
}

// ---------------------------------------------------------------------------
// Core dispatch
// ---------------------------------------------------------------------------

#[test]
fn identical_primitives_unify_without_new_bindings() {
    let b = must_unify(&Term::Int(3), &Term::Int(3));
    assert!(b.is_empty());
    let b = must_unify(&Term::str("x"), &Term::str("x"));
    assert!(b.is_empty());
}

#[test]
fn distinct_primitives_fail() {
    must_fail(&Term::Int(3), &Term::Int(4));
    must_fail(&Term::Int(3), &Term::str("3"));
    must_fail(&Term::Null, &Term::Missing);
}

#[test]
fn variable_binds_and_older_snapshot_survives() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let empty = Bindings::new();

    let mut u = unifier();
    let bound = u
        .unify(&Term::Var(x.clone()), &Term::Int(7), &empty, &loc())
        .unwrap()
        .unwrap();

    assert_eq!(bound.resolve(&Term::Var(x.clone())).value, Term::Int(7));
    assert!(empty.is_empty());
}

#[test]
fn bound_variable_is_never_rebound() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let mut u = unifier();

    let b = u
        .unify(&Term::Var(x.clone()), &Term::Int(1), &Bindings::new(), &loc())
        .unwrap()
        .unwrap();
    // Unifying against the existing value succeeds and adds nothing.
    let same = u
        .unify(&Term::Var(x.clone()), &Term::Int(1), &b, &loc())
        .unwrap()
        .unwrap();
    assert_eq!(same.len(), b.len());
    // A different value is a plain failure.
    assert!(u
        .unify(&Term::Var(x), &Term::Int(2), &b, &loc())
        .unwrap()
        .is_none());
}

#[test]
fn variable_to_variable_links_share_fate() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let y = ids.fresh("Y");
    let mut u = unifier();

    let b = u
        .unify(
            &Term::Var(x.clone()),
            &Term::Var(y.clone()),
            &Bindings::new(),
            &loc(),
        )
        .unwrap()
        .unwrap();
    let b = u
        .unify(&Term::Var(x.clone()), &Term::Int(9), &b, &loc())
        .unwrap()
        .unwrap();

    assert_eq!(b.resolve(&Term::Var(y)).value, Term::Int(9));
    assert_eq!(b.resolve(&Term::Var(x)).value, Term::Int(9));
}

#[test]
fn anonymous_variable_never_binds() {
    let b = must_unify(&Term::anon(), &Term::Int(3));
    assert!(b.is_empty());
    let b = must_unify(&Term::seq([Term::anon()]), &Term::seq([Term::Int(1)]));
    assert!(b.is_empty());
}

#[test]
fn occurs_check_rejects_cyclic_binding() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    must_fail(
        &Term::Var(x.clone()),
        &Term::map([("prop", Term::Var(x.clone()))]),
    );
    must_fail(&Term::Var(x.clone()), &Term::seq([Term::Var(x)]));
}

#[test]
fn sequences_unify_elementwise() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let b = must_unify(
        &Term::seq([Term::Int(1), Term::Var(x.clone())]),
        &Term::seq([Term::Int(1), Term::str("two")]),
    );
    assert_eq!(resolved(&b, &x), Term::str("two"));

    must_fail(
        &Term::seq([Term::Int(1)]),
        &Term::seq([Term::Int(1), Term::Int(2)]),
    );
    must_fail(&Term::seq([Term::Int(1)]), &Term::seq([Term::Int(2)]));
}

#[test]
fn maps_need_strictly_matching_keys() {
    let ids = VarIdGen::starting_at(1);
    let a = ids.fresh("A");
    let b = must_unify(
        &Term::map([("k", Term::Var(a.clone()))]),
        &Term::map([("k", Term::Int(5))]),
    );
    assert_eq!(resolved(&b, &a), Term::Int(5));

    must_fail(
        &Term::map([("k", Term::Int(1))]),
        &Term::map([("k", Term::Int(1)), ("extra", Term::Int(2))]),
    );
    must_fail(
        &Term::map([("k", Term::Int(1)), ("extra", Term::Int(2))]),
        &Term::map([("k", Term::Int(1))]),
    );
}

// ---------------------------------------------------------------------------
// Value slots
// ---------------------------------------------------------------------------

#[test]
fn optional_slot_absorbs_missing_key_with_default() {
    let ids = VarIdGen::starting_at(1);
    let a = ids.fresh("A");
    let b_var = ids.fresh("B");

    let pattern = Term::map([
        ("a", Term::Var(a.clone())),
        (
            "b",
            Term::slot(Value::optional(Term::Var(b_var.clone()), Term::Int(10))),
        ),
    ]);

    let b = must_unify(&pattern, &Term::map([("a", Term::Int(1))]));
    assert_eq!(resolved(&b, &a), Term::Int(1));
    assert_eq!(resolved(&b, &b_var), Term::Int(10));
}

#[test]
fn optional_slot_prefers_concrete_value_over_default() {
    let ids = VarIdGen::starting_at(1);
    let b_var = ids.fresh("B");
    let pattern = Term::map([(
        "b",
        Term::slot(Value::optional(Term::Var(b_var.clone()), Term::Int(10))),
    )]);

    let b = must_unify(&pattern, &Term::map([("b", Term::Int(2))]));
    assert_eq!(resolved(&b, &b_var), Term::Int(2));
}

#[test]
fn required_slot_fails_on_missing_key() {
    let ids = VarIdGen::starting_at(1);
    let b_var = ids.fresh("B");
    let pattern = Term::map([(
        "b",
        Term::slot(Value::required(Term::Var(b_var), Term::Int(10))),
    )]);
    must_fail(&pattern, &Term::empty_map());
}

#[test]
fn required_slot_asserts_its_default() {
    let ids = VarIdGen::starting_at(1);
    let b_var = ids.fresh("B");
    let slot = Term::slot(Value::required(Term::Var(b_var.clone()), Term::Int(10)));

    let b = must_unify(&slot, &Term::Int(10));
    assert_eq!(resolved(&b, &b_var), Term::Int(10));

    let slot = Term::slot(Value::required(Term::Var(ids.fresh("C")), Term::Int(10)));
    must_fail(&slot, &Term::Int(2));
}

#[test]
fn slot_meeting_a_variable_applies_the_default() {
    let ids = VarIdGen::starting_at(1);
    let b_var = ids.fresh("B");
    let other = ids.fresh("V");
    let slot = Term::slot(Value::optional(Term::Var(b_var.clone()), Term::Int(5)));

    let b = must_unify(&slot, &Term::Var(other.clone()));
    assert_eq!(resolved(&b, &b_var), Term::Int(5));
    assert_eq!(resolved(&b, &other), Term::Int(5));
}

#[test]
fn slot_vs_slot_joins_slots_and_checks_defaults() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let y = ids.fresh("Y");

    let same = must_unify(
        &Term::slot(Value::optional(Term::Var(x.clone()), Term::Int(9))),
        &Term::slot(Value::optional(Term::Var(y.clone()), Term::Int(9))),
    );
    assert_eq!(resolved(&same, &x), Term::Int(9));
    assert_eq!(resolved(&same, &y), Term::Int(9));

    must_fail(
        &Term::slot(Value::optional(Term::Var(ids.fresh("P")), Term::Int(9))),
        &Term::slot(Value::optional(Term::Var(ids.fresh("Q")), Term::Int(5))),
    );
}

#[test]
fn walking_a_bound_structure_triggers_nested_slots() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let b_var = ids.fresh("B");

    // X binds to a sequence that contains a slot; the walk against `_`
    // still applies the slot's default.
    let b = must_unify(
        &Term::Var(x),
        &Term::seq([Term::slot(Value::optional(
            Term::Var(b_var.clone()),
            Term::Int(5),
        ))]),
    );
    assert_eq!(resolved(&b, &b_var), Term::Int(5));
}

// ---------------------------------------------------------------------------
// Array patterns
// ---------------------------------------------------------------------------

#[test]
fn array_spread_takes_prefix_before_fixed_tail() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    // [...X, 1]
    let pattern = Term::array_pattern([
        ArrayPart::Spread(Term::Var(x.clone())),
        ArrayPart::Items(vec![Term::Int(1)]),
    ]);

    let b = must_unify(
        &pattern,
        &Term::seq([Term::str("a"), Term::str("b"), Term::Int(1)]),
    );
    assert_eq!(
        resolved(&b, &x),
        Term::seq([Term::str("a"), Term::str("b")])
    );

    let pattern = Term::array_pattern([
        ArrayPart::Spread(Term::Var(ids.fresh("Y"))),
        ArrayPart::Items(vec![Term::Int(1)]),
    ]);
    must_fail(
        &pattern,
        &Term::seq([Term::str("a"), Term::str("b"), Term::Int(2)]),
    );
}

#[test]
fn array_split_is_non_greedy_leftmost_first() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let y = ids.fresh("Y");
    // [...X, ...Y] vs [1, 2]: the first spread takes the shortest prefix.
    let pattern = Term::array_pattern([
        ArrayPart::Spread(Term::Var(x.clone())),
        ArrayPart::Spread(Term::Var(y.clone())),
    ]);

    let b = must_unify(&pattern, &Term::seq([Term::Int(1), Term::Int(2)]));
    assert_eq!(resolved(&b, &x), Term::seq([]));
    assert_eq!(resolved(&b, &y), Term::seq([Term::Int(1), Term::Int(2)]));
}

#[test]
fn array_spread_between_fixed_runs() {
    let ids = VarIdGen::starting_at(1);
    let mid = ids.fresh("Mid");
    // [1, ...Mid, 4]
    let pattern = Term::array_pattern([
        ArrayPart::Items(vec![Term::Int(1)]),
        ArrayPart::Spread(Term::Var(mid.clone())),
        ArrayPart::Items(vec![Term::Int(4)]),
    ]);

    let b = must_unify(
        &pattern,
        &Term::seq([Term::Int(1), Term::Int(2), Term::Int(3), Term::Int(4)]),
    );
    assert_eq!(resolved(&b, &mid), Term::seq([Term::Int(2), Term::Int(3)]));
}

#[test]
fn trailing_optional_slots_do_not_count_toward_length() {
    let ids = VarIdGen::starting_at(1);
    let a = ids.fresh("A");
    let b_var = ids.fresh("B");
    // [A, B = optional(9)]
    let pattern = Term::array_pattern([ArrayPart::Items(vec![
        Term::Var(a.clone()),
        Term::slot(Value::optional(Term::Var(b_var.clone()), Term::Int(9))),
    ])]);

    let b = must_unify(&pattern, &Term::seq([Term::Int(1)]));
    assert_eq!(resolved(&b, &a), Term::Int(1));
    assert_eq!(resolved(&b, &b_var), Term::Int(9));

    let pattern = Term::array_pattern([ArrayPart::Items(vec![
        Term::Var(ids.fresh("C")),
        Term::slot(Value::optional(Term::Var(b_var.clone()), Term::Int(9))),
    ])]);
    let b = must_unify(&pattern, &Term::seq([Term::Int(1), Term::Int(2)]));
    assert_eq!(resolved(&b, &b_var), Term::Int(2));
}

#[test]
fn bound_spread_becomes_a_fixed_run() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let base = Bindings::new().with(
        x.clone(),
        Binding::unbound(Term::seq([Term::Int(1), Term::Int(2)])),
    );

    let pattern = Term::array_pattern([
        ArrayPart::Spread(Term::Var(x)),
        ArrayPart::Items(vec![Term::Int(3)]),
    ]);
    let result = unifier()
        .unify(
            &pattern,
            &Term::seq([Term::Int(1), Term::Int(2), Term::Int(3)]),
            &base,
            &loc(),
        )
        .unwrap();
    assert!(result.is_some());

    let result = unifier()
        .unify(
            &pattern,
            &Term::seq([Term::Int(9), Term::Int(2), Term::Int(3)]),
            &base,
            &loc(),
        )
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn array_pattern_binds_a_plain_variable() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let rest = ids.fresh("R");
    let pattern = Term::array_pattern([
        ArrayPart::Items(vec![Term::Int(1)]),
        ArrayPart::Spread(Term::Var(rest.clone())),
    ]);

    let b = must_unify(&Term::Var(x.clone()), &pattern);
    // The variable now points at the pattern; giving the spread a value
    // makes the variable ground to a plain sequence.
    let mut u = unifier();
    let b = u
        .unify(
            &Term::Var(rest),
            &Term::seq([Term::Int(2)]),
            &b,
            &loc(),
        )
        .unwrap()
        .unwrap();
    assert_eq!(resolved(&b, &x), Term::seq([Term::Int(1), Term::Int(2)]));
}

#[test]
fn open_array_patterns_unify_head_to_head() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let y = ids.fresh("Y");
    let a = ids.fresh("A");

    // [1, ...X] vs [A, ...Y]: heads pair up, spreads link.
    let p1 = Term::array_pattern([
        ArrayPart::Items(vec![Term::Int(1)]),
        ArrayPart::Spread(Term::Var(x.clone())),
    ]);
    let p2 = Term::array_pattern([
        ArrayPart::Items(vec![Term::Var(a.clone())]),
        ArrayPart::Spread(Term::Var(y.clone())),
    ]);

    let b = must_unify(&p1, &p2);
    assert_eq!(resolved(&b, &a), Term::Int(1));

    // Closing one spread closes the other through the link.
    let mut u = unifier();
    let b = u
        .unify(&Term::Var(x), &Term::seq([Term::Int(7)]), &b, &loc())
        .unwrap()
        .unwrap();
    assert_eq!(resolved(&b, &y), Term::seq([Term::Int(7)]));
}

// ---------------------------------------------------------------------------
// Object patterns
// ---------------------------------------------------------------------------

#[test]
fn object_spread_takes_exact_leftovers() {
    let ids = VarIdGen::starting_at(1);
    let rest = ids.fresh("R");
    // {a: 1, ...R, c: 3}
    let pattern = Term::object_pattern([
        ObjectPart::props([("a", Term::Int(1))]),
        ObjectPart::Spread(Term::Var(rest.clone())),
        ObjectPart::props([("c", Term::Int(3))]),
    ]);

    let b = must_unify(
        &pattern,
        &Term::map([("a", Term::Int(1)), ("b", Term::Int(2)), ("c", Term::Int(3))]),
    );
    assert_eq!(resolved(&b, &rest), Term::map([("b", Term::Int(2))]));

    let pattern = Term::object_pattern([
        ObjectPart::props([("a", Term::Int(1))]),
        ObjectPart::Spread(Term::Var(rest.clone())),
        ObjectPart::props([("c", Term::Int(3))]),
    ]);
    let b = must_unify(
        &pattern,
        &Term::map([("a", Term::Int(1)), ("c", Term::Int(3))]),
    );
    assert_eq!(resolved(&b, &rest), Term::empty_map());
}

#[test]
fn multiple_object_spreads_are_deterministic_last_wins() {
    let ids = VarIdGen::starting_at(1);
    let r1 = ids.fresh("R1");
    let r2 = ids.fresh("R2");
    let pattern = Term::object_pattern([
        ObjectPart::Spread(Term::Var(r1.clone())),
        ObjectPart::Spread(Term::Var(r2.clone())),
    ]);

    let b = must_unify(&pattern, &Term::map([("x", Term::Int(1))]));
    assert_eq!(resolved(&b, &r1), Term::empty_map());
    assert_eq!(resolved(&b, &r2), Term::map([("x", Term::Int(1))]));
}

#[test]
fn closed_object_pattern_rejects_leftovers() {
    let pattern = Term::object_pattern([ObjectPart::props([("a", Term::Int(1))])]);
    must_fail(
        &pattern,
        &Term::map([("a", Term::Int(1)), ("b", Term::Int(2))]),
    );
}

#[test]
fn missing_fixed_key_fails_unless_slot() {
    let ids = VarIdGen::starting_at(1);
    let rest = ids.fresh("R");
    let pattern = Term::object_pattern([
        ObjectPart::props([("a", Term::Int(1))]),
        ObjectPart::Spread(Term::Var(rest)),
    ]);
    must_fail(&pattern, &Term::map([("b", Term::Int(2))]));
}

#[test]
fn open_object_patterns_meet_through_a_pivot() {
    let ids = VarIdGen::starting_at(1);
    let r1 = ids.fresh("R1");
    let r2 = ids.fresh("R2");

    let p1 = Term::object_pattern([
        ObjectPart::props([("a", Term::Int(1))]),
        ObjectPart::Spread(Term::Var(r1.clone())),
    ]);
    let p2 = Term::object_pattern([
        ObjectPart::props([("b", Term::Int(2))]),
        ObjectPart::Spread(Term::Var(r2.clone())),
    ]);

    let b = must_unify(&p1, &p2);
    // Each side's spread owes the other side's fixed key; neither commits
    // to a concrete remainder.
    let r1_ground = ground(&Term::Var(r1), &b).unwrap();
    match &r1_ground {
        Term::Object(open) => {
            let has_b = open.parts.iter().any(|part| {
                matches!(part, ObjectPart::Props(props) if props.contains_key("b"))
            });
            assert!(has_b, "R1 should owe key `b`, got {r1_ground}");
        }
        other => panic!("expected R1 to stay an open pattern, got {other}"),
    }
    assert!(matches!(ground(&Term::Var(r2), &b).unwrap(), Term::Object(_)));
}

#[test]
fn grounding_spread_bound_to_scalar_raises_pattern_error() {
    let ids = VarIdGen::starting_at(1);
    let rest = ids.fresh("R");
    let base = Bindings::new().with(rest.clone(), Binding::unbound(Term::Int(3)));

    let pattern = Term::object_pattern([ObjectPart::Spread(Term::Var(rest))]);
    let err = unifier()
        .unify(&pattern, &Term::map([("a", Term::Int(1))]), &base, &loc())
        .unwrap_err();
    assert!(matches!(err, PatternError::ObjectSpreadNotMap { .. }));
}

// ---------------------------------------------------------------------------
// Deferred native constraints
// ---------------------------------------------------------------------------

fn greater_than_five() -> horn_term::NativeCheck {
    Rc::new(|args: &[Term]| matches!(args, [Term::Int(n)] if *n > 5))
}

#[test]
fn ground_constraint_checks_immediately() {
    let mut u = unifier();
    let ok = u.constrain(
        &Bindings::new(),
        greater_than_five(),
        vec![Term::Int(7)],
        &loc(),
    );
    assert!(ok.is_some());

    let bad = u.constrain(
        &Bindings::new(),
        greater_than_five(),
        vec![Term::Int(3)],
        &loc(),
    );
    assert!(bad.is_none());
}

#[test]
fn deferred_constraint_wakes_on_bind() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let mut u = unifier();

    let b = u
        .constrain(
            &Bindings::new(),
            greater_than_five(),
            vec![Term::Var(x.clone())],
            &loc(),
        )
        .unwrap();

    // Binding below the bound fails; above it succeeds.
    assert!(u
        .unify(&Term::Var(x.clone()), &Term::Int(3), &b, &loc())
        .unwrap()
        .is_none());
    let bound = u
        .unify(&Term::Var(x.clone()), &Term::Int(7), &b, &loc())
        .unwrap()
        .unwrap();
    assert_eq!(bound.resolve(&Term::Var(x)).value, Term::Int(7));
}

#[test]
fn multi_variable_constraint_defers_until_all_ground() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let y = ids.fresh("Y");
    let less_than = Rc::new(|args: &[Term]| match args {
        [Term::Int(a), Term::Int(b)] => a < b,
        _ => false,
    });

    let mut u = unifier();
    let b = u
        .constrain(
            &Bindings::new(),
            less_than,
            vec![Term::Var(x.clone()), Term::Var(y.clone())],
            &loc(),
        )
        .unwrap();

    // First binding leaves the check parked.
    let b = u
        .unify(&Term::Var(x.clone()), &Term::Int(1), &b, &loc())
        .unwrap()
        .unwrap();
    // Second binding decides it.
    assert!(u
        .unify(&Term::Var(y.clone()), &Term::Int(0), &b, &loc())
        .unwrap()
        .is_none());
    assert!(u
        .unify(&Term::Var(y), &Term::Int(2), &b, &loc())
        .unwrap()
        .is_some());
}

#[test]
fn constraints_report_with_current_arguments() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let y = ids.fresh("Y");
    let mut u = unifier();

    let b = u
        .constrain(
            &Bindings::new(),
            Rc::new(|_| true),
            vec![Term::Var(x.clone()), Term::Var(y.clone())],
            &loc(),
        )
        .unwrap();
    let b = u
        .unify(&Term::Var(y), &Term::Int(4), &b, &loc())
        .unwrap()
        .unwrap();

    let pending = Unifier::constraints(&Term::Var(x.clone()), &b);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].args[1], Term::Int(4));

    // A concrete value has no pending constraints.
    assert!(Unifier::constraints(&Term::Int(1), &b).is_empty());
}

// ---------------------------------------------------------------------------
// Opaque custom unifiers
// ---------------------------------------------------------------------------

/// A string that unifies case-insensitively — exercises the hook contract.
#[derive(Debug)]
struct FoldedStr(String);

impl OpaqueTerm for FoldedStr {
    fn type_name(&self) -> &str {
        "folded-str"
    }

    fn unify_opaque(
        &self,
        unifier: &mut dyn TermUnifier,
        other: &Binding,
        bindings: &Bindings,
        location: &Location,
        self_binding: &Binding,
    ) -> Unified {
        match &other.value {
            Term::Str(s) => Ok(if s.eq_ignore_ascii_case(&self.0) {
                Some(bindings.clone())
            } else {
                None
            }),
            Term::Var(var) if !var.is_anon() => {
                Ok(unifier.bind_resolved(other, self_binding, bindings, location))
            }
            Term::Var(_) => Ok(Some(bindings.clone())),
            _ => Ok(None),
        }
    }
}

#[test]
fn opaque_terms_control_their_own_unification() {
    let folded = Term::opaque(FoldedStr("Hello".to_string()));
    must_unify(&folded, &Term::str("HELLO"));
    must_fail(&folded, &Term::str("nope"));
    must_fail(&folded, &Term::Int(1));

    // Nested inside a plain structure, the hook still runs when the outer
    // variable binds (the walk rule).
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let b = must_unify(&Term::Var(x.clone()), &Term::seq([folded]));
    assert!(b.contains(&x));
}

// ---------------------------------------------------------------------------
// Step tracing
// ---------------------------------------------------------------------------

#[test]
fn tracing_records_and_serializes_steps() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let mut u = unifier();
    u.enable_tracing();

    u.unify(
        &Term::seq([Term::Var(x), Term::Int(2)]),
        &Term::seq([Term::Int(1), Term::Int(2)]),
        &Bindings::new(),
        &loc(),
    )
    .unwrap()
    .unwrap();

    let steps = u.take_unify_trace();
    assert!(steps
        .iter()
        .any(|s| matches!(s.action, UnifyAction::Decompose)));
    assert!(steps.iter().any(|s| matches!(s.action, UnifyAction::Bind)));

    let json = serde_json::to_string(&steps).unwrap();
    assert!(json.contains("\"bind\""));
}

#[test]
fn tracing_is_off_by_default() {
    let mut u = unifier();
    u.unify(&Term::Int(1), &Term::Int(1), &Bindings::new(), &loc())
        .unwrap()
        .unwrap();
    assert!(u.unify_trace().is_empty());
}

// ---------------------------------------------------------------------------
// Symmetry spot checks (the property test covers the general case)
// ---------------------------------------------------------------------------

#[test]
fn unification_is_symmetric_for_patterns() {
    let ids = VarIdGen::starting_at(1);
    let x = ids.fresh("X");
    let pattern = Term::array_pattern([
        ArrayPart::Spread(Term::Var(x)),
        ArrayPart::Items(vec![Term::Int(1)]),
    ]);
    let value = Term::seq([Term::str("a"), Term::Int(1)]);

    let forward = unifier()
        .unify(&pattern, &value, &Bindings::new(), &loc())
        .unwrap();
    let backward = unifier()
        .unify(&value, &pattern, &Bindings::new(), &loc())
        .unwrap();
    assert_eq!(forward.is_some(), backward.is_some());
}
