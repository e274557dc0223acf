//! Object pattern unification: `{fixed: props, ...spread}`.
//!
//! Spread distribution against a concrete map is deterministic, never a
//! choice point: no spreads means no leftovers allowed, one spread takes the
//! whole leftover map, and with several spreads every one but the last
//! unifies with `{}` while the last absorbs the leftovers. Pattern-vs-pattern
//! unification routes each side's missing keys to the other side's spreads;
//! when both sides are open, a fresh pivot variable stands for the shared
//! open remainder so neither side commits to a smaller map than necessary.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use horn_term::ground::{build_object_term, flatten_object_parts, FlatObject};
use horn_term::{Binding, Bindings, Location, ObjectPart, ObjectPattern, Term, Unified};

use crate::{attempt, UnifyAction, Unifier};

pub(crate) fn unify_object(
    u: &mut Unifier,
    pattern: &ObjectPattern,
    other: &Binding,
    bindings: &Bindings,
    location: &Location,
    self_binding: &Binding,
) -> Unified {
    let mut b = bindings.clone();

    if other.value.is_var() {
        match u.bind(other, self_binding, &b, location) {
            Some(next) => b = next,
            None => return Ok(None),
        }
    }

    if let Term::Object(that) = &other.value {
        return unify_symmetric(u, &pattern.parts, &that.parts, &b, location);
    }

    if let Term::Map(map) = &other.value {
        let flat = flatten_object_parts(&pattern.parts, &b)?;

        // Partition the concrete map into keys claimed by fixed props and
        // the leftover owed to spreads.
        let mut fixed_value: BTreeMap<String, Term> = BTreeMap::new();
        let mut rest_value: BTreeMap<String, Term> = BTreeMap::new();
        for (key, entry) in map.iter() {
            if flat.fixed.contains_key(key) {
                fixed_value.insert(key.clone(), entry.clone());
            } else {
                rest_value.insert(key.clone(), entry.clone());
            }
        }

        for (key, pattern_value) in &flat.fixed {
            match fixed_value.get(key) {
                Some(entry) => {
                    b = attempt!(u.unify(pattern_value, entry, &b, location));
                }
                None => {
                    // Missing key: only a slot can absorb the absence.
                    let resolved = b.resolve(pattern_value).value;
                    if !matches!(resolved, Term::Slot(_)) {
                        return Ok(None);
                    }
                    b = attempt!(u.unify(&resolved, &Term::Missing, &b, location));
                }
            }
        }

        match flat.spreads.len() {
            0 => {
                if !rest_value.is_empty() {
                    return Ok(None);
                }
            }
            1 => {
                let rest = Term::Map(Rc::new(rest_value));
                b = attempt!(u.unify(&flat.spreads[0], &rest, &b, location));
            }
            n => {
                // Deterministic, last-wins: earlier spreads get `{}`.
                let empty = Term::Map(Rc::new(BTreeMap::new()));
                for spread in &flat.spreads[..n - 1] {
                    b = attempt!(u.unify(spread, &empty, &b, location));
                }
                let rest = Term::Map(Rc::new(rest_value));
                b = attempt!(u.unify(&flat.spreads[n - 1], &rest, &b, location));
            }
        }

        return Ok(Some(b));
    }

    if other.value.is_var() {
        return walk_parts(u, &pattern.parts, &b, location);
    }

    Ok(None)
}

/// What one side lacks and the other must supply.
#[derive(Default)]
struct Needs {
    fixed: BTreeMap<String, Term>,
    spreads: Vec<Term>,
}

fn unify_symmetric(
    u: &mut Unifier,
    parts1: &[ObjectPart],
    parts2: &[ObjectPart],
    bindings: &Bindings,
    location: &Location,
) -> Unified {
    let p1 = flatten_object_parts(parts1, bindings)?;
    let p2 = flatten_object_parts(parts2, bindings)?;

    let mut b = bindings.clone();
    let mut p1_needs = Needs::default();
    let mut p2_needs = Needs::default();

    let all_keys: BTreeSet<&String> = p1.fixed.keys().chain(p2.fixed.keys()).collect();
    for key in all_keys {
        match (p1.fixed.get(key), p2.fixed.get(key)) {
            (Some(e1), Some(e2)) => {
                b = attempt!(u.unify(e1, e2, &b, location));
            }
            (Some(e1), None) => {
                p2_needs.fixed.insert(key.clone(), e1.clone());
            }
            (None, Some(e2)) => {
                p1_needs.fixed.insert(key.clone(), e2.clone());
            }
            (None, None) => unreachable!("key came from one of the sides"),
        }
    }

    let open1 = !p1.spreads.is_empty();
    let open2 = !p2.spreads.is_empty();

    // A closed side cannot absorb needs; only optional slots can stand in
    // for its missing keys.
    if !open1 {
        b = attempt!(process_closed_needs(u, &mut p1_needs, &b, location));
    }
    if !open2 {
        b = attempt!(process_closed_needs(u, &mut p2_needs, &b, location));
    }

    if open1 && open2 {
        // Both open: a fresh pivot stands for the shared remainder.
        let pivot = Term::Var(u.fresh("Pivot"));
        u.push_step(UnifyAction::Pivot, &pivot, &pivot, "open-vs-open remainder");

        p1_needs.spreads.push(pivot.clone());
        b = attempt!(unify_spreads_against_needs(
            u, &p1.spreads, &p1_needs, &b, location
        ));
        p2_needs.spreads.push(pivot);
        unify_spreads_against_needs(u, &p2.spreads, &p2_needs, &b, location)
    } else if open1 {
        p1_needs.spreads.extend(p2.spreads.iter().cloned());
        unify_spreads_against_needs(u, &p1.spreads, &p1_needs, &b, location)
    } else if open2 {
        p2_needs.spreads.extend(p1.spreads.iter().cloned());
        unify_spreads_against_needs(u, &p2.spreads, &p2_needs, &b, location)
    } else {
        // Both closed; the shared keys already unified and the needs were
        // satisfied above.
        Ok(Some(b))
    }
}

/// A closed side satisfies needs only through optional slots ("unify with
/// undefined"); needed spreads are a hard failure.
fn process_closed_needs(
    u: &mut Unifier,
    needs: &mut Needs,
    bindings: &Bindings,
    location: &Location,
) -> Unified {
    if !needs.spreads.is_empty() {
        return Ok(None);
    }
    let mut b = bindings.clone();
    for entry in std::mem::take(&mut needs.fixed).into_values() {
        b = attempt!(u.unify(&entry, &Term::Missing, &b, location));
    }
    Ok(Some(b))
}

/// Unify one side's spreads against everything the other side owes it.
fn unify_spreads_against_needs(
    u: &mut Unifier,
    spreads: &[Term],
    needs: &Needs,
    bindings: &Bindings,
    location: &Location,
) -> Unified {
    let mut parts: Vec<ObjectPart> = vec![ObjectPart::Props(needs.fixed.clone())];
    parts.extend(needs.spreads.iter().cloned().map(ObjectPart::Spread));
    let flat_needs = flatten_object_parts(&parts, bindings)?;
    let needs_term = build_object_term(flat_needs);

    let spreads_term = build_object_term(FlatObject {
        fixed: BTreeMap::new(),
        spreads: spreads.to_vec(),
    });

    u.unify(&spreads_term, &needs_term, bindings, location)
}

/// Unify every nested part against `_` so embedded custom unifiers run even
/// though the other side is unconstrained.
fn walk_parts(
    u: &mut Unifier,
    parts: &[ObjectPart],
    bindings: &Bindings,
    location: &Location,
) -> Unified {
    let mut b = bindings.clone();
    for part in parts {
        match part {
            ObjectPart::Props(props) => {
                for entry in props.values() {
                    b = attempt!(u.unify(entry, &Term::anon(), &b, location));
                }
            }
            ObjectPart::Spread(spread) => {
                b = attempt!(u.unify(spread, &Term::anon(), &b, location));
            }
        }
    }
    Ok(Some(b))
}
