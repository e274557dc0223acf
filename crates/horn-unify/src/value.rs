//! Default-slot unification.
//!
//! `Value { slot, default, optional }` is "a variable that should carry
//! `default` unless a concrete value arrives." Optional slots treat the
//! default as soft — a concrete value wins outright and a missing
//! counterpart binds the default. Required slots treat it as an assertion
//! that whatever arrives must also satisfy.

use horn_term::{Binding, Bindings, Location, Term, Unified, Value};

use crate::{attempt, Unifier};

pub(crate) fn unify_slot(
    u: &mut Unifier,
    this: &Value,
    other: &Binding,
    bindings: &Bindings,
    location: &Location,
    _self_binding: &Binding,
) -> Unified {
    let value = &other.value;

    // Slot vs slot: the two slots always join; non-optional sides then pull
    // their defaults in. Two optional slots still check their defaults
    // against each other eagerly, so inconsistent defaults fail here rather
    // than surprising a later binding.
    if let Term::Slot(that) = value {
        let mut b = attempt!(u.unify(&this.slot, &that.slot, bindings, location));
        return match (this.optional, that.optional) {
            (false, false) | (true, true) => {
                b = attempt!(u.unify(&this.slot, &this.default, &b, location));
                u.unify(&this.slot, &that.default, &b, location)
            }
            (false, true) => u.unify(&this.slot, &this.default, &b, location),
            (true, false) => u.unify(&this.slot, &that.default, &b, location),
        };
    }

    // Missing counterpart: soft default succeeds and binds it, hard default
    // fails.
    if matches!(value, Term::Missing) {
        if this.optional {
            return u.unify(&this.slot, &this.default, bindings, location);
        }
        return Ok(None);
    }

    // A value was provided (possibly a variable, possibly null). Join the
    // slot with it first.
    let left = bindings.resolve(&this.slot);
    let mut b = attempt!(u.unify_resolved(&left, other, bindings, location));

    if !value.is_var() && this.optional {
        // Concrete value, soft default: the value wins, no default applied.
        return Ok(Some(b));
    }

    // Either we matched a variable or the default is required: enforce it
    // against the slot, then against the provided side's resolved form.
    b = attempt!(u.unify(&this.slot, &this.default, &b, location));
    let right = b.resolve(&this.default);
    u.unify_resolved(other, &right, &b, location)
}
