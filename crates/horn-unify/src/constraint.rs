//! Native deferred constraints.
//!
//! `constrain` attaches a host-language check over argument terms to every
//! unbound variable the arguments mention. Binding any of those variables
//! replays the check: still-unbound arguments defer it again, fully ground
//! arguments decide pass or fail. The original argument terms are kept in
//! the parked cell so each replay sees the then-current bindings.

use std::collections::BTreeSet;
use std::rc::Rc;

use horn_term::{
    Binding, Bindings, ConstraintCell, Location, NativeCheck, Term, Trace, TraceEvent, VarId,
};

use crate::{UnifyAction, Unifier};

/// A constraint still parked on a variable, with its arguments resolved
/// against the bindings it was inspected under.
#[derive(Debug, Clone)]
pub struct PendingConstraint {
    pub args: Vec<Term>,
    pub location: Location,
}

impl Unifier {
    /// Apply a native check now if every argument is ground, or park it on
    /// the unbound variables it mentions. Returns `None` when an immediately
    /// checkable constraint fails.
    pub fn constrain(
        &mut self,
        bindings: &Bindings,
        check: NativeCheck,
        args: Vec<Term>,
        location: &Location,
    ) -> Option<Bindings> {
        let mut resolved = Vec::with_capacity(args.len());
        let mut unbound: BTreeSet<VarId> = BTreeSet::new();

        for arg in &args {
            let value = bindings.resolve(arg).value;
            if let Term::Var(var) = &value {
                unbound.insert(var.clone());
            }
            resolved.push(value);
        }

        if unbound.is_empty() {
            return if check(&resolved) {
                Some(bindings.clone())
            } else {
                None
            };
        }

        let cell = Rc::new(ConstraintCell {
            check,
            args: args.clone(),
            location: location.clone(),
        });
        if let Some(first) = args.first() {
            self.push_step(
                UnifyAction::Defer,
                first,
                first,
                format!("parked on {} variable(s)", unbound.len()),
            );
        }

        // One snapshot update covering every variable the check watches.
        let mut next = bindings.clone();
        for var in unbound {
            // A strictly unbound variable keeps its already-parked checks;
            // anything else starts a fresh trace.
            let existing = match bindings.get(&var) {
                Some(entry) if matches!(&entry.value, Term::Var(v) if *v == var) => {
                    entry.trace.clone()
                }
                _ => Trace::empty(),
            };
            let trace = Trace::concat(existing, Trace::of(TraceEvent::Constraint(cell.clone())));
            next = next.with(var.clone(), Binding::new(Term::Var(var), trace));
        }
        Some(next)
    }

    /// The constraints still pending on `term`, with arguments resolved
    /// against the current bindings. A term that resolves to a concrete
    /// value has none.
    pub fn constraints(term: &Term, bindings: &Bindings) -> Vec<PendingConstraint> {
        let resolved = bindings.resolve(term);
        if !resolved.value.is_var() {
            return Vec::new();
        }

        let mut seen: Vec<*const ConstraintCell> = Vec::new();
        let mut out = Vec::new();
        for event in resolved.trace.iter() {
            if let TraceEvent::Constraint(cell) = event {
                let ptr = Rc::as_ptr(cell);
                if seen.contains(&ptr) {
                    continue;
                }
                seen.push(ptr);
                out.push(PendingConstraint {
                    args: cell
                        .args
                        .iter()
                        .map(|arg| bindings.resolve(arg).value)
                        .collect(),
                    location: cell.location.clone(),
                });
            }
        }
        out
    }
}

/// Replay one parked check against the value about to be bound to `bound`.
///
/// Arguments are resolved against the pre-bind snapshot, with the variable
/// being bound (and anything aliased to it) substituted by the incoming
/// value. Any argument still unbound defers the check to a later bind.
pub(crate) fn run_check(
    cell: &ConstraintCell,
    value: &Term,
    bindings: &Bindings,
    bound: &VarId,
) -> bool {
    let mut current = Vec::with_capacity(cell.args.len());
    let mut still_unbound = false;

    for arg in &cell.args {
        let resolved = if matches!(arg, Term::Var(v) if v == bound) {
            value.clone()
        } else {
            let r = bindings.resolve(arg).value;
            if matches!(&r, Term::Var(v) if v == bound) {
                value.clone()
            } else {
                r
            }
        };
        if resolved.is_var() {
            still_unbound = true;
        }
        current.push(resolved);
    }

    if still_unbound {
        // Not checkable yet; succeed and wait for the next bind.
        return true;
    }
    (cell.check)(&current)
}
