//! Structural unification for Horn.
//!
//! The single entry point is [`Unifier::unify`]. Dispatch order, first match
//! wins:
//!
//! 1. resolve both sides;
//! 2. identical values succeed with bindings unchanged;
//! 3. a side with custom unification behavior (array/object patterns,
//!    default slots, opaque terms) takes over;
//! 4. sequences unify elementwise;
//! 5. maps unify under strict key matching, with default slots absorbing
//!    missing counterparts;
//! 6. a lone variable is occurs-checked and bound, then the other side is
//!    walked against `_` so patterns nested inside plain structures still
//!    get a chance to run;
//! 7. otherwise the step fails.
//!
//! Failure is a normal `Ok(None)` return that backtracking absorbs;
//! malformed patterns raise [`PatternError`] and abort the enclosing solve.

pub mod array;
pub mod constraint;
pub mod object;
pub mod trace;
pub mod value;

#[cfg(test)]
mod unify_tests;

use horn_term::{
    occurs, Binding, Bindings, Location, Term, TermUnifier, Trace, TraceEvent, Unified, VarId,
    VarIdGen,
};

pub use constraint::PendingConstraint;
pub use horn_term::PatternError;
pub use trace::{UnifyAction, UnifyStep};

/// Runs unification steps and (optionally) records them.
///
/// The unifier itself is stateless with respect to bindings — every call
/// takes a snapshot and returns a new one — but it owns the fresh-variable
/// source used for pivots, and the opt-in step trace.
pub struct Unifier {
    ids: VarIdGen,
    tracing: bool,
    steps: Vec<UnifyStep>,
}

/// `match` helper for the ubiquitous "fail means return `Ok(None)`" step.
macro_rules! attempt {
    ($expr:expr) => {
        match $expr? {
            Some(bindings) => bindings,
            None => return Ok(None),
        }
    };
}
pub(crate) use attempt;

impl Unifier {
    pub fn new(ids: VarIdGen) -> Self {
        Unifier {
            ids,
            tracing: false,
            steps: Vec::new(),
        }
    }

    /// Generate a fresh variable (used for pivots and by callers that need
    /// internally introduced links).
    pub fn fresh(&mut self, name: &str) -> VarId {
        self.ids.fresh(name)
    }

    // -- Tracing ----------------------------------------------------------

    pub fn enable_tracing(&mut self) {
        self.tracing = true;
        self.steps.clear();
    }

    pub fn is_tracing(&self) -> bool {
        self.tracing
    }

    pub fn unify_trace(&self) -> &[UnifyStep] {
        &self.steps
    }

    pub fn take_unify_trace(&mut self) -> Vec<UnifyStep> {
        std::mem::take(&mut self.steps)
    }

    pub(crate) fn push_step(
        &mut self,
        action: UnifyAction,
        left: &Term,
        right: &Term,
        detail: impl Into<String>,
    ) {
        if !self.tracing {
            return;
        }
        let step = self.steps.len();
        self.steps.push(UnifyStep {
            step,
            action,
            left: left.to_string(),
            right: right.to_string(),
            detail: detail.into(),
        });
    }

    // -- Unification ------------------------------------------------------

    /// Unify two terms under `bindings`. Symmetric: argument order only
    /// decides which variable becomes the binding target (the first resolved
    /// variable side).
    pub fn unify(
        &mut self,
        left: &Term,
        right: &Term,
        bindings: &Bindings,
        location: &Location,
    ) -> Unified {
        let b1 = bindings.resolve(left);
        let b2 = bindings.resolve(right);
        self.unify_resolved(&b1, &b2, bindings, location)
    }

    /// Unify two already-resolved bindings. Pattern hooks call back in here
    /// when they have resolved a side themselves.
    pub fn unify_resolved(
        &mut self,
        b1: &Binding,
        b2: &Binding,
        bindings: &Bindings,
        location: &Location,
    ) -> Unified {
        let v1 = &b1.value;
        let v2 = &b2.value;

        if v1.same_identity(v2) {
            self.push_step(UnifyAction::Identity, v1, v2, "sides already equal");
            return Ok(Some(bindings.clone()));
        }

        // Custom unification outranks variable binding: a pattern meeting a
        // variable decides for itself how the variable is bound.
        match v1 {
            Term::Array(pattern) => {
                self.push_step(UnifyAction::Pattern, v1, v2, "array pattern on the left");
                return array::unify_array(self, pattern, b2, bindings, location, b1);
            }
            Term::Object(pattern) => {
                self.push_step(UnifyAction::Pattern, v1, v2, "object pattern on the left");
                return object::unify_object(self, pattern, b2, bindings, location, b1);
            }
            Term::Slot(slot) => {
                self.push_step(UnifyAction::Pattern, v1, v2, "value slot on the left");
                return value::unify_slot(self, slot, b2, bindings, location, b1);
            }
            Term::Opaque(opaque) => {
                self.push_step(UnifyAction::Pattern, v1, v2, "opaque term on the left");
                return opaque.clone().unify_opaque(self, b2, bindings, location, b1);
            }
            _ => {}
        }
        match v2 {
            Term::Array(pattern) => {
                self.push_step(UnifyAction::Pattern, v1, v2, "array pattern on the right");
                return array::unify_array(self, pattern, b1, bindings, location, b2);
            }
            Term::Object(pattern) => {
                self.push_step(UnifyAction::Pattern, v1, v2, "object pattern on the right");
                return object::unify_object(self, pattern, b1, bindings, location, b2);
            }
            Term::Slot(slot) => {
                self.push_step(UnifyAction::Pattern, v1, v2, "value slot on the right");
                return value::unify_slot(self, slot, b1, bindings, location, b2);
            }
            Term::Opaque(opaque) => {
                self.push_step(UnifyAction::Pattern, v1, v2, "opaque term on the right");
                return opaque.clone().unify_opaque(self, b1, bindings, location, b2);
            }
            _ => {}
        }

        if let (Term::Seq(s1), Term::Seq(s2)) = (v1, v2) {
            if s1.len() != s2.len() {
                self.push_step(UnifyAction::Fail, v1, v2, "sequence lengths differ");
                return Ok(None);
            }
            self.push_step(UnifyAction::Decompose, v1, v2, "sequences elementwise");
            let mut b = bindings.clone();
            for (e1, e2) in s1.iter().zip(s2.iter()) {
                b = attempt!(self.unify(e1, e2, &b, location));
            }
            return Ok(Some(b));
        }

        if let (Term::Map(m1), Term::Map(m2)) = (v1, v2) {
            self.push_step(UnifyAction::Decompose, v1, v2, "maps under strict keys");
            let mut b = bindings.clone();
            for (key, e1) in m1.iter() {
                match m2.get(key) {
                    Some(e2) => {
                        b = attempt!(self.unify(e1, e2, &b, location));
                    }
                    None => {
                        // A key missing from the other side is only
                        // tolerated when the present value is a slot that
                        // can absorb the absence.
                        let resolved = b.resolve(e1).value;
                        if !matches!(resolved, Term::Slot(_)) {
                            self.push_step(UnifyAction::Fail, v1, v2, format!("key `{key}` missing"));
                            return Ok(None);
                        }
                        b = attempt!(self.unify(e1, &Term::Missing, &b, location));
                    }
                }
            }
            for (key, e2) in m2.iter() {
                if m1.contains_key(key) {
                    continue;
                }
                let resolved = b.resolve(e2).value;
                if !matches!(resolved, Term::Slot(_)) {
                    self.push_step(UnifyAction::Fail, v1, v2, format!("key `{key}` missing"));
                    return Ok(None);
                }
                b = attempt!(self.unify(&Term::Missing, e2, &b, location));
            }
            return Ok(Some(b));
        }

        if v1.is_var() {
            let Some(b) = self.bind(b1, b2, bindings, location) else {
                return Ok(None);
            };
            return self.walk(v2, &b, location);
        }
        if v2.is_var() {
            let Some(b) = self.bind(b2, b1, bindings, location) else {
                return Ok(None);
            };
            return self.walk(v1, &b, location);
        }

        self.push_step(UnifyAction::Fail, v1, v2, "no rule applies");
        Ok(None)
    }

    /// Bind the variable held by `target` to `value`'s term.
    ///
    /// Guards the anonymous variable, runs the occurs check, and replays the
    /// target's parked constraint checks against a concrete value. A
    /// variable-to-variable bind links the two so the target inherits the
    /// source's history.
    pub fn bind(
        &mut self,
        target: &Binding,
        value: &Binding,
        bindings: &Bindings,
        location: &Location,
    ) -> Option<Bindings> {
        let var = match &target.value {
            Term::Var(var) => var.clone(),
            // Callers only hand us resolved variables; anything else cannot
            // be a binding target.
            _ => return None,
        };

        if var.is_anon() || value.value.is_anon() {
            return Some(bindings.clone());
        }

        if occurs(&value.value, &var) {
            self.push_step(
                UnifyAction::OccursCheck,
                &target.value,
                &value.value,
                "cyclic binding rejected",
            );
            return None;
        }

        if let Term::Var(other) = &value.value {
            // Target inherits the source's history; the source becomes a
            // plain link pointing at the target.
            let combined = Trace::concat(target.trace.clone(), value.trace.clone());
            let link = Trace::of(TraceEvent::Bind {
                var: other.clone(),
                value: Term::Var(var.clone()),
                location: location.clone(),
            });
            self.push_step(
                UnifyAction::Bind,
                &target.value,
                &value.value,
                format!("{} -> {}", var.display_name(), other.display_name()),
            );
            return Some(
                bindings
                    .with(
                        var,
                        Binding::new(Term::Var(other.clone()), link),
                    )
                    .with(
                        other.clone(),
                        Binding::new(Term::Var(other.clone()), combined),
                    ),
            );
        }

        // Concrete value: the accumulated constraint checks must accept it.
        for event in target.trace.iter() {
            if let TraceEvent::Constraint(cell) = event {
                if !constraint::run_check(cell, &value.value, bindings, &var) {
                    self.push_step(
                        UnifyAction::Fail,
                        &target.value,
                        &value.value,
                        "parked constraint rejected the value",
                    );
                    return None;
                }
            }
        }

        let link = Trace::concat(
            Trace::of(TraceEvent::Bind {
                var: var.clone(),
                value: value.value.clone(),
                location: location.clone(),
            }),
            Trace::concat(target.trace.clone(), value.trace.clone()),
        );
        self.push_step(
            UnifyAction::Bind,
            &target.value,
            &value.value,
            format!("{} := {}", var.display_name(), value.value),
        );
        Some(bindings.with(var, Binding::new(value.value.clone(), link)))
    }

    /// After binding a variable to a composite value, unify each nested
    /// element against `_` so custom unifiers embedded inside plain
    /// structures still run.
    pub(crate) fn walk(
        &mut self,
        value: &Term,
        bindings: &Bindings,
        location: &Location,
    ) -> Unified {
        match value {
            Term::Seq(items) => {
                let mut b = bindings.clone();
                for item in items.iter() {
                    b = attempt!(self.unify(item, &Term::anon(), &b, location));
                }
                Ok(Some(b))
            }
            Term::Map(entries) => {
                let mut b = bindings.clone();
                for entry in entries.values() {
                    b = attempt!(self.unify(entry, &Term::anon(), &b, location));
                }
                Ok(Some(b))
            }
            _ => Ok(Some(bindings.clone())),
        }
    }
}

impl TermUnifier for Unifier {
    fn unify_terms(
        &mut self,
        left: &Term,
        right: &Term,
        bindings: &Bindings,
        location: &Location,
    ) -> Unified {
        self.unify(left, right, bindings, location)
    }

    fn unify_resolved(
        &mut self,
        left: &Binding,
        right: &Binding,
        bindings: &Bindings,
        location: &Location,
    ) -> Unified {
        Unifier::unify_resolved(self, left, right, bindings, location)
    }

    fn bind_resolved(
        &mut self,
        target: &Binding,
        value: &Binding,
        bindings: &Bindings,
        location: &Location,
    ) -> Option<Bindings> {
        self.bind(target, value, bindings, location)
    }

    fn fresh_var(&mut self, name: &str) -> VarId {
        self.fresh(name)
    }
}

/// Convenience for one-shot unification with default id allocation.
pub fn unify(left: &Term, right: &Term, bindings: &Bindings, location: &Location) -> Unified {
    Unifier::new(VarIdGen::new()).unify(left, right, bindings, location)
}
