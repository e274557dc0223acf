//! Persistent variable bindings.
//!
//! `Bindings` is a copy-on-write map from variable to `Binding`; every
//! successful unification step produces a *new* value and older snapshots
//! stay valid, which is what lets a scheduler hold many live choice points
//! at once. A variable present in the map is never re-bound to a different
//! value — steps only add entries (or upgrade a variable's self-entry, which
//! carries parked constraints, to its final value).

use im::HashMap;

use crate::ground::symbols_each;
use crate::trace::{Trace, TraceEvent};
use crate::{Term, VarId};

/// A variable's resolved value plus the provenance trace that produced it.
///
/// An *unbound* variable with parked constraints is represented as a binding
/// of the variable to itself, carrying the constraint events in its trace.
#[derive(Clone, Debug)]
pub struct Binding {
    pub value: Term,
    pub trace: Trace,
}

impl Binding {
    pub fn unbound(term: Term) -> Binding {
        Binding {
            value: term,
            trace: Trace::empty(),
        }
    }

    pub fn new(value: Term, trace: Trace) -> Binding {
        Binding { value, trace }
    }
}

/// Persistent map `VarId -> Binding` with structural sharing.
#[derive(Clone, Default)]
pub struct Bindings {
    map: HashMap<VarId, Binding>,
}

impl Bindings {
    pub fn new() -> Bindings {
        Bindings::default()
    }

    pub fn get(&self, var: &VarId) -> Option<&Binding> {
        self.map.get(var)
    }

    pub fn contains(&self, var: &VarId) -> bool {
        self.map.contains_key(var)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VarId, &Binding)> {
        self.map.iter()
    }

    /// A new snapshot with `var` bound. The receiver is untouched.
    pub fn with(&self, var: VarId, binding: Binding) -> Bindings {
        Bindings {
            map: self.map.update(var, binding),
        }
    }

    /// Layer `updates` over this snapshot; entries in `updates` win. Used to
    /// fold a subgoal's solution into its caller's bindings.
    pub fn merge(&self, updates: &Bindings) -> Bindings {
        let mut map = self.map.clone();
        for (var, binding) in updates.map.iter() {
            map.insert(var.clone(), binding.clone());
        }
        Bindings { map }
    }

    /// Follow the binding chain for `term` to its final binding.
    ///
    /// Non-variables and unbound variables come back as themselves with an
    /// empty trace. Implemented iteratively: denormalized chains produced by
    /// heavy backtracking can be long and must not overflow the stack.
    pub fn resolve(&self, term: &Term) -> Binding {
        let mut var = match term {
            Term::Var(v) => v,
            other => return Binding::unbound(other.clone()),
        };

        let mut binding = match self.map.get(var) {
            Some(b) => b,
            None => return Binding::unbound(term.clone()),
        };

        // Walk while the binding points at a *different* variable that is
        // itself present; a self-link, a concrete value, or a dangling
        // variable ends the chain.
        loop {
            match &binding.value {
                Term::Var(next) if next != var => match self.map.get(next) {
                    Some(next_binding) => {
                        var = next;
                        binding = next_binding;
                    }
                    None => break,
                },
                _ => break,
            }
        }

        binding.clone()
    }

    /// Extract the transitive binding subgraph reachable from `root` into a
    /// fresh `Bindings`.
    ///
    /// Follows both value links and the argument terms of parked
    /// constraints, so a handed-off scope keeps every variable a wake-up
    /// check could touch.
    pub fn flatten_reachable(&self, root: &Term) -> Bindings {
        let mut out = HashMap::new();
        let mut visited = std::collections::HashSet::new();
        let mut stack: Vec<VarId> = Vec::new();

        symbols_each(root, &mut visited, &mut |var| stack.push(var.clone()));

        while let Some(var) = stack.pop() {
            let Some(binding) = self.map.get(&var) else {
                continue;
            };
            out.insert(var, binding.clone());

            symbols_each(&binding.value, &mut visited, &mut |v| {
                stack.push(v.clone());
            });
            for event in binding.trace.iter() {
                if let TraceEvent::Constraint(cell) = event {
                    for arg in &cell.args {
                        symbols_each(arg, &mut visited, &mut |v| stack.push(v.clone()));
                    }
                }
            }
        }

        Bindings { map: out }
    }
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<_> = self.map.iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        let mut map = f.debug_map();
        for (var, binding) in entries {
            map.entry(&var.display_name(), &binding.value);
        }
        map.finish()
    }
}
