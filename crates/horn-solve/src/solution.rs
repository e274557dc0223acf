//! Solution resolution: from a bindings snapshot to the values a caller
//! asked about.

use std::collections::BTreeMap;

use horn_term::{ground, symbols, Binding, Bindings, PatternError, Term, VarId};

/// One solution, keyed by the query's variables. A variable the search left
/// unbound maps to itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Solution {
    values: BTreeMap<VarId, Term>,
}

impl Solution {
    pub fn get(&self, var: &VarId) -> Option<&Term> {
        self.values.get(var)
    }

    /// Look up by display name. With shadowed names the first (oldest)
    /// variable wins.
    pub fn get_named(&self, name: &str) -> Option<&Term> {
        self.values
            .iter()
            .find(|(var, _)| var.name() == Some(name))
            .map(|(_, term)| term)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VarId, &Term)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// View this solution as bindings, e.g. to ground a template against it.
    pub fn to_bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();
        for (var, term) in &self.values {
            if matches!(term, Term::Var(v) if v == var) {
                continue;
            }
            bindings = bindings.with(var.clone(), Binding::unbound(term.clone()));
        }
        bindings
    }
}

/// Ground every variable mentioned in the query arguments against the final
/// bindings of one solution.
pub fn resolve_solution(args: &[Term], bindings: &Bindings) -> Result<Solution, PatternError> {
    let mut values = BTreeMap::new();
    for arg in args {
        for var in symbols(arg) {
            if values.contains_key(&var) {
                continue;
            }
            let term = if bindings.contains(&var) {
                ground(&Term::Var(var.clone()), bindings)?
            } else {
                Term::Var(var.clone())
            };
            values.insert(var, term);
        }
    }
    Ok(Solution { values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use horn_term::VarIdGen;

    #[test]
    fn bound_vars_ground_and_unbound_stay_vars() {
        let ids = VarIdGen::starting_at(1);
        let x = ids.fresh("X");
        let y = ids.fresh("Y");

        let bindings = Bindings::new().with(x.clone(), Binding::unbound(Term::Int(1)));
        let solution =
            resolve_solution(&[Term::Var(x.clone()), Term::Var(y.clone())], &bindings).unwrap();

        assert_eq!(solution.get(&x), Some(&Term::Int(1)));
        assert_eq!(solution.get(&y), Some(&Term::Var(y.clone())));
        assert_eq!(solution.get_named("X"), Some(&Term::Int(1)));
    }

    #[test]
    fn nested_query_vars_are_found() {
        let ids = VarIdGen::starting_at(1);
        let x = ids.fresh("X");
        let bindings = Bindings::new().with(x.clone(), Binding::unbound(Term::str("v")));

        let solution =
            resolve_solution(&[Term::map([("k", Term::Var(x.clone()))])], &bindings).unwrap();
        assert_eq!(solution.get(&x), Some(&Term::str("v")));
    }

    #[test]
    fn to_bindings_round_trips_bound_values() {
        let ids = VarIdGen::starting_at(1);
        let x = ids.fresh("X");
        let bindings = Bindings::new().with(x.clone(), Binding::unbound(Term::Int(4)));
        let solution = resolve_solution(&[Term::Var(x.clone())], &bindings).unwrap();

        let again = solution.to_bindings();
        assert_eq!(again.resolve(&Term::Var(x)).value, Term::Int(4));
    }
}
