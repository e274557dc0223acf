//! Eager solution collection, optionally shaped through a template.

use horn_solve::Solution;
use horn_term::{ground, Term};

use crate::query::SolutionIter;
use crate::EngineError;

/// Collect every solution of a query.
pub fn findall(query: SolutionIter) -> Result<Vec<Solution>, EngineError> {
    query.collect()
}

/// Collect every solution, instantiating `template` against each one.
///
/// The template may mention any query variable; unbound variables pass
/// through unchanged.
pub fn findall_with_template(
    template: &Term,
    query: SolutionIter,
) -> Result<Vec<Term>, EngineError> {
    let mut out = Vec::new();
    for item in query {
        let solution = item?;
        let bindings = solution.to_bindings();
        out.push(ground(template, &bindings)?);
    }
    Ok(out)
}
