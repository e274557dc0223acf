//! Hand-written resolvers for the integration tests, playing the role the
//! compiler front end plays in production: turning clause-shaped programs
//! into four-port state machines.

use horn::prelude::*;
use horn::{AwaitOutcome, Bindings, EngineError, Signal, Task, VarId};

/// `name(row...)` facts: fork one alternative per row, unify on resume.
pub fn facts(name: &str, rows: Vec<Vec<Term>>) -> Predicate {
    let rows = std::rc::Rc::new(rows);
    Predicate::new(name, move |args| {
        Box::new(FactsResolver {
            args: args.to_vec(),
            rows: rows.clone(),
        })
    })
}

struct FactsResolver {
    args: Vec<Term>,
    rows: std::rc::Rc<Vec<Vec<Term>>>,
}

impl Resolver for FactsResolver {
    fn step(&mut self, task: Task) -> Result<Signal, EngineError> {
        let Some(resume) = task.resume else {
            let forks = (0..self.rows.len()).map(|i| Task::resume(i)).collect();
            return Ok(Signal::fork(forks));
        };
        let row = *resume.downcast::<usize>().map_err(|_| EngineError::BadResume)?;

        let mut unifier = Unifier::new(VarIdGen::new());
        let outcome = unifier.unify(
            &Term::seq(self.args.clone()),
            &Term::seq(self.rows[row].clone()),
            &Bindings::new(),
            &Location::unknown(),
        )?;
        Ok(match outcome {
            Some(bindings) => Signal::exit(bindings),
            None => Signal::Fail,
        })
    }
}

/// A predicate that suspends on a host future and binds its argument
/// variable to the settled value.
pub fn awaits(name: &str, var: &VarId, outcome: Result<Term, String>) -> Predicate {
    let var = var.clone();
    Predicate::new(name, move |_args| {
        Box::new(AwaitingResolver {
            var: var.clone(),
            outcome: Some(outcome.clone()),
        })
    })
}

struct AwaitingResolver {
    var: VarId,
    outcome: Option<Result<Term, String>>,
}

impl Resolver for AwaitingResolver {
    fn step(&mut self, task: Task) -> Result<Signal, EngineError> {
        if task.resume.is_none() {
            let outcome = self.outcome.take().ok_or(EngineError::BadResume)?;
            return Ok(Signal::Await {
                future: Box::pin(async move { outcome }),
                resume: Box::new(()),
            });
        }
        match task.awaited {
            Some(AwaitOutcome::Resolved(value)) => {
                let mut unifier = Unifier::new(VarIdGen::new());
                match unifier.unify(
                    &Term::Var(self.var.clone()),
                    &value,
                    &Bindings::new(),
                    &Location::unknown(),
                )? {
                    Some(bindings) => Ok(Signal::exit(bindings)),
                    None => Ok(Signal::Fail),
                }
            }
            Some(AwaitOutcome::Rejected(_)) => Ok(Signal::Fail),
            None => Err(EngineError::BadResume),
        }
    }
}
