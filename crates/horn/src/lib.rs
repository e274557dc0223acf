//! Horn: an embeddable logic engine.
//!
//! Horn embeds Prolog-style search in a Rust host. Logic terms carry
//! structural patterns — array/object spreads and default slots — through a
//! symmetric unifier with provenance traces; compiled predicates speak the
//! four-port `call`/`redo`/`exit`/`fail` protocol to a scheduler-driven goal
//! engine; constraints too early to check sleep on their variables and wake
//! when a binding arrives.
//!
//! The pieces live in three crates, re-exported here:
//! - `horn-term` — terms, variables, traces, persistent bindings;
//! - `horn-unify` — the unifier, patterns, slots, deferred constraints;
//! - `horn-solve` — schedulers, the goal engine, sync/async solving.
//!
//! # Example
//!
//! ```
//! use horn::prelude::*;
//!
//! // p(1). p(2).
//! let p = Predicate::new("p", |args| {
//!     struct Rows(Vec<i64>, Vec<Term>);
//!     impl Resolver for Rows {
//!         fn step(&mut self, task: Task) -> Result<Signal, EngineError> {
//!             let Some(resume) = task.resume else {
//!                 let forks = (0..self.0.len()).map(|i| Task::resume(i)).collect();
//!                 return Ok(Signal::fork(forks));
//!             };
//!             let i = *resume.downcast::<usize>().map_err(|_| EngineError::BadResume)?;
//!             let mut u = Unifier::new(VarIdGen::new());
//!             match u.unify(
//!                 &self.1[0],
//!                 &Term::Int(self.0[i]),
//!                 &Bindings::new(),
//!                 &Location::unknown(),
//!             )? {
//!                 Some(b) => Ok(Signal::exit(b)),
//!                 None => Ok(Signal::Fail),
//!             }
//!         }
//!     }
//!     Box::new(Rows(vec![1, 2], args.to_vec()))
//! });
//!
//! let vars = VarPool::new();
//! let x = vars.var("X");
//! let solutions: Vec<_> = Query::new(p)
//!     .run(vec![Term::Var(x.clone())])
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(solutions.len(), 2);
//! assert_eq!(solutions[0].get(&x), Some(&Term::Int(1)));
//! ```

pub mod findall;
pub mod query;
pub mod vars;

pub use findall::{findall, findall_with_template};
pub use query::{AsyncSolutionIter, Query, SolutionIter};
pub use vars::VarPool;

pub use horn_solve::{
    bfs, deferred_goals_predicate, dfs, render, resolve_solution, AsyncSolutions, AwaitOutcome,
    Bfs, Claim, CollectingTracer, ConstraintRegistry, DeferredGoals, Dfs, EngineError, Goal,
    GoalId, GoalIdGen, Port, PortEvent, Predicate, Resolver, Resume, RunnableGoal,
    SchedulerFactory, Scheduler, Signal, Solution, Solutions, SolveConfig, SolveTracer,
    SubgoalKey, Task,
};
pub use horn_term::{
    ground, is_ground, occurs, symbols, ArrayPart, ArrayPattern, Binding, Bindings,
    ConstraintCell, Location, NativeCheck, ObjectPart, ObjectPattern, OpaqueTerm, PatternError,
    Term, TermUnifier, Trace, TraceEvent, Unified, Value, VarId, VarIdGen,
};
pub use horn_unify::{unify, PendingConstraint, UnifyAction, UnifyStep, Unifier};

pub mod prelude {
    pub use crate::findall::{findall, findall_with_template};
    pub use crate::query::Query;
    pub use crate::vars::VarPool;

    pub use horn_solve::{
        bfs, dfs, EngineError, Goal, Predicate, Resolver, Signal, Solution, SolveConfig, Task,
    };
    pub use horn_term::{
        ArrayPart, ArrayPattern, Bindings, Location, ObjectPart, ObjectPattern, Term, Value,
        VarId, VarIdGen,
    };
    pub use horn_unify::Unifier;
}
