//! The Horn goal engine.
//!
//! Compiled predicate bodies don't recurse natively — they yield structured
//! signals (`call`, `redo`, `done`, `fork`, `exit`, `fail`, `await`) that
//! this crate interprets against an explicit goal tree. Which pending signal
//! resumes next is the scheduler's decision, which is how depth-first and
//! breadth-first search fall out of one engine. Solving is available
//! synchronously ([`Goal::solve`]) and asynchronously ([`Goal::solve_async`],
//! the only place an `await` signal is legal).

pub mod deferred;
pub mod goal;
pub mod scheduler;
pub mod signal;
pub mod solution;
pub mod tracer;


pub use deferred::{deferred_goals_predicate, Claim, ConstraintRegistry, DeferredGoals, RunnableGoal};
pub use goal::{AsyncSolutions, Goal, GoalId, GoalIdGen, Solutions, SolveConfig};
pub use scheduler::{Bfs, Dfs, Scheduler};
pub use signal::{
    AwaitOutcome, Predicate, Resolver, Resume, SchedulerFactory, Signal, SubgoalKey, Task,
};
pub use solution::{resolve_solution, Solution};
pub use tracer::{render, CollectingTracer, Port, PortEvent, SolveTracer};

use horn_term::PatternError;

/// Fatal solve-call errors.
///
/// These abort the enclosing query; unification failure never appears here —
/// it is an ordinary `fail` absorbed by backtracking.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An `await` signal reached a synchronous solve loop.
    #[error("`await` signal during synchronous solve; drive this query with solve_async")]
    AwaitDuringSyncSolve,
    /// A subgoal reported while its parent had no pending continuation.
    #[error("subgoal reported a result but no continuation is pending")]
    MissingContinuation,
    /// A resolver was resumed with a payload it does not recognize.
    #[error("resolver resumed with an unexpected payload")]
    BadResume,
    /// A malformed pattern surfaced mid-search.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// A `SchedulerFactory` for depth-first search (the default strategy).
pub fn dfs() -> SchedulerFactory {
    std::rc::Rc::new(|| Box::new(Dfs::new()))
}

/// A `SchedulerFactory` for breadth-first search.
pub fn bfs() -> SchedulerFactory {
    std::rc::Rc::new(|| Box::new(Bfs::new()))
}
