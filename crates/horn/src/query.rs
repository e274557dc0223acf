//! Configurable query handles.
//!
//! A [`Query`] pairs a predicate with a [`SolveConfig`]; `configure` layers
//! new settings on top and returns a derived query, leaving the original
//! untouched. Running a query enumerates [`Solution`]s — bindings already
//! resolved down to the variables the caller asked about.

use std::rc::Rc;

use horn_solve::{
    resolve_solution, AsyncSolutions, Goal, Predicate, SchedulerFactory, Solution, Solutions,
    SolveConfig, SolveTracer,
};
use horn_term::Term;

use crate::EngineError;

#[derive(Clone)]
pub struct Query {
    predicate: Predicate,
    config: SolveConfig,
}

impl Query {
    pub fn new(predicate: Predicate) -> Query {
        Query {
            predicate,
            config: SolveConfig::default(),
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// A derived query with a different scheduler strategy.
    pub fn with_scheduler(&self, scheduler: SchedulerFactory) -> Query {
        Query {
            predicate: self.predicate.clone(),
            config: self.config.clone().with_scheduler(scheduler),
        }
    }

    /// A derived query with a four-port tracer attached.
    pub fn with_tracer(&self, tracer: Rc<dyn SolveTracer>) -> Query {
        Query {
            predicate: self.predicate.clone(),
            config: self.config.clone().with_tracer(tracer),
        }
    }

    /// A derived query with a fully custom configuration.
    pub fn configure(&self, config: SolveConfig) -> Query {
        Query {
            predicate: self.predicate.clone(),
            config,
        }
    }

    /// Lazily enumerate solutions for `args`.
    pub fn run(&self, args: Vec<Term>) -> SolutionIter {
        SolutionIter {
            args: args.clone(),
            inner: Goal::with_config(&self.predicate, args, self.config.clone()).solve(),
        }
    }

    /// The async twin of [`Query::run`].
    pub fn run_async(&self, args: Vec<Term>) -> AsyncSolutionIter {
        AsyncSolutionIter {
            args: args.clone(),
            inner: Goal::with_config(&self.predicate, args, self.config.clone()).solve_async(),
        }
    }
}

/// Lazy iterator of resolved solutions.
pub struct SolutionIter {
    args: Vec<Term>,
    inner: Solutions,
}

impl Iterator for SolutionIter {
    type Item = Result<Solution, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let bindings = match self.inner.next()? {
            Ok(bindings) => bindings,
            Err(error) => return Some(Err(error)),
        };
        Some(resolve_solution(&self.args, &bindings).map_err(EngineError::from))
    }
}

/// Async stream of resolved solutions.
pub struct AsyncSolutionIter {
    args: Vec<Term>,
    inner: AsyncSolutions,
}

impl AsyncSolutionIter {
    pub async fn next(&mut self) -> Option<Result<Solution, EngineError>> {
        let bindings = match self.inner.next().await? {
            Ok(bindings) => bindings,
            Err(error) => return Some(Err(error)),
        };
        Some(resolve_solution(&self.args, &bindings).map_err(EngineError::from))
    }

    pub async fn collect_all(mut self) -> Result<Vec<Solution>, EngineError> {
        let mut out = Vec::new();
        while let Some(item) = self.next().await {
            out.push(item?);
        }
        Ok(out)
    }
}
