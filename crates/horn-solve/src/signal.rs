//! The four-port resolver protocol: tasks in, signals out.
//!
//! A resolver is an explicit state machine. The engine drives it with
//! `step(task)` calls; every call returns exactly one signal. Suspension
//! points are plain data — a `Resume` payload is whatever program counter
//! and locals the resolver needs to pick up where it left off — so choice
//! points can be queued, reordered, and discarded by a scheduler without
//! any native coroutine support.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use horn_term::{Bindings, Term};

use crate::scheduler::Scheduler;
use crate::EngineError;

/// Identifies a live subgoal within its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubgoalKey(pub u64);

/// Opaque resolver state carried by a task: program counter plus locals.
pub type Resume = Box<dyn Any>;

/// The settled outcome of an awaited future, delivered back to the resolver
/// that suspended on it.
#[derive(Debug, Clone)]
pub enum AwaitOutcome {
    Resolved(Term),
    Rejected(String),
}

/// One unit of schedulable work for a resolver.
///
/// The first task a resolver ever sees is empty; everything after carries
/// the resume payload it handed out, plus whatever the engine owes it — a
/// subgoal's solution, the key to redo that subgoal, the caller's bindings,
/// or an await outcome.
#[derive(Default)]
pub struct Task {
    pub resume: Option<Resume>,
    pub subgoal_solution: Option<Bindings>,
    pub subgoal_redo_key: Option<SubgoalKey>,
    pub caller_bindings: Option<Bindings>,
    pub awaited: Option<AwaitOutcome>,
}

impl Task {
    /// The empty first task of a fresh goal.
    pub fn initial() -> Task {
        Task::default()
    }

    pub fn resume(payload: impl Any) -> Task {
        Task {
            resume: Some(Box::new(payload)),
            ..Task::default()
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("resume", &self.resume.is_some())
            .field("subgoal_solution", &self.subgoal_solution.is_some())
            .field("subgoal_redo_key", &self.subgoal_redo_key)
            .field("caller_bindings", &self.caller_bindings.is_some())
            .field("awaited", &self.awaited)
            .finish()
    }
}

/// What a resolver tells the engine after one step.
pub enum Signal {
    /// Invoke a fresh subgoal; `resume` fires when it reports.
    Call {
        resolver: Predicate,
        args: Vec<Term>,
        /// Bindings the subgoal's fork tasks may request via
        /// `forks_need_bindings`.
        bindings: Option<Bindings>,
        resume: Resume,
    },
    /// Ask a still-alive subgoal for its next solution.
    Redo { key: SubgoalKey, resume: Resume },
    /// Discard a subgoal and everything it still had queued.
    Done { key: SubgoalKey, resume: Resume },
    /// Register alternative continuations, optionally continuing
    /// immediately with `resume`.
    Fork {
        forks: Vec<Task>,
        resume: Option<Resume>,
        /// Stamp each fork with the goal's caller bindings before queueing.
        forks_need_bindings: bool,
    },
    /// Report one solution. A present `resume` means "there may be more".
    Exit {
        solution: Bindings,
        resume: Option<Resume>,
    },
    /// This branch is exhausted.
    Fail,
    /// Suspend until the future settles (async solving only).
    Await {
        future: LocalBoxFuture<'static, Result<Term, String>>,
        resume: Resume,
    },
}

impl Signal {
    pub fn fork(forks: Vec<Task>) -> Signal {
        Signal::Fork {
            forks,
            resume: None,
            forks_need_bindings: false,
        }
    }

    pub fn exit(solution: Bindings) -> Signal {
        Signal::Exit {
            solution,
            resume: None,
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Call { resolver, args, .. } => f
                .debug_struct("Call")
                .field("resolver", &resolver.name())
                .field("args", args)
                .finish_non_exhaustive(),
            Signal::Redo { key, .. } => f.debug_struct("Redo").field("key", key).finish(),
            Signal::Done { key, .. } => f.debug_struct("Done").field("key", key).finish(),
            Signal::Fork { forks, resume, .. } => f
                .debug_struct("Fork")
                .field("forks", &forks.len())
                .field("resume", &resume.is_some())
                .finish(),
            Signal::Exit { resume, .. } => f
                .debug_struct("Exit")
                .field("resume", &resume.is_some())
                .finish_non_exhaustive(),
            Signal::Fail => write!(f, "Fail"),
            Signal::Await { .. } => write!(f, "Await"),
        }
    }
}

/// A resolver instance: one in-progress activation of a predicate.
pub trait Resolver {
    /// Advance one step. Every call must return exactly one signal; a
    /// resolver with nothing left to offer returns `Fail`.
    fn step(&mut self, task: Task) -> Result<Signal, EngineError>;

    /// The goal was completed or cancelled; release whatever the resolver
    /// still holds.
    fn close(&mut self) {}
}

/// Factory for scheduler instances, so every goal gets its own queue.
pub type SchedulerFactory = Rc<dyn Fn() -> Box<dyn Scheduler>>;

/// A compiled predicate: instantiating it with argument terms yields a
/// resolver. A predicate may declare its own scheduler strategy; its goals
/// then run under that strategy instead of the caller's.
#[derive(Clone)]
pub struct Predicate {
    name: Rc<str>,
    make: Rc<dyn Fn(&[Term]) -> Box<dyn Resolver>>,
    scheduler: Option<SchedulerFactory>,
}

impl Predicate {
    pub fn new(
        name: impl AsRef<str>,
        make: impl Fn(&[Term]) -> Box<dyn Resolver> + 'static,
    ) -> Predicate {
        Predicate {
            name: Rc::from(name.as_ref()),
            make: Rc::new(make),
            scheduler: None,
        }
    }

    /// Declare a scheduler strategy for this predicate's goals.
    pub fn with_scheduler(mut self, factory: SchedulerFactory) -> Predicate {
        self.scheduler = Some(factory);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn instantiate(&self, args: &[Term]) -> Box<dyn Resolver> {
        (self.make)(args)
    }

    pub(crate) fn scheduler_factory(&self) -> Option<&SchedulerFactory> {
        self.scheduler.as_ref()
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.name)
    }
}
