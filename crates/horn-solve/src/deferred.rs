//! The deferred-goal drain: turns "constraint became checkable" into
//! "goal becomes runnable".
//!
//! A stateless resolver speaking the same four-port protocol as everything
//! else. Each activation drains its claimed batch of now-runnable goals one
//! `call`/`redo` at a time, and when the batch is empty asks the pluggable
//! [`ConstraintRegistry`] for a fresh claim. When the registry has nothing
//! left, the carried bindings are the solution. Every suspension point is a
//! plain [`DrainState`] value, so backtracking re-enters the drain at the
//! exact goal it paused on, with the bindings it had then.

use std::rc::Rc;

use horn_term::{Bindings, Location, Term};

use crate::signal::{Predicate, Resolver, Signal, SubgoalKey, Task};
use crate::EngineError;

/// A goal parked on a variable that has since become bound.
pub struct RunnableGoal {
    pub resolver: Predicate,
    pub args: Vec<Term>,
    pub location: Location,
}

/// One batch of runnable goals, with the bindings to run them under.
pub struct Claim {
    pub bindings: Bindings,
    pub goals: Vec<RunnableGoal>,
}

/// The pluggable store the drain consults. How goals get parked against
/// variables is the host's business; the drain only claims whatever became
/// runnable since the last claim.
pub trait ConstraintRegistry {
    fn claim_runnable_goals(&self, bindings: &Bindings) -> Option<Claim>;
}

/// Marker resume for the first activation; the real state starts from the
/// caller's bindings delivered with the fork.
struct DrainStart;

/// Program counter + locals between drain steps.
struct DrainState {
    bindings: Bindings,
    goals: Rc<Vec<RunnableGoal>>,
    index: usize,
    op: DrainOp,
}

enum DrainOp {
    /// Claim more work if the batch is exhausted, else call the next goal.
    Check,
    /// Ask the current goal's subgoal for another solution.
    Redo(SubgoalKey),
    /// A subgoal report came back for the current goal.
    Returned,
}

/// The drain resolver. Wrap it via [`deferred_goals_predicate`].
pub struct DeferredGoals {
    registry: Rc<dyn ConstraintRegistry>,
}

impl DeferredGoals {
    pub fn new(registry: Rc<dyn ConstraintRegistry>) -> Self {
        DeferredGoals { registry }
    }
}

/// A predicate whose goals drain the registry's runnable backlog.
pub fn deferred_goals_predicate(registry: Rc<dyn ConstraintRegistry>) -> Predicate {
    Predicate::new("schedule-runnable-goals", move |_args| {
        Box::new(DeferredGoals::new(registry.clone()))
    })
}

impl Resolver for DeferredGoals {
    fn step(&mut self, task: Task) -> Result<Signal, EngineError> {
        let Some(resume) = task.resume else {
            // First activation: fork a single continuation that needs the
            // caller's bindings stamped onto it.
            return Ok(Signal::Fork {
                forks: vec![Task::resume(DrainStart)],
                resume: None,
                forks_need_bindings: true,
            });
        };

        let state = if resume.is::<DrainStart>() {
            DrainState {
                bindings: task.caller_bindings.clone().unwrap_or_default(),
                goals: Rc::new(Vec::new()),
                index: 0,
                op: DrainOp::Check,
            }
        } else {
            *resume
                .downcast::<DrainState>()
                .map_err(|_| EngineError::BadResume)?
        };

        match state.op {
            DrainOp::Check => {
                let DrainState {
                    mut bindings,
                    mut goals,
                    mut index,
                    ..
                } = state;

                if index >= goals.len() {
                    match self.registry.claim_runnable_goals(&bindings) {
                        None => {
                            // Nothing runnable remains: the drain is done.
                            return Ok(Signal::exit(bindings));
                        }
                        Some(claim) => {
                            bindings = claim.bindings;
                            goals = Rc::new(claim.goals);
                            index = 0;
                        }
                    }
                }

                let goal = &goals[index];
                Ok(Signal::Call {
                    resolver: goal.resolver.clone(),
                    args: goal.args.clone(),
                    bindings: Some(bindings.clone()),
                    resume: Box::new(DrainState {
                        bindings,
                        goals: goals.clone(),
                        index,
                        op: DrainOp::Returned,
                    }),
                })
            }

            DrainOp::Redo(key) => Ok(Signal::Redo {
                key,
                resume: Box::new(DrainState {
                    op: DrainOp::Returned,
                    ..state
                }),
            }),

            DrainOp::Returned => match task.subgoal_solution {
                Some(solution) => {
                    // Keep a backtrack point at the *original* bindings if
                    // the subgoal has more solutions, then march on with the
                    // merged ones.
                    let forks = match task.subgoal_redo_key {
                        Some(key) => vec![Task::resume(DrainState {
                            bindings: state.bindings.clone(),
                            goals: state.goals.clone(),
                            index: state.index,
                            op: DrainOp::Redo(key),
                        })],
                        None => Vec::new(),
                    };
                    let merged = state.bindings.merge(&solution);
                    Ok(Signal::Fork {
                        forks,
                        resume: Some(Box::new(DrainState {
                            bindings: merged,
                            goals: state.goals,
                            index: state.index + 1,
                            op: DrainOp::Check,
                        })),
                        forks_need_bindings: false,
                    })
                }
                // The claimed goal failed; this whole branch fails.
                None => Ok(Signal::Fail),
            },
        }
    }
}
