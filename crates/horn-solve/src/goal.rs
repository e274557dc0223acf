//! The goal engine: a tree of goals driven by the four-port protocol.
//!
//! Each goal owns a resolver instance, a scheduler of pending tasks, and a
//! map of live subgoals. The engine holds the whole tree in an arena and
//! moves a single `current` pointer through it: popping a task, stepping
//! that goal's resolver, and interpreting the returned signal. Control
//! descends on `call`/`redo`, returns on `exit`/exhaustion, and nothing
//! ever runs concurrently — interleaving order is entirely the scheduler's
//! choice.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use horn_term::{ground, Bindings, Term};

use crate::scheduler::{Dfs, Scheduler};
use crate::signal::{
    AwaitOutcome, Predicate, Resolver, Resume, SchedulerFactory, Signal, SubgoalKey, Task,
};
use crate::tracer::{Port, PortEvent, SolveTracer};
use crate::EngineError;

// ---------------------------------------------------------------------------
// Identifiers and configuration
// ---------------------------------------------------------------------------

/// Unique identifier of a goal within one engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GoalId(pub u64);

/// Injected goal-id source. Engines sharing a generator never produce
/// colliding ids; tests pin the start for deterministic traces.
#[derive(Clone)]
pub struct GoalIdGen {
    next: Rc<Cell<u64>>,
}

impl GoalIdGen {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        GoalIdGen {
            next: Rc::new(Cell::new(first)),
        }
    }

    pub fn next_id(&self) -> GoalId {
        let id = self.next.get();
        self.next.set(id + 1);
        GoalId(id)
    }
}

impl Default for GoalIdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-query configuration: the default scheduler strategy, the optional
/// four-port tracer, and the goal-id source.
#[derive(Clone)]
pub struct SolveConfig {
    pub scheduler: SchedulerFactory,
    pub tracer: Option<Rc<dyn SolveTracer>>,
    pub goal_ids: GoalIdGen,
}

impl SolveConfig {
    pub fn with_scheduler(mut self, factory: SchedulerFactory) -> Self {
        self.scheduler = factory;
        self
    }

    pub fn with_tracer(mut self, tracer: Rc<dyn SolveTracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }
}

impl Default for SolveConfig {
    fn default() -> Self {
        SolveConfig {
            scheduler: Rc::new(|| Box::new(Dfs::new())),
            tracer: None,
            goal_ids: GoalIdGen::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Goal nodes
// ---------------------------------------------------------------------------

struct GoalNode {
    key: Option<SubgoalKey>,
    parent: Option<GoalId>,
    name: Rc<str>,
    args: Vec<Term>,
    resolver: Box<dyn Resolver>,
    scheduler: Box<dyn Scheduler>,
    subgoals: BTreeMap<SubgoalKey, GoalId>,
    /// Tasks parked while a cross-scheduler subtree is mid-flight.
    parked: BTreeMap<SubgoalKey, Vec<Task>>,
    caller_bindings: Option<Bindings>,
    /// One-shot continuation the next subgoal report resumes.
    resume_for_subgoal: Option<Resume>,
    complete: bool,
    solutions_found: u64,
    depth: u32,
}

/// What one engine step produced.
pub(crate) enum StepOutcome {
    Continue,
    Solution(Bindings),
    Exhausted,
    Awaiting {
        future: futures::future::LocalBoxFuture<'static, Result<Term, String>>,
        resume: Resume,
        goal: GoalId,
    },
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub(crate) struct Engine {
    nodes: BTreeMap<GoalId, GoalNode>,
    current: GoalId,
    keys: u64,
    config: SolveConfig,
}

impl Engine {
    pub(crate) fn new(predicate: &Predicate, args: Vec<Term>, config: SolveConfig) -> Engine {
        let id = config.goal_ids.next_id();
        let mut engine = Engine {
            nodes: BTreeMap::new(),
            current: id,
            keys: 1,
            config,
        };
        let node = engine.make_node(predicate, args, None, None, None, 0);
        engine.nodes.insert(id, node);
        engine.trace(id, Port::Call, None);
        engine
    }

    fn make_node(
        &mut self,
        predicate: &Predicate,
        args: Vec<Term>,
        parent: Option<GoalId>,
        key: Option<SubgoalKey>,
        caller_bindings: Option<Bindings>,
        depth: u32,
    ) -> GoalNode {
        let factory = predicate
            .scheduler_factory()
            .cloned()
            .unwrap_or_else(|| self.config.scheduler.clone());
        let mut scheduler = factory();
        scheduler.add(Task::initial());
        GoalNode {
            key,
            parent,
            name: Rc::from(predicate.name()),
            resolver: predicate.instantiate(&args),
            args,
            scheduler,
            subgoals: BTreeMap::new(),
            parked: BTreeMap::new(),
            caller_bindings,
            resume_for_subgoal: None,
            complete: false,
            solutions_found: 0,
            depth,
        }
    }

    fn node(&self, id: GoalId) -> &GoalNode {
        self.nodes.get(&id).expect("goal node must be live")
    }

    fn node_mut(&mut self, id: GoalId) -> &mut GoalNode {
        self.nodes.get_mut(&id).expect("goal node must be live")
    }

    fn next_key(&mut self) -> SubgoalKey {
        let key = SubgoalKey(self.keys);
        self.keys += 1;
        key
    }

    fn trace(&self, id: GoalId, port: Port, solution: Option<&Bindings>) {
        let Some(tracer) = &self.config.tracer else {
            return;
        };
        let node = self.node(id);
        let args = node
            .args
            .iter()
            .map(|arg| match solution {
                Some(bindings) => ground(arg, bindings)
                    .map(|t| t.to_string())
                    .unwrap_or_else(|_| arg.to_string()),
                None => arg.to_string(),
            })
            .collect();
        tracer.trace(&PortEvent {
            port,
            goal: id.0,
            predicate: node.name.to_string(),
            args,
            depth: node.depth,
        });
    }

    /// One engine step: pop a task at the current goal, run its resolver,
    /// interpret the signal.
    pub(crate) fn advance(&mut self) -> Result<StepOutcome, EngineError> {
        let current = self.current;

        let signal = if self.node(current).complete {
            // A completed goal's remaining path has failed by definition.
            Signal::Fail
        } else {
            let task = self.node_mut(current).scheduler.next();
            match task {
                None => return self.goal_exhausted(current),
                Some(task) => self.node_mut(current).resolver.step(task)?,
            }
        };

        self.interpret(current, signal)
    }

    /// The current goal has no scheduled tasks left.
    fn goal_exhausted(&mut self, goal: GoalId) -> Result<StepOutcome, EngineError> {
        if self.node(goal).parent.is_some() {
            self.notify_solution(goal, None, None)?;
            Ok(StepOutcome::Continue)
        } else {
            Ok(StepOutcome::Exhausted)
        }
    }

    fn interpret(&mut self, goal: GoalId, signal: Signal) -> Result<StepOutcome, EngineError> {
        match signal {
            Signal::Call {
                resolver,
                args,
                bindings,
                resume,
            } => {
                let key = self.next_key();
                let depth = self.node(goal).depth + 1;
                let id = self.config.goal_ids.next_id();
                let node = self.make_node(&resolver, args, Some(goal), Some(key), bindings, depth);
                self.nodes.insert(id, node);
                self.node_mut(goal).subgoals.insert(key, id);
                self.node_mut(goal).resume_for_subgoal = Some(resume);
                self.trace(id, Port::Call, None);
                self.park_subtree_tasks(goal, key, id);
                self.current = id;
                Ok(StepOutcome::Continue)
            }

            Signal::Redo { key, resume } => {
                self.node_mut(goal).resume_for_subgoal = Some(resume);
                match self.node(goal).subgoals.get(&key).copied() {
                    Some(sub) if !self.node(sub).complete => {
                        self.trace(sub, Port::Redo, None);
                        self.park_subtree_tasks(goal, key, sub);
                        self.current = sub;
                        Ok(StepOutcome::Continue)
                    }
                    // Completed or unknown subgoals cannot be redone; the
                    // caller learns this as an exhausted report, never as a
                    // resurrected task.
                    _ => {
                        self.resume_with_subgoal_solution(goal, key, None)?;
                        Ok(StepOutcome::Continue)
                    }
                }
            }

            Signal::Done { key, resume } => {
                if let Some(sub) = self.node(goal).subgoals.get(&key).copied() {
                    self.complete_goal(sub);
                    self.node_mut(goal).subgoals.remove(&key);
                    self.nodes.remove(&sub);
                }
                self.node_mut(goal).scheduler.add(Task {
                    resume: Some(resume),
                    ..Task::initial()
                });
                Ok(StepOutcome::Continue)
            }

            Signal::Fork {
                mut forks,
                resume,
                forks_need_bindings,
            } => {
                if forks_need_bindings {
                    let caller = self.node(goal).caller_bindings.clone();
                    for fork in &mut forks {
                        fork.caller_bindings = caller.clone();
                    }
                }
                self.node_mut(goal).scheduler.add_all(forks);
                if let Some(resume) = resume {
                    self.node_mut(goal).scheduler.add(Task {
                        resume: Some(resume),
                        ..Task::initial()
                    });
                }
                Ok(StepOutcome::Continue)
            }

            Signal::Exit { solution, resume } => {
                self.node_mut(goal).solutions_found += 1;
                self.trace(goal, Port::Exit, Some(&solution));

                if self.node(goal).parent.is_some() {
                    self.notify_solution(goal, resume, Some(solution))?;
                    Ok(StepOutcome::Continue)
                } else {
                    if let Some(resume) = resume {
                        self.node_mut(goal).scheduler.add(Task {
                            resume: Some(resume),
                            ..Task::initial()
                        });
                    }
                    Ok(StepOutcome::Solution(solution))
                }
            }

            Signal::Fail => {
                self.trace(goal, Port::Fail, None);
                Ok(StepOutcome::Continue)
            }

            Signal::Await { future, resume } => Ok(StepOutcome::Awaiting {
                future,
                resume,
                goal,
            }),
        }
    }

    /// A subgoal reports a solution (or exhaustion, with `solution: None`)
    /// to its parent; control returns to the parent.
    fn notify_solution(
        &mut self,
        subgoal: GoalId,
        resume: Option<Resume>,
        solution: Option<Bindings>,
    ) -> Result<(), EngineError> {
        if let Some(resume) = resume {
            // More solutions may exist down this path.
            self.node_mut(subgoal).scheduler.add(Task {
                resume: Some(resume),
                ..Task::initial()
            });
        } else if solution.is_none() && self.node(subgoal).scheduler.is_empty() {
            self.complete_goal(subgoal);
        }

        let parent = self
            .node(subgoal)
            .parent
            .expect("notify_solution requires a parent");
        let key = self.node(subgoal).key.expect("subgoals carry keys");
        self.resume_with_subgoal_solution(parent, key, solution)?;
        self.current = parent;
        Ok(())
    }

    /// Queue the parent's pending continuation with a subgoal's report. A
    /// completed subgoal is detached here; a live one hands back its key so
    /// the parent may `redo` it later.
    fn resume_with_subgoal_solution(
        &mut self,
        parent: GoalId,
        key: SubgoalKey,
        solution: Option<Bindings>,
    ) -> Result<(), EngineError> {
        let resume = self
            .node_mut(parent)
            .resume_for_subgoal
            .take()
            .ok_or(EngineError::MissingContinuation)?;

        let redo_key = match self.node(parent).subgoals.get(&key).copied() {
            Some(sub) if self.node(sub).complete => {
                self.node_mut(parent).subgoals.remove(&key);
                self.nodes.remove(&sub);
                None
            }
            Some(_) => Some(key),
            None => None,
        };

        if let Some(parked) = self.node_mut(parent).parked.remove(&key) {
            self.node_mut(parent).scheduler.resume(parked);
        }
        self.node_mut(parent).scheduler.add(Task {
            resume: Some(resume),
            subgoal_solution: solution,
            subgoal_redo_key: redo_key,
            ..Task::initial()
        });
        Ok(())
    }

    /// Entering a subtree that runs under a different scheduler strategy:
    /// park the caller's queued activity aimed at that subtree until it
    /// reports.
    fn park_subtree_tasks(&mut self, parent: GoalId, key: SubgoalKey, subgoal: GoalId) {
        if self.node(parent).scheduler.kind() == self.node(subgoal).scheduler.kind() {
            return;
        }
        let parked = self
            .node_mut(parent)
            .scheduler
            .pause(&mut |task| task.subgoal_redo_key == Some(key));
        if !parked.is_empty() {
            self.node_mut(parent)
                .parked
                .entry(key)
                .or_default()
                .extend(parked);
        }
    }

    /// Synchronously stop a goal and every descendant: close resolvers,
    /// discard pending tasks, drop the subtree.
    fn complete_goal(&mut self, id: GoalId) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        if node.complete {
            return;
        }
        node.complete = true;
        node.resolver.close();
        node.scheduler.clear();
        node.parked.clear();

        let children: Vec<GoalId> = node.subgoals.values().copied().collect();
        node.subgoals.clear();
        for child in children {
            self.complete_goal(child);
            self.nodes.remove(&child);
        }
    }

    pub(crate) fn deliver_await(&mut self, goal: GoalId, resume: Resume, outcome: AwaitOutcome) {
        if let Some(node) = self.nodes.get_mut(&goal) {
            node.scheduler.add(Task {
                resume: Some(resume),
                awaited: Some(outcome),
                ..Task::initial()
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Public query surface
// ---------------------------------------------------------------------------

/// One top-level query instance: a root goal plus the machinery to drive it.
pub struct Goal {
    engine: Engine,
}

impl Goal {
    pub fn new(predicate: &Predicate, args: Vec<Term>) -> Goal {
        Goal::with_config(predicate, args, SolveConfig::default())
    }

    pub fn with_config(predicate: &Predicate, args: Vec<Term>, config: SolveConfig) -> Goal {
        Goal {
            engine: Engine::new(predicate, args, config),
        }
    }

    /// Lazily enumerate solutions. Each item is a bindings snapshot; an
    /// error item (malformed pattern, protocol misuse) ends the query.
    pub fn solve(self) -> Solutions {
        Solutions {
            engine: self.engine,
            finished: false,
        }
    }

    /// The async twin of [`Goal::solve`], with `await` signal support.
    pub fn solve_async(self) -> AsyncSolutions {
        AsyncSolutions {
            engine: self.engine,
            finished: false,
        }
    }
}

/// Lazy iterator over a query's solutions.
pub struct Solutions {
    engine: Engine,
    finished: bool,
}

impl Iterator for Solutions {
    type Item = Result<Bindings, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.engine.advance() {
                Ok(StepOutcome::Continue) => continue,
                Ok(StepOutcome::Solution(bindings)) => return Some(Ok(bindings)),
                Ok(StepOutcome::Exhausted) => {
                    self.finished = true;
                    return None;
                }
                Ok(StepOutcome::Awaiting { .. }) => {
                    self.finished = true;
                    return Some(Err(EngineError::AwaitDuringSyncSolve));
                }
                Err(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

/// Async solution stream: like [`Solutions`] but `await` signals suspend on
/// the host event loop and resume the resolver with the settled outcome.
pub struct AsyncSolutions {
    engine: Engine,
    finished: bool,
}

impl AsyncSolutions {
    pub async fn next(&mut self) -> Option<Result<Bindings, EngineError>> {
        if self.finished {
            return None;
        }
        loop {
            match self.engine.advance() {
                Ok(StepOutcome::Continue) => continue,
                Ok(StepOutcome::Solution(bindings)) => return Some(Ok(bindings)),
                Ok(StepOutcome::Exhausted) => {
                    self.finished = true;
                    return None;
                }
                Ok(StepOutcome::Awaiting {
                    future,
                    resume,
                    goal,
                }) => {
                    let outcome = match future.await {
                        Ok(value) => AwaitOutcome::Resolved(value),
                        Err(error) => AwaitOutcome::Rejected(error),
                    };
                    self.engine.deliver_await(goal, resume, outcome);
                }
                Err(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
            }
        }
    }

    /// Drain every remaining solution.
    pub async fn collect_all(mut self) -> Result<Vec<Bindings>, EngineError> {
        let mut out = Vec::new();
        while let Some(item) = self.next().await {
            out.push(item?);
        }
        Ok(out)
    }
}
