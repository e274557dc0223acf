//! Pluggable task scheduling strategies.
//!
//! A scheduler owns the pending tasks of exactly one goal. Swapping the
//! strategy changes the interleaving order of choice points — and therefore
//! the order solutions arrive in — but never the solution set. `pause`
//! exists for cross-scheduler subtrees: a caller parks the tasks aimed at a
//! subtree that runs under its own scheduler until that subtree reports.

use std::collections::VecDeque;

use crate::signal::Task;

pub trait Scheduler {
    /// Queue one task.
    fn add(&mut self, task: Task);

    /// Queue a batch of forks. Strategies order these so that the *first*
    /// fork in source order is tried first.
    fn add_all(&mut self, tasks: Vec<Task>);

    /// The next task to run, or `None` when this goal has nothing left.
    fn next(&mut self) -> Option<Task>;

    /// Atomically remove and return every queued task matching `pred`,
    /// preserving relative order.
    fn pause(&mut self, pred: &mut dyn FnMut(&Task) -> bool) -> Vec<Task>;

    /// Re-enqueue previously paused tasks.
    fn resume(&mut self, tasks: Vec<Task>);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    /// Strategy tag, used to detect cross-scheduler subtree boundaries.
    fn kind(&self) -> &'static str;
}

/// Depth-first: a LIFO stack. Fork batches are pushed in reverse so the
/// first alternative pops first — classic Prolog left-to-right order.
#[derive(Default)]
pub struct Dfs {
    tasks: Vec<Task>,
}

impl Dfs {
    pub fn new() -> Self {
        Dfs::default()
    }
}

impl Scheduler for Dfs {
    fn add(&mut self, task: Task) {
        self.tasks.push(task);
    }

    fn add_all(&mut self, tasks: Vec<Task>) {
        for task in tasks.into_iter().rev() {
            self.tasks.push(task);
        }
    }

    fn next(&mut self) -> Option<Task> {
        self.tasks.pop()
    }

    fn pause(&mut self, pred: &mut dyn FnMut(&Task) -> bool) -> Vec<Task> {
        let mut kept = Vec::with_capacity(self.tasks.len());
        let mut paused = Vec::new();
        for task in self.tasks.drain(..) {
            if pred(&task) {
                paused.push(task);
            } else {
                kept.push(task);
            }
        }
        self.tasks = kept;
        paused
    }

    fn resume(&mut self, tasks: Vec<Task>) {
        self.tasks.extend(tasks);
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }

    fn clear(&mut self) {
        self.tasks.clear();
    }

    fn kind(&self) -> &'static str {
        "dfs"
    }
}

/// Breadth-first: a FIFO queue. Fork batches enqueue in source order.
#[derive(Default)]
pub struct Bfs {
    tasks: VecDeque<Task>,
}

impl Bfs {
    pub fn new() -> Self {
        Bfs::default()
    }
}

impl Scheduler for Bfs {
    fn add(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    fn add_all(&mut self, tasks: Vec<Task>) {
        for task in tasks {
            self.tasks.push_back(task);
        }
    }

    fn next(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    fn pause(&mut self, pred: &mut dyn FnMut(&Task) -> bool) -> Vec<Task> {
        let mut kept = VecDeque::with_capacity(self.tasks.len());
        let mut paused = Vec::new();
        for task in self.tasks.drain(..) {
            if pred(&task) {
                paused.push(task);
            } else {
                kept.push_back(task);
            }
        }
        self.tasks = kept;
        paused
    }

    fn resume(&mut self, tasks: Vec<Task>) {
        self.tasks.extend(tasks);
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }

    fn clear(&mut self) {
        self.tasks.clear();
    }

    fn kind(&self) -> &'static str {
        "bfs"
    }
}
