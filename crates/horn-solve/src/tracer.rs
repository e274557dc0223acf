//! Four-port solve tracing.
//!
//! Opt-in via `SolveConfig::with_tracer` — zero overhead when absent. Events
//! serialize cleanly for hosts; `render` produces the classic indented
//! Prolog-style port listing for humans.

use std::cell::RefCell;
use std::fmt::Write as _;

use serde::Serialize;

/// The four ports of the resolution protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Port {
    Call,
    Redo,
    Exit,
    Fail,
}

impl Port {
    fn label(self) -> &'static str {
        match self {
            Port::Call => "CALL",
            Port::Redo => "REDO",
            Port::Exit => "EXIT",
            Port::Fail => "FAIL",
        }
    }
}

/// One port crossing of one goal.
#[derive(Debug, Clone, Serialize)]
pub struct PortEvent {
    pub port: Port,
    pub goal: u64,
    pub predicate: String,
    /// Rendered argument terms; exit events show them resolved against the
    /// reported solution.
    pub args: Vec<String>,
    pub depth: u32,
}

pub trait SolveTracer {
    fn trace(&self, event: &PortEvent);
}

/// Buffers every event for later inspection or rendering.
#[derive(Default)]
pub struct CollectingTracer {
    events: RefCell<Vec<PortEvent>>,
}

impl CollectingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PortEvent> {
        self.events.borrow().clone()
    }

    pub fn rendered(&self) -> String {
        render(&self.events.borrow())
    }
}

impl SolveTracer for CollectingTracer {
    fn trace(&self, event: &PortEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Human-readable port listing, indented by goal depth:
///
/// ```text
/// CALL: (1) ancestor(tom, Z)
///   CALL: (2) parent(tom, Z)
///   EXIT: (2) parent(tom, bob)
/// EXIT: (1) ancestor(tom, bob)
/// ```
pub fn render(events: &[PortEvent]) -> String {
    let mut out = String::new();
    for event in events {
        let indent = "  ".repeat(event.depth as usize);
        let _ = writeln!(
            out,
            "{indent}{}: ({}) {}({})",
            event.port.label(),
            event.goal,
            event.predicate,
            event.args.join(", ")
        );
    }
    out
}
