//! Structured unification-step records for observability.
//!
//! Recording is opt-in via `Unifier::enable_tracing()` — zero overhead when
//! disabled. Steps serialize cleanly so hosts can expose the unifier's
//! reasoning process.

use serde::Serialize;

/// A single step in a unification trace.
#[derive(Debug, Clone, Serialize)]
pub struct UnifyStep {
    pub step: usize,
    pub action: UnifyAction,
    pub left: String,
    pub right: String,
    pub detail: String,
}

/// What action was taken during a unification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnifyAction {
    /// Sides are already identical — no-op.
    Identity,
    /// Structural recursion: decompose sequences or maps elementwise.
    Decompose,
    /// Variable bound to a value.
    Bind,
    /// Entered pattern unification (array/object/slot/opaque hook).
    Pattern,
    /// A spread variable committed to a split point.
    SpreadSplit,
    /// Fresh pivot variable introduced for open-vs-open object patterns.
    Pivot,
    /// Occurs check fired — cyclic binding rejected.
    OccursCheck,
    /// A native constraint was parked on unbound variables.
    Defer,
    /// This unification step failed.
    Fail,
}
