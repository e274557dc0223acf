//! Term and binding model for the Horn logic engine.
//!
//! This crate defines the values manipulated by unification: logic variables,
//! primitive and composite terms, structural patterns (array/object spreads
//! and default-carrying value slots), the persistent `Bindings` map, and the
//! provenance `Trace` rope attached to every binding.
//!
//! Unification itself lives in `horn-unify`; this crate only provides the
//! primitives that need no dispatch — `resolve`, `ground`, `occurs`,
//! `symbols` — plus the `TermUnifier` capability hook through which opaque
//! user terms participate in unification.

pub mod bindings;
pub mod ground;
pub mod repr;
pub mod term;
pub mod trace;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub use bindings::{Binding, Bindings};
pub use ground::{ground, is_ground, occurs, symbols};
pub use term::{
    ArrayPart, ArrayPattern, ObjectPart, ObjectPattern, OpaqueTerm, Term, TermUnifier, Unified,
    Value,
};
pub use trace::{ConstraintCell, NativeCheck, Trace, TraceEvent};

// ---------------------------------------------------------------------------
// Variable identifiers
// ---------------------------------------------------------------------------

/// Global counter backing [`VarIdGen::new`].
///
/// Each generator claims a block of ids up front so that no two generators
/// ever produce the same `VarId`, even when several engines run in the same
/// process. Id `0` is reserved for the anonymous variable.
static GLOBAL_VAR: AtomicU32 = AtomicU32::new(VAR_BLOCK_SIZE);

const VAR_BLOCK_SIZE: u32 = 1024;

/// Unique identifier for a logic variable.
///
/// Equality, ordering, and hashing use the numeric id only — two variables
/// with the same display name but different ids are different variables.
/// The name rides along purely for rendering and error messages.
#[derive(Clone)]
pub struct VarId {
    id: u32,
    name: Option<Arc<str>>,
}

impl VarId {
    /// The anonymous variable `_`: unifies with anything, binds nothing.
    pub fn anon() -> Self {
        VarId { id: 0, name: None }
    }

    pub fn is_anon(&self) -> bool {
        self.id == 0
    }

    pub fn index(&self) -> u32 {
        self.id
    }

    /// The display name, or `None` for generated/anonymous variables.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The display name, falling back to `_<id>` for unnamed variables.
    pub fn display_name(&self) -> String {
        if self.is_anon() {
            return "_".to_string();
        }
        match &self.name {
            Some(name) => name.to_string(),
            None => format!("_{}", self.id),
        }
    }
}

impl PartialEq for VarId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for VarId {}

impl PartialOrd for VarId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VarId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for VarId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarId({}, {:?})", self.id, self.display_name())
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Allocator for fresh variable ids.
///
/// Production code uses [`VarIdGen::new`], which carves blocks out of a
/// process-wide counter. Tests that need deterministic ids starting from a
/// known offset use [`VarIdGen::starting_at`].
#[derive(Clone)]
pub struct VarIdGen {
    next: Rc<Cell<u32>>,
}

impl VarIdGen {
    pub fn new() -> Self {
        let base = GLOBAL_VAR.fetch_add(VAR_BLOCK_SIZE, Ordering::Relaxed);
        Self::starting_at(base)
    }

    /// Create a generator with an explicit starting id, for deterministic
    /// tests. Id 0 is reserved for `_` and is skipped.
    pub fn starting_at(offset: u32) -> Self {
        let first = offset.max(1);
        VarIdGen {
            next: Rc::new(Cell::new(first)),
        }
    }

    /// Allocate a fresh variable carrying `name` for display.
    pub fn fresh(&self, name: &str) -> VarId {
        let id = self.next.get();
        self.next.set(id + 1);
        VarId {
            id,
            name: Some(Arc::from(name)),
        }
    }

    /// Allocate a fresh unnamed variable (rendered as `_<id>`).
    pub fn fresh_unnamed(&self) -> VarId {
        let id = self.next.get();
        self.next.set(id + 1);
        VarId { id, name: None }
    }
}

impl Default for VarIdGen {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Source locations
// ---------------------------------------------------------------------------

/// Where a binding or constraint came from in the host program.
///
/// Locations carry no semantic weight; they flow into `Bind` trace events and
/// error messages so a caller can point back at the goal that produced a
/// binding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub source: Option<Arc<str>>,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn unknown() -> Self {
        Location::default()
    }

    pub fn new(source: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Location {
            source: Some(source.into()),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}:{}:{}", source, self.line, self.column),
            None => write!(f, "<unknown>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pattern errors
// ---------------------------------------------------------------------------

/// A malformed-pattern error.
///
/// Unlike unification failure (a `None` return that backtracking absorbs),
/// these indicate a logic-program type error and abort the enclosing solve
/// call.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("cannot ground ArrayPattern: spread variable '{name}' was bound to a non-array value")]
    ArraySpreadNotSeq { name: String },
    #[error("cannot ground ObjectPattern: spread variable '{name}' was bound to a non-object value")]
    ObjectSpreadNotMap { name: String },
    #[error("cannot ground ObjectPattern: a value slot is not allowed as a pattern part")]
    SlotAsPatternPart,
    #[error("cannot ground opaque term '{name}': {detail}")]
    Opaque { name: String, detail: String },
}
