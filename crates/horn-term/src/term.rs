//! The `Term` tagged union and its structured-pattern variants.
//!
//! Terms are immutable once constructed; composite variants share their
//! children behind `Rc`, so cloning a term is cheap and snapshots taken by
//! the backtracking scheduler never observe mutation.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::bindings::{Binding, Bindings};
use crate::{Location, PatternError, VarId};

/// Result of a unification step: `Ok(None)` is failure (backtrack),
/// `Ok(Some(..))` is success with the extended bindings, `Err` is a
/// malformed-pattern error that aborts the enclosing solve.
pub type Unified = Result<Option<Bindings>, PatternError>;

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// Any value manipulable by unification.
#[derive(Clone)]
pub enum Term {
    /// An (possibly unbound) logic variable.
    Var(VarId),
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Rc<str>),
    Null,
    /// An absent value — what a missing map key or array slot unifies
    /// against. Distinct from `Null`, which is a present value.
    Missing,
    /// An ordered sequence of terms.
    Seq(Rc<Vec<Term>>),
    /// An ordered mapping with unique string keys.
    Map(Rc<BTreeMap<String, Term>>),
    /// `[fixed..., ...spread, fixed...]`
    Array(Rc<ArrayPattern>),
    /// `{fixed: props, ...spread}`
    Object(Rc<ObjectPattern>),
    /// A slot that carries a default unless a concrete value arrives.
    Slot(Rc<Value>),
    /// A user-supplied term with its own unification behavior.
    Opaque(Rc<dyn OpaqueTerm>),
}

impl Term {
    pub fn var(id: VarId) -> Term {
        Term::Var(id)
    }

    pub fn anon() -> Term {
        Term::Var(VarId::anon())
    }

    pub fn str(s: impl AsRef<str>) -> Term {
        Term::Str(Rc::from(s.as_ref()))
    }

    pub fn seq(items: impl IntoIterator<Item = Term>) -> Term {
        Term::Seq(Rc::new(items.into_iter().collect()))
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Term)>) -> Term {
        Term::Map(Rc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn empty_map() -> Term {
        Term::Map(Rc::new(BTreeMap::new()))
    }

    pub fn array_pattern(parts: impl IntoIterator<Item = ArrayPart>) -> Term {
        Term::Array(Rc::new(ArrayPattern::new(parts)))
    }

    pub fn object_pattern(parts: impl IntoIterator<Item = ObjectPart>) -> Term {
        Term::Object(Rc::new(ObjectPattern::new(parts)))
    }

    pub fn slot(value: Value) -> Term {
        Term::Slot(Rc::new(value))
    }

    pub fn opaque(value: impl OpaqueTerm + 'static) -> Term {
        Term::Opaque(Rc::new(value))
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn is_anon(&self) -> bool {
        matches!(self, Term::Var(v) if v.is_anon())
    }

    pub fn as_var(&self) -> Option<&VarId> {
        match self {
            Term::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Shallow identity: the `===` of the dispatch table. Primitives compare
    /// by value, variables by id, composites by pointer — two structurally
    /// equal sequences are *not* identical, and unification recurses into
    /// them so that embedded patterns still run.
    pub fn same_identity(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Var(a), Term::Var(b)) => a == b,
            (Term::Int(a), Term::Int(b)) => a == b,
            (Term::Float(a), Term::Float(b)) => a == b,
            (Term::Bool(a), Term::Bool(b)) => a == b,
            (Term::Str(a), Term::Str(b)) => a == b,
            (Term::Null, Term::Null) => true,
            (Term::Missing, Term::Missing) => true,
            (Term::Seq(a), Term::Seq(b)) => Rc::ptr_eq(a, b),
            (Term::Map(a), Term::Map(b)) => Rc::ptr_eq(a, b),
            (Term::Array(a), Term::Array(b)) => Rc::ptr_eq(a, b),
            (Term::Object(a), Term::Object(b)) => Rc::ptr_eq(a, b),
            (Term::Slot(a), Term::Slot(b)) => Rc::ptr_eq(a, b),
            (Term::Opaque(a), Term::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Structural equality, used by tests and solution comparison. Opaque terms
/// compare by pointer since their contents are not inspectable.
impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Term::Var(a), Term::Var(b)) => a == b,
            (Term::Int(a), Term::Int(b)) => a == b,
            (Term::Float(a), Term::Float(b)) => a == b,
            (Term::Bool(a), Term::Bool(b)) => a == b,
            (Term::Str(a), Term::Str(b)) => a == b,
            (Term::Null, Term::Null) => true,
            (Term::Missing, Term::Missing) => true,
            (Term::Seq(a), Term::Seq(b)) => a == b,
            (Term::Map(a), Term::Map(b)) => a == b,
            (Term::Array(a), Term::Array(b)) => a == b,
            (Term::Object(a), Term::Object(b)) => a == b,
            (Term::Slot(a), Term::Slot(b)) => a == b,
            (Term::Opaque(a), Term::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug reuses the compact repr; the long derive output buries the
        // structure under Rc noise.
        write!(f, "{self}")
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Int(value)
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Term::Float(value)
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::Bool(value)
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::str(value)
    }
}

impl From<VarId> for Term {
    fn from(value: VarId) -> Self {
        Term::Var(value)
    }
}

// ---------------------------------------------------------------------------
// Value slots
// ---------------------------------------------------------------------------

/// A deferred/default slot: "a variable that should carry `default` unless a
/// concrete value arrives."
///
/// Optional slots let a missing counterpart succeed (binding the slot to the
/// default); required slots assert the default against whatever arrives.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    pub slot: Term,
    pub default: Term,
    pub optional: bool,
}

impl Value {
    pub fn optional(slot: Term, default: Term) -> Self {
        Value {
            slot,
            default,
            optional: true,
        }
    }

    pub fn required(slot: Term, default: Term) -> Self {
        Value {
            slot,
            default,
            optional: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Array patterns
// ---------------------------------------------------------------------------

/// One part of an [`ArrayPattern`].
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayPart {
    /// A fixed run of elements, which may end in optional `Slot` terms.
    Items(Vec<Term>),
    /// `...spread` — a variable standing for the remaining elements.
    Spread(Term),
}

/// `[a, b, ...Rest, z]` — a sequence with fixed runs and spread variables.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ArrayPattern {
    pub parts: Vec<ArrayPart>,
}

impl ArrayPattern {
    pub fn new(parts: impl IntoIterator<Item = ArrayPart>) -> Self {
        ArrayPattern {
            parts: parts.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Object patterns
// ---------------------------------------------------------------------------

/// One part of an [`ObjectPattern`].
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectPart {
    /// A run of fixed properties.
    Props(BTreeMap<String, Term>),
    /// `...spread` — a variable standing for the remaining keys.
    Spread(Term),
}

impl ObjectPart {
    pub fn props<K: Into<String>>(entries: impl IntoIterator<Item = (K, Term)>) -> Self {
        ObjectPart::Props(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// `{a: 1, ...Rest}` — fixed props and spread variables, in any order.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ObjectPattern {
    pub parts: Vec<ObjectPart>,
}

impl ObjectPattern {
    pub fn new(parts: impl IntoIterator<Item = ObjectPart>) -> Self {
        ObjectPattern {
            parts: parts.into_iter().collect(),
        }
    }

    /// Collapse a parts list to the simplest equivalent term: a single
    /// spread with no props is just that variable; parts without slots or
    /// spreads are a plain map.
    pub fn from_parts(parts: Vec<ObjectPart>) -> Term {
        if parts.len() == 1 {
            match &parts[0] {
                ObjectPart::Spread(term) => return term.clone(),
                ObjectPart::Props(props) => {
                    let has_slot = props.values().any(|v| matches!(v, Term::Slot(_)));
                    if !has_slot {
                        return Term::Map(Rc::new(props.clone()));
                    }
                }
            }
        }
        Term::Object(Rc::new(ObjectPattern::new(parts)))
    }
}

// ---------------------------------------------------------------------------
// Capability hooks
// ---------------------------------------------------------------------------

/// The unifier surface handed to [`OpaqueTerm`] hooks.
///
/// `horn-unify` implements this for its `Unifier`; opaque terms call back
/// through it so this crate never depends on the dispatch logic.
pub trait TermUnifier {
    fn unify_terms(
        &mut self,
        left: &Term,
        right: &Term,
        bindings: &Bindings,
        location: &Location,
    ) -> Unified;

    fn unify_resolved(
        &mut self,
        left: &Binding,
        right: &Binding,
        bindings: &Bindings,
        location: &Location,
    ) -> Unified;

    /// Bind the variable held by `target` to `value`'s term. The caller is
    /// responsible for having resolved both sides first.
    fn bind_resolved(
        &mut self,
        target: &Binding,
        value: &Binding,
        bindings: &Bindings,
        location: &Location,
    ) -> Option<Bindings>;

    /// A fresh variable, for pivots and other internally introduced links.
    fn fresh_var(&mut self, name: &str) -> VarId;
}

/// A user-extensible term that manages its own unification.
///
/// The dispatch table consults this hook before any built-in structural
/// rule, so an opaque term is fully responsible for its own occurs check
/// and binding. The anonymous variable must be special-cased before binding.
pub trait OpaqueTerm {
    /// Short type name, for repr and error messages.
    fn type_name(&self) -> &str;

    /// Unify this term against the other side's resolved binding.
    /// `self_binding` is the resolved binding this term came from, so the
    /// hook can bind a variable to itself.
    fn unify_opaque(
        &self,
        unifier: &mut dyn TermUnifier,
        other: &Binding,
        bindings: &Bindings,
        location: &Location,
        self_binding: &Binding,
    ) -> Unified;

    /// Fully resolve this term. The default keeps the term as-is, which is
    /// correct for opaque values with no nested variables.
    fn ground_opaque(&self, self_term: &Term, bindings: &Bindings) -> Result<Term, PatternError> {
        let _ = bindings;
        Ok(self_term.clone())
    }

    /// Visit every child term, so `symbols`/`occurs` can see nested
    /// variables. The default has none.
    fn visit_children(&self, visit: &mut dyn FnMut(&Term)) {
        let _ = visit;
    }

    /// Compact rendering, used by `Display` for `Term::Opaque`.
    fn repr(&self) -> String {
        format!("<{}>", self.type_name())
    }
}
