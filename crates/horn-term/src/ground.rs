//! Resolution-adjacent primitives that need no unification dispatch:
//! variable discovery (`symbols`), the occurs check, groundness, and full
//! grounding of terms and patterns.

use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use crate::term::{ArrayPart, ArrayPattern, ObjectPart, ObjectPattern, Value};
use crate::{Bindings, PatternError, Term, VarId};

// ---------------------------------------------------------------------------
// Symbols and the occurs check
// ---------------------------------------------------------------------------

/// Visit every distinct variable in `term`, in discovery order.
pub(crate) fn symbols_each(
    term: &Term,
    visited: &mut HashSet<VarId>,
    visit: &mut impl FnMut(&VarId),
) {
    symbols_each_dyn(term, visited, visit);
}

fn symbols_each_dyn(term: &Term, visited: &mut HashSet<VarId>, visit: &mut impl FnMut(&VarId)) {
    match term {
        Term::Var(var) => {
            if visited.insert(var.clone()) {
                visit(var);
            }
        }
        Term::Seq(items) => {
            for item in items.iter() {
                symbols_each_dyn(item, visited, visit);
            }
        }
        Term::Map(entries) => {
            for value in entries.values() {
                symbols_each_dyn(value, visited, visit);
            }
        }
        Term::Array(pattern) => {
            for part in &pattern.parts {
                match part {
                    ArrayPart::Items(items) => {
                        for item in items {
                            symbols_each_dyn(item, visited, visit);
                        }
                    }
                    ArrayPart::Spread(spread) => symbols_each_dyn(spread, visited, visit),
                }
            }
        }
        Term::Object(pattern) => {
            for part in &pattern.parts {
                match part {
                    ObjectPart::Props(props) => {
                        for value in props.values() {
                            symbols_each_dyn(value, visited, visit);
                        }
                    }
                    ObjectPart::Spread(spread) => symbols_each_dyn(spread, visited, visit),
                }
            }
        }
        Term::Slot(value) => {
            symbols_each_dyn(&value.slot, visited, visit);
            symbols_each_dyn(&value.default, visited, visit);
        }
        Term::Opaque(opaque) => {
            let mut nested = Vec::new();
            opaque.visit_children(&mut |child| nested.push(child.clone()));
            for child in &nested {
                symbols_each_dyn(child, visited, visit);
            }
        }
        Term::Int(_)
        | Term::Float(_)
        | Term::Bool(_)
        | Term::Str(_)
        | Term::Null
        | Term::Missing => {}
    }
}

/// Every distinct variable in `term`, in discovery order.
pub fn symbols(term: &Term) -> Vec<VarId> {
    let mut visited = HashSet::new();
    let mut out = Vec::new();
    symbols_each(term, &mut visited, &mut |var| out.push(var.clone()));
    out
}

/// Whether `structure` contains `var` anywhere. Used before every
/// variable-to-structure binding to reject cyclic terms; an occurs hit fails
/// unification, it does not raise.
pub fn occurs(structure: &Term, var: &VarId) -> bool {
    let mut visited = HashSet::new();
    let mut found = false;
    symbols_each(structure, &mut visited, &mut |v| {
        if v == var {
            found = true;
        }
    });
    found
}

/// Whether `term` contains no variables at all.
pub fn is_ground(term: &Term) -> bool {
    symbols(term).is_empty()
}

// ---------------------------------------------------------------------------
// Grounding
// ---------------------------------------------------------------------------

/// Recursively replace every bound variable in `term` with its resolved
/// value. Unbound variables pass through as themselves; patterns collapse to
/// the simplest equivalent term their bindings allow.
pub fn ground(term: &Term, bindings: &Bindings) -> Result<Term, PatternError> {
    let value = bindings.resolve(term).value;

    match &value {
        Term::Opaque(opaque) => opaque.ground_opaque(&value, bindings),
        Term::Array(pattern) => ground_array_pattern(pattern, bindings),
        Term::Object(pattern) => {
            let flat = flatten_object_parts(&pattern.parts, bindings)?;
            Ok(build_object_term(flat))
        }
        Term::Slot(slot) => Ok(Term::slot(Value {
            slot: ground(&slot.slot, bindings)?,
            default: ground(&slot.default, bindings)?,
            optional: slot.optional,
        })),
        Term::Seq(items) => {
            let grounded = items
                .iter()
                .map(|item| ground(item, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Term::Seq(Rc::new(grounded)))
        }
        Term::Map(entries) => {
            let mut grounded = BTreeMap::new();
            for (key, entry) in entries.iter() {
                grounded.insert(key.clone(), ground(entry, bindings)?);
            }
            Ok(Term::Map(Rc::new(grounded)))
        }
        _ => Ok(value),
    }
}

// ---------------------------------------------------------------------------
// Array pattern grounding
// ---------------------------------------------------------------------------

fn spread_name(spread: &Term) -> String {
    match spread {
        Term::Var(var) => var.display_name(),
        other => other.to_string(),
    }
}

/// Walk parts left to right, splicing resolved spreads into the current
/// fixed run. An unresolved spread is a hard gap: the result stays a
/// pattern. A spread bound to anything that is not a sequence is an error.
fn ground_array_pattern(pattern: &ArrayPattern, bindings: &Bindings) -> Result<Term, PatternError> {
    let mut acc: Vec<Term> = Vec::new();
    let mut out: Vec<ArrayPart> = Vec::new();

    let mut flush = |acc: &mut Vec<Term>, out: &mut Vec<ArrayPart>| {
        if !acc.is_empty() {
            out.push(ArrayPart::Items(std::mem::take(acc)));
        }
    };

    for part in &pattern.parts {
        match part {
            ArrayPart::Items(items) => {
                for item in items {
                    acc.push(ground(item, bindings)?);
                }
            }
            ArrayPart::Spread(spread) => match ground(spread, bindings)? {
                Term::Seq(items) => acc.extend(items.iter().cloned()),
                Term::Var(var) => {
                    flush(&mut acc, &mut out);
                    out.push(ArrayPart::Spread(Term::Var(var)));
                }
                Term::Array(nested) => {
                    // The nested pattern is already grounded; splice its
                    // parts so the gap structure flattens into ours.
                    flush(&mut acc, &mut out);
                    out.extend(nested.parts.iter().cloned());
                }
                _ => {
                    return Err(PatternError::ArraySpreadNotSeq {
                        name: spread_name(spread),
                    })
                }
            },
        }
    }

    if out.is_empty() {
        return Ok(Term::seq(acc));
    }
    flush(&mut acc, &mut out);
    Ok(Term::Array(Rc::new(ArrayPattern { parts: out })))
}

// ---------------------------------------------------------------------------
// Object pattern flattening and grounding
// ---------------------------------------------------------------------------

/// An object pattern reduced to one fixed-props map plus its spreads, in
/// order. Later fixed parts override earlier keys.
#[derive(Debug, Default, Clone)]
pub struct FlatObject {
    pub fixed: BTreeMap<String, Term>,
    pub spreads: Vec<Term>,
}

/// Reduce a parts list, grounding as it goes. Pre-bound nested patterns are
/// flattened recursively; a spread bound to a non-map value is an error.
pub fn flatten_object_parts(
    parts: &[ObjectPart],
    bindings: &Bindings,
) -> Result<FlatObject, PatternError> {
    let mut flat = FlatObject::default();
    for part in parts {
        match part {
            ObjectPart::Props(props) => {
                for (key, value) in props {
                    flat.fixed.insert(key.clone(), ground(value, bindings)?);
                }
            }
            ObjectPart::Spread(spread) => match ground(spread, bindings)? {
                Term::Var(var) => flat.spreads.push(Term::Var(var)),
                Term::Object(nested) => {
                    let inner = flatten_object_parts(&nested.parts, bindings)?;
                    flat.fixed.extend(inner.fixed);
                    flat.spreads.extend(inner.spreads);
                }
                Term::Map(entries) => {
                    for (key, value) in entries.iter() {
                        flat.fixed.insert(key.clone(), value.clone());
                    }
                }
                Term::Slot(_) => return Err(PatternError::SlotAsPatternPart),
                _ => {
                    return Err(PatternError::ObjectSpreadNotMap {
                        name: spread_name(spread),
                    })
                }
            },
        }
    }
    Ok(flat)
}

/// Build the simplest term equivalent to a flattened object pattern: a plain
/// map when there are no spreads, a bare variable when there is exactly one
/// spread and nothing fixed, otherwise a reconstructed pattern.
pub fn build_object_term(flat: FlatObject) -> Term {
    let FlatObject { fixed, spreads } = flat;
    if spreads.is_empty() {
        return Term::Map(Rc::new(fixed));
    }
    if spreads.len() == 1 && fixed.is_empty() {
        return spreads.into_iter().next().unwrap();
    }
    let mut parts = Vec::new();
    if !fixed.is_empty() {
        parts.push(ObjectPart::Props(fixed));
    }
    parts.extend(spreads.into_iter().map(ObjectPart::Spread));
    Term::Object(Rc::new(ObjectPattern::new(parts)))
}
