//! Array pattern unification: `[fixed..., ...spread, fixed...]`.
//!
//! Spread variables are resolved by a non-greedy, leftmost-first split
//! search: every split point is tried in ascending order, the tail of the
//! pattern is unified against the remaining value first, and the first split
//! where both tail and spread succeed wins. This ordering is an observable
//! policy, not an implementation detail — it decides which of several valid
//! splits is chosen, and it deliberately does not backtrack across nested
//! split interactions (a known incompleteness kept for compatibility).

use horn_term::{ground, ArrayPart, ArrayPattern, Binding, Bindings, Location, Term, Unified};

use crate::{attempt, UnifyAction, Unifier};

pub(crate) fn unify_array(
    u: &mut Unifier,
    pattern: &ArrayPattern,
    other: &Binding,
    bindings: &Bindings,
    location: &Location,
    self_binding: &Binding,
) -> Unified {
    let mut b = bindings.clone();

    // A variable on the other side is bound to the pattern itself before the
    // parts run; the anonymous variable is a no-op inside `bind`.
    if other.value.is_var() {
        match u.bind(other, self_binding, &b, location) {
            Some(next) => b = next,
            None => return Ok(None),
        }
    }

    // A pattern whose spreads are all resolved is just a sequence.
    let grounded = ground(&self_binding.value, &b)?;
    let parts: Vec<ArrayPart> = match &grounded {
        Term::Seq(items) => vec![ArrayPart::Items((**items).clone())],
        Term::Array(open) => open.parts.clone(),
        // Grounding an array pattern yields a sequence or a pattern.
        _ => return Ok(None),
    };

    match &other.value {
        Term::Seq(items) => unify_parts(u, &parts, items, &b, location),
        Term::Array(_) => {
            let other_grounded = ground(&other.value, &b)?;
            match &other_grounded {
                Term::Seq(items) => unify_parts(u, &parts, items, &b, location),
                Term::Array(open) => {
                    if let Term::Seq(items) = &grounded {
                        // This side is concrete after all: run the split
                        // search from the open side.
                        unify_parts(u, &open.parts, items, &b, location)
                    } else {
                        unify_open_patterns(u, &parts, &open.parts, &b, location)
                    }
                }
                _ => Ok(None),
            }
        }
        Term::Var(_) => walk_parts(u, &pattern.parts, &b, location),
        _ => Ok(None),
    }
}

/// Consume `parts` left to right against a concrete slice.
fn unify_parts(
    u: &mut Unifier,
    parts: &[ArrayPart],
    value: &[Term],
    bindings: &Bindings,
    location: &Location,
) -> Unified {
    let Some((head, rest)) = parts.split_first() else {
        return Ok(if value.is_empty() {
            Some(bindings.clone())
        } else {
            None
        });
    };

    match head {
        ArrayPart::Items(items) => {
            let min = fixed_min_len(items, bindings);
            if value.len() < min {
                return Ok(None);
            }
            // Pad the value with `undefined` up to the run's literal length
            // so trailing optional slots can absorb the gap.
            let take = items.len().min(value.len());
            let mut b = bindings.clone();
            for (i, item) in items.iter().enumerate() {
                let against = if i < take {
                    value[i].clone()
                } else {
                    Term::Missing
                };
                b = attempt!(u.unify(item, &against, &b, location));
            }
            unify_parts(u, rest, &value[take..], &b, location)
        }
        ArrayPart::Spread(spread) => match bindings.resolve(spread).value {
            Term::Seq(items) => {
                // A bound spread is a fixed run; splice and retry.
                let mut next = vec![ArrayPart::Items((*items).clone())];
                next.extend_from_slice(rest);
                unify_parts(u, &next, value, bindings, location)
            }
            Term::Array(nested) => {
                // A spread resolved to another pattern flattens in place.
                let mut next = nested.parts.clone();
                next.extend_from_slice(rest);
                unify_parts(u, &next, value, bindings, location)
            }
            _ => {
                let tail_min = parts_min_len(rest, bindings);
                if value.len() < tail_min {
                    return Ok(None);
                }
                // Non-greedy: shortest head first. Tail before head, so a
                // failing tail never commits the spread.
                for split in 0..=(value.len() - tail_min) {
                    let tail = match unify_parts(u, rest, &value[split..], bindings, location)? {
                        Some(tail) => tail,
                        None => continue,
                    };
                    let head_value = Term::seq(value[..split].to_vec());
                    if let Some(done) = u.unify(spread, &head_value, &tail, location)? {
                        u.push_step(
                            UnifyAction::SpreadSplit,
                            spread,
                            &head_value,
                            format!("split at {split}"),
                        );
                        return Ok(Some(done));
                    }
                }
                Ok(None)
            }
        },
    }
}

/// The smallest number of elements a fixed run must consume: trailing
/// contiguous optional slots don't count.
fn fixed_min_len(items: &[Term], bindings: &Bindings) -> usize {
    let mut min = items.len();
    for item in items.iter().rev() {
        match bindings.resolve(item).value {
            Term::Slot(slot) if slot.optional => min -= 1,
            _ => break,
        }
    }
    min
}

/// The smallest number of elements a parts list can match.
fn parts_min_len(parts: &[ArrayPart], bindings: &Bindings) -> usize {
    parts
        .iter()
        .map(|part| match part {
            ArrayPart::Items(items) => fixed_min_len(items, bindings),
            ArrayPart::Spread(spread) => match bindings.resolve(spread).value {
                Term::Seq(items) => items.len(),
                Term::Array(nested) => parts_min_len(&nested.parts, bindings),
                _ => 0,
            },
        })
        .sum()
}

/// Both sides are genuinely open (unresolved spreads on both). Unify the
/// shared leading and trailing fixed elements pairwise, then unify the open
/// remainders.
fn unify_open_patterns(
    u: &mut Unifier,
    parts1: &[ArrayPart],
    parts2: &[ArrayPart],
    bindings: &Bindings,
    location: &Location,
) -> Unified {
    let (pre1, mid1, post1) = split_open(parts1);
    let (pre2, mid2, post2) = split_open(parts2);

    let mut b = bindings.clone();

    let pre_len = pre1.len().min(pre2.len());
    for (e1, e2) in pre1.iter().zip(pre2.iter()).take(pre_len) {
        b = attempt!(u.unify(e1, e2, &b, location));
    }

    let post_len = post1.len().min(post2.len());
    for i in 0..post_len {
        let e1 = &post1[post1.len() - 1 - i];
        let e2 = &post2[post2.len() - 1 - i];
        b = attempt!(u.unify(e1, e2, &b, location));
    }

    let rem1 = rebuild_remainder(&pre1[pre_len..], &mid1, &post1[..post1.len() - post_len]);
    let rem2 = rebuild_remainder(&pre2[pre_len..], &mid2, &post2[..post2.len() - post_len]);

    // A bare spread remainder binds directly; this is also what keeps the
    // recursion finite once no fixed elements remain to trim.
    if let Term::Var(_) = rem1 {
        return u.unify(&rem1, &rem2, &b, location);
    }
    if let Term::Var(_) = rem2 {
        return u.unify(&rem2, &rem1, &b, location);
    }
    if pre_len == 0 && post_len == 0 {
        // No progress is possible: both remainders still open with fixed
        // elements facing a spread on the far side. Matching would require
        // real search over spread splits; first-success policy gives up.
        u.push_step(UnifyAction::Fail, &rem1, &rem2, "ambiguous open remainders");
        return Ok(None);
    }
    u.unify(&rem1, &rem2, &b, location)
}

/// Split a parts list into leading fixed elements, the open middle, and
/// trailing fixed elements.
fn split_open(parts: &[ArrayPart]) -> (Vec<Term>, Vec<ArrayPart>, Vec<Term>) {
    let first_spread = parts
        .iter()
        .position(|p| matches!(p, ArrayPart::Spread(_)))
        .unwrap_or(parts.len());
    let last_spread = parts
        .iter()
        .rposition(|p| matches!(p, ArrayPart::Spread(_)))
        .unwrap_or(0);

    let mut pre = Vec::new();
    for part in &parts[..first_spread] {
        if let ArrayPart::Items(items) = part {
            pre.extend(items.iter().cloned());
        }
    }
    let mut post = Vec::new();
    if first_spread < parts.len() {
        for part in &parts[last_spread + 1..] {
            if let ArrayPart::Items(items) = part {
                post.extend(items.iter().cloned());
            }
        }
    }
    let mid = if first_spread < parts.len() {
        parts[first_spread..=last_spread].to_vec()
    } else {
        Vec::new()
    };
    (pre, mid, post)
}

/// Build the simplest term for a leftover (pre, middle, post) triple.
fn rebuild_remainder(pre: &[Term], mid: &[ArrayPart], post: &[Term]) -> Term {
    let mut parts: Vec<ArrayPart> = Vec::new();
    if !pre.is_empty() {
        parts.push(ArrayPart::Items(pre.to_vec()));
    }
    parts.extend(mid.iter().cloned());
    if !post.is_empty() {
        parts.push(ArrayPart::Items(post.to_vec()));
    }

    if parts.len() == 1 {
        match &parts[0] {
            ArrayPart::Spread(spread) => return spread.clone(),
            ArrayPart::Items(items) => return Term::seq(items.clone()),
        }
    }
    if parts.is_empty() {
        return Term::seq([]);
    }
    Term::Array(std::rc::Rc::new(ArrayPattern { parts }))
}

/// Unify every element of every part against `_`, so custom unifiers nested
/// in the pattern run even though the other side is unconstrained.
pub(crate) fn walk_parts(
    u: &mut Unifier,
    parts: &[ArrayPart],
    bindings: &Bindings,
    location: &Location,
) -> Unified {
    let mut b = bindings.clone();
    for part in parts {
        match part {
            ArrayPart::Items(items) => {
                for item in items {
                    b = attempt!(u.unify(item, &Term::anon(), &b, location));
                }
            }
            ArrayPart::Spread(spread) => {
                b = attempt!(u.unify(spread, &Term::anon(), &b, location));
            }
        }
    }
    Ok(Some(b))
}
