//! Named-variable interning.
//!
//! A [`VarPool`] hands out the *same* `VarId` for the same name, so host
//! code can refer to query variables by name without threading ids around.
//! Different pools never collide; identity still lives in the id, never the
//! name.

use std::cell::RefCell;
use std::collections::HashMap;

use horn_term::{Term, VarId, VarIdGen};

pub struct VarPool {
    ids: VarIdGen,
    named: RefCell<HashMap<String, VarId>>,
}

impl VarPool {
    pub fn new() -> Self {
        Self::with_ids(VarIdGen::new())
    }

    pub fn with_ids(ids: VarIdGen) -> Self {
        VarPool {
            ids,
            named: RefCell::new(HashMap::new()),
        }
    }

    /// The variable called `name`, interned on first use.
    pub fn var(&self, name: &str) -> VarId {
        self.named
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| self.ids.fresh(name))
            .clone()
    }

    /// The variable called `name`, as a term.
    pub fn term(&self, name: &str) -> Term {
        Term::Var(self.var(name))
    }

    /// A fresh variable not reachable by name again.
    pub fn fresh(&self, name: &str) -> VarId {
        self.ids.fresh(name)
    }
}

impl Default for VarPool {
    fn default() -> Self {
        Self::new()
    }
}
