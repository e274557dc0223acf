//! Compact, human-readable term rendering.
//!
//! Used by error messages, the four-port tracer, and tests. Variables render
//! by display name, spreads as `...R`, and slots as `X = default` (with
//! `optional(..)` marking soft defaults).

use std::fmt;

use crate::term::{ArrayPart, ObjectPart};
use crate::Term;

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(self, f)
    }
}

fn write_term(term: &Term, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match term {
        Term::Var(var) => write!(f, "{}", var.display_name()),
        Term::Int(n) => write!(f, "{n}"),
        Term::Float(x) => write!(f, "{x}"),
        Term::Bool(b) => write!(f, "{b}"),
        Term::Str(s) => write!(f, "'{s}'"),
        Term::Null => write!(f, "null"),
        Term::Missing => write!(f, "undefined"),
        Term::Seq(items) => {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_term(item, f)?;
            }
            write!(f, "]")
        }
        Term::Map(entries) => {
            write!(f, "{{")?;
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}: ")?;
                write_term(value, f)?;
            }
            write!(f, "}}")
        }
        Term::Array(pattern) => {
            write!(f, "[")?;
            let mut first = true;
            for part in &pattern.parts {
                match part {
                    ArrayPart::Items(items) => {
                        for item in items {
                            if !first {
                                write!(f, ", ")?;
                            }
                            first = false;
                            write_term(item, f)?;
                        }
                    }
                    ArrayPart::Spread(spread) => {
                        if !first {
                            write!(f, ", ")?;
                        }
                        first = false;
                        write!(f, "...")?;
                        write_term(spread, f)?;
                    }
                }
            }
            write!(f, "]")
        }
        Term::Object(pattern) => {
            write!(f, "{{")?;
            let mut first = true;
            for part in &pattern.parts {
                match part {
                    ObjectPart::Props(props) => {
                        for (key, value) in props {
                            if !first {
                                write!(f, ", ")?;
                            }
                            first = false;
                            write!(f, "{key}: ")?;
                            write_term(value, f)?;
                        }
                    }
                    ObjectPart::Spread(spread) => {
                        if !first {
                            write!(f, ", ")?;
                        }
                        first = false;
                        write!(f, "...")?;
                        write_term(spread, f)?;
                    }
                }
            }
            write!(f, "}}")
        }
        Term::Slot(value) => {
            if value.optional {
                write!(f, "{} = optional({})", value.slot, value.default)
            } else {
                write!(f, "{} = {}", value.slot, value.default)
            }
        }
        Term::Opaque(opaque) => write!(f, "{}", opaque.repr()),
    }
}
