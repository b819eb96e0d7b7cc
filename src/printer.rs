//! Rendering of values back to text.
//!
//! Two modes exist: readable output escapes strings so the text can be read
//! back, display output writes string contents raw. `Display` for [`Value`]
//! is readable; the alternate flag (`{:#}`) selects display output.

use crate::ast::Value;
use std::fmt;

/// Render `value`, escaping strings when `print_readably` is set
pub fn pr_str(value: &Value, print_readably: bool) -> String {
    if print_readably {
        format!("{value}")
    } else {
        format!("{value:#}")
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in s.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

fn write_sequence(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    close: &str,
    items: &[Value],
) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        // Forward the alternate flag so nested strings use the same mode
        if f.alternate() {
            write!(f, "{item:#}")?;
        } else {
            write!(f, "{item}")?;
        }
    }
    write!(f, "{close}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) if f.alternate() => write!(f, "{s}"),
            Value::String(s) => write_escaped(f, s),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::List(items) => write_sequence(f, "(", ")", items),
            Value::Vector(items) => write_sequence(f, "[", "]", items),
            Value::HashMap(items) => write_sequence(f, "{", "}", items),
            Value::Function(_) => write!(f, "#<function>"),
        }
    }
}
