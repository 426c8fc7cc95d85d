//! Literal values that appear on the right-hand side of filter terms and as
//! query parameter values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value rendered into the query string.
///
/// The set of cases is closed: every value the query layer emits is one of
/// these, and [`render_literal`] is the only place that decides how each one
/// looks on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    /// Rendered as the token `null`.
    Null,
    /// Rendered as `true` or `false`.
    Bool(bool),
    /// Rendered in decimal.
    Integer(i64),
    /// Rendered as-is.
    Text(String),
}

/// Renders a literal in its natural wire form: `null`, `true`/`false`,
/// decimal integers, or the text itself.
pub fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::Null => "null".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Integer(n) => n.to_string(),
        Literal::Text(s) => s.clone(),
    }
}

/// Renders a literal as the right-hand side of a filter term. Text containing
/// a space is wrapped in double quotes; everything else renders as in
/// [`render_literal`].
pub fn render_operand(literal: &Literal) -> String {
    match literal {
        Literal::Text(s) if s.contains(' ') => format!("\"{s}\""),
        other => render_literal(other),
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_literal(self))
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Text(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Text(s)
    }
}

impl From<&String> for Literal {
    fn from(s: &String) -> Self {
        Literal::Text(s.clone())
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

macro_rules! literal_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Literal {
                fn from(n: $t) -> Self {
                    Literal::Integer(i64::from(n))
                }
            }
        )*
    };
}

literal_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Literal::Null, Into::into)
    }
}
