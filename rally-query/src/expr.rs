//! Filter expression tree and the builder that produces it.
//!
//! Predicates are written as a sequence of calls on a [`Group`]:
//!
//! ```
//! use rally_query::build;
//!
//! let expr = build(|q| {
//!     q.or(|q| {
//!         q.equal("name", "name");
//!         q.equal("description", "description");
//!     });
//!     q.equal("notes", "notes");
//! })
//! .unwrap();
//!
//! assert_eq!(
//!     expr.to_string(),
//!     "(((Name = name) or (Description = description)) and (Notes = notes))"
//! );
//! ```
//!
//! Construction is append-only. The first term added to a group becomes its
//! root; each later term is combined with the current root using the group's
//! combinator. `a, b, c` under `and` therefore nests as `((a and b) and c)`.
//! This left-leaning shape is what the webservice grammar has always been fed
//! and it is reproduced exactly; it does not encode any precedence rule.

use crate::literal::{Literal, render_operand};
use crate::names::camelize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a leaf term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    NotEqual,
    Contains,
    GreaterThan,
    LessThan,
    GreaterThanEqual,
    LessThanEqual,
}

impl Operator {
    /// The operator's token in the filter syntax.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::Contains => "contains",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanEqual => ">=",
            Operator::LessThanEqual => "<=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean connective joining two sub-expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn as_str(self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable binary filter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    /// `(<path> <op> <literal>)`. The path is kept in symbol form
    /// (`card.iteration_name`) and camel-cased when rendered.
    Term {
        path: String,
        op: Operator,
        value: Literal,
    },
    /// `(<lhs> <combinator> <rhs>)`.
    Binary {
        lhs: Box<Expression>,
        combinator: Combinator,
        rhs: Box<Expression>,
    },
}

impl Expression {
    /// Creates a leaf term.
    pub fn term(path: impl Into<String>, op: Operator, value: impl Into<Literal>) -> Self {
        Expression::Term {
            path: path.into(),
            op,
            value: value.into(),
        }
    }

    /// Joins two expressions.
    pub fn combine(lhs: Expression, combinator: Combinator, rhs: Expression) -> Self {
        Expression::Binary {
            lhs: Box::new(lhs),
            combinator,
            rhs: Box::new(rhs),
        }
    }

    /// Renders the expression in the webservice filter syntax.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Number of leaf terms in the tree.
    pub fn term_count(&self) -> usize {
        match self {
            Expression::Term { .. } => 1,
            Expression::Binary { lhs, rhs, .. } => lhs.term_count() + rhs.term_count(),
        }
    }

    /// Nesting depth; a single term has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Expression::Term { .. } => 1,
            Expression::Binary { lhs, rhs, .. } => 1 + lhs.depth().max(rhs.depth()),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Term { path, op, value } => {
                write!(f, "({} {} {})", camelize(path), op, render_operand(value))
            }
            Expression::Binary {
                lhs,
                combinator,
                rhs,
            } => write!(f, "({lhs} {combinator} {rhs})"),
        }
    }
}

/// A predicate block under construction.
///
/// Every call appends to the group: the first becomes the root, later ones
/// combine with the current root using the group's combinator.
#[derive(Debug, Clone, Default)]
pub struct Group {
    combinator: Combinator,
    root: Option<Expression>,
}

impl Group {
    /// Creates an empty group joined by `combinator`.
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            root: None,
        }
    }

    /// The group's combinator.
    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// Appends an expression to the group.
    pub fn push(&mut self, expression: Expression) -> &mut Self {
        self.root = Some(match self.root.take() {
            None => expression,
            Some(root) => Expression::combine(root, self.combinator, expression),
        });
        self
    }

    /// Appends a leaf term.
    pub fn term(
        &mut self,
        path: impl Into<String>,
        op: Operator,
        value: impl Into<Literal>,
    ) -> &mut Self {
        self.push(Expression::term(path, op, value))
    }

    pub fn equal(&mut self, path: impl Into<String>, value: impl Into<Literal>) -> &mut Self {
        self.term(path, Operator::Equal, value)
    }

    pub fn not_equal(&mut self, path: impl Into<String>, value: impl Into<Literal>) -> &mut Self {
        self.term(path, Operator::NotEqual, value)
    }

    pub fn contains(&mut self, path: impl Into<String>, value: impl Into<Literal>) -> &mut Self {
        self.term(path, Operator::Contains, value)
    }

    pub fn greater_than(
        &mut self,
        path: impl Into<String>,
        value: impl Into<Literal>,
    ) -> &mut Self {
        self.term(path, Operator::GreaterThan, value)
    }

    /// Alias for [`Group::greater_than`].
    pub fn gt(&mut self, path: impl Into<String>, value: impl Into<Literal>) -> &mut Self {
        self.greater_than(path, value)
    }

    pub fn less_than(&mut self, path: impl Into<String>, value: impl Into<Literal>) -> &mut Self {
        self.term(path, Operator::LessThan, value)
    }

    /// Alias for [`Group::less_than`].
    pub fn lt(&mut self, path: impl Into<String>, value: impl Into<Literal>) -> &mut Self {
        self.less_than(path, value)
    }

    pub fn greater_than_equal(
        &mut self,
        path: impl Into<String>,
        value: impl Into<Literal>,
    ) -> &mut Self {
        self.term(path, Operator::GreaterThanEqual, value)
    }

    /// Alias for [`Group::greater_than_equal`].
    pub fn gte(&mut self, path: impl Into<String>, value: impl Into<Literal>) -> &mut Self {
        self.greater_than_equal(path, value)
    }

    pub fn less_than_equal(
        &mut self,
        path: impl Into<String>,
        value: impl Into<Literal>,
    ) -> &mut Self {
        self.term(path, Operator::LessThanEqual, value)
    }

    /// Alias for [`Group::less_than_equal`].
    pub fn lte(&mut self, path: impl Into<String>, value: impl Into<Literal>) -> &mut Self {
        self.less_than_equal(path, value)
    }

    /// Appends a nested group joined by `and`.
    pub fn and(&mut self, block: impl FnOnce(&mut Group)) -> &mut Self {
        self.nested(Combinator::And, block)
    }

    /// Appends a nested group joined by `or`.
    pub fn or(&mut self, block: impl FnOnce(&mut Group)) -> &mut Self {
        self.nested(Combinator::Or, block)
    }

    /// A nested group that ends up empty contributes nothing.
    fn nested(&mut self, combinator: Combinator, block: impl FnOnce(&mut Group)) -> &mut Self {
        let mut group = Group::new(combinator);
        block(&mut group);
        if let Some(expression) = group.finish() {
            self.push(expression);
        }
        self
    }

    /// Consumes the group, yielding its root (`None` when nothing was added).
    pub fn finish(self) -> Option<Expression> {
        self.root
    }
}

/// Builds an expression from a predicate block whose terms default to `and`.
///
/// Returns `None` if the block adds no terms.
pub fn build(block: impl FnOnce(&mut Group)) -> Option<Expression> {
    let mut group = Group::new(Combinator::And);
    block(&mut group);
    group.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_nested_group_is_skipped() {
        let expr = build(|q| {
            q.equal("a", 1);
            q.or(|_| {});
        })
        .unwrap();
        assert_eq!(expr.to_string(), "(A = 1)");
    }

    #[test]
    fn depth_grows_with_each_appended_term() {
        let expr = build(|q| {
            q.equal("a", 1).equal("b", 2).equal("c", 3);
        })
        .unwrap();
        assert_eq!(expr.term_count(), 3);
        assert_eq!(expr.depth(), 3);
    }
}
