//! Query: a resource type, a filter expression and query-string parameters.

use crate::error::{QueryError, BuildResult};
use crate::expr::{Expression, Group, build};
use crate::literal::{Literal, render_literal};
use crate::names::{camelize, lower_camelize};

/// Parameter keys that survive a page advance. Everything else (notably the
/// paging fields themselves) is replaced by the new page's values.
pub const PAGING_CARRY_OVER: [&str; 6] = [
    "workspace",
    "project",
    "project_scope_down",
    "project_scope_up",
    "order",
    "fetch",
];

/// Key of the first-result parameter.
pub const START_PARAM: &str = "start";
/// Key of the page-size parameter.
pub const PAGE_SIZE_PARAM: &str = "pagesize";

/// Value of a query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A single literal.
    Literal(Literal),
    /// One or more attribute names to sort by. A trailing `desc` token
    /// renders as ` desc` after the list instead of as another field.
    Order(Vec<String>),
}

impl ParamValue {
    /// Renders the value as it appears after `key=`.
    pub fn render(&self) -> String {
        match self {
            ParamValue::Literal(literal) => render_literal(literal),
            ParamValue::Order(fields) => {
                let (fields, descending) = match fields.split_last() {
                    Some((last, rest)) if !rest.is_empty() && last.eq_ignore_ascii_case("desc") => {
                        (rest, true)
                    }
                    _ => (fields.as_slice(), false),
                };
                let mut out = fields
                    .iter()
                    .map(|f| camelize(f))
                    .collect::<Vec<_>>()
                    .join(", ");
                if descending {
                    out.push_str(" desc");
                }
                out
            }
        }
    }
}

/// An immutable query. Only the paging fields change, and only by producing
/// a new query via [`Query::next_page`].
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    resource_type: String,
    expression: Option<Expression>,
    params: Vec<(String, ParamValue)>,
    carry_over: Vec<(String, ParamValue)>,
}

impl Query {
    /// Starts building a query for `resource_type` (a snake_case symbol such
    /// as `hierarchical_requirement`).
    pub fn builder(resource_type: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(resource_type)
    }

    /// The resource type symbol.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// The type as it appears in the URL path (`HierarchicalRequirement`).
    pub fn wire_type(&self) -> String {
        camelize(&self.resource_type)
    }

    pub fn expression(&self) -> Option<&Expression> {
        self.expression.as_ref()
    }

    /// Parameters in rendering order.
    pub fn params(&self) -> &[(String, ParamValue)] {
        &self.params
    }

    /// Looks up a parameter by its snake_case key.
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Renders the query string without percent-encoding:
    /// `query=<expr>&key=value...`.
    pub fn render(&self) -> String {
        self.render_with(|s| s.to_string())
    }

    /// Renders the query string with every expression and value
    /// percent-encoded, ready to append to a URL after `?`.
    pub fn encoded(&self) -> String {
        self.render_with(|s| urlencoding::encode(s).into_owned())
    }

    fn render_with(&self, encode: impl Fn(&str) -> String) -> String {
        let mut out = String::new();
        if let Some(expression) = &self.expression {
            out.push_str("query=");
            out.push_str(&encode(&expression.render()));
        }
        for (key, value) in &self.params {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(&lower_camelize(key));
            out.push('=');
            out.push_str(&encode(&value.render()));
        }
        out
    }

    /// Returns the query for another page: `start` and `pagesize` replaced,
    /// layered over the carry-over parameters (workspace, project, scope
    /// flags, order, fetch) of the original query.
    pub fn next_page(&self, start: u32, page_size: u32) -> Query {
        let mut params = vec![
            (
                START_PARAM.to_string(),
                ParamValue::Literal(Literal::from(start)),
            ),
            (
                PAGE_SIZE_PARAM.to_string(),
                ParamValue::Literal(Literal::from(page_size)),
            ),
        ];
        params.extend(self.carry_over.iter().cloned());
        Query {
            resource_type: self.resource_type.clone(),
            expression: self.expression.clone(),
            params,
            carry_over: self.carry_over.clone(),
        }
    }
}

/// Builder for [`Query`]. Parameters render in the order they were first set;
/// setting a key again replaces its value in place.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    resource_type: String,
    expression: Option<Expression>,
    params: Vec<(String, ParamValue)>,
}

impl QueryBuilder {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            expression: None,
            params: Vec::new(),
        }
    }

    /// Sets the filter from a predicate block (terms default to `and`).
    pub fn filter(mut self, block: impl FnOnce(&mut Group)) -> Self {
        self.expression = build(block);
        self
    }

    /// Sets an already-built filter expression.
    pub fn expression(mut self, expression: Expression) -> Self {
        self.expression = Some(expression);
        self
    }

    /// Sets an arbitrary parameter. Keys are snake_case and render in
    /// lowerCamelCase.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Literal>) -> Self {
        self.set(key.into(), ParamValue::Literal(value.into()));
        self
    }

    pub fn page_size(self, page_size: u32) -> Self {
        self.param(PAGE_SIZE_PARAM, page_size)
    }

    pub fn start(self, start: u32) -> Self {
        self.param(START_PARAM, start)
    }

    /// Requests full objects (`true`) or reference stubs (`false`).
    pub fn fetch(self, fetch: bool) -> Self {
        self.param("fetch", fetch)
    }

    /// Scopes the query to a workspace, given by its ref.
    pub fn workspace(self, workspace_ref: impl Into<String>) -> Self {
        self.param("workspace", workspace_ref.into())
    }

    /// Scopes the query to a project, given by its ref.
    pub fn project(self, project_ref: impl Into<String>) -> Self {
        self.param("project", project_ref.into())
    }

    pub fn project_scope_up(self, include_parents: bool) -> Self {
        self.param("project_scope_up", include_parents)
    }

    pub fn project_scope_down(self, include_children: bool) -> Self {
        self.param("project_scope_down", include_children)
    }

    /// Sorts by one or more attributes; end the list with `desc` to sort
    /// descending.
    pub fn order<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields.into_iter().map(Into::into).collect();
        self.set("order".to_string(), ParamValue::Order(fields));
        self
    }

    fn set(&mut self, key: String, value: ParamValue) {
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
    }

    /// Validates and finishes the query.
    ///
    /// Fails with [`QueryError::InvalidFetch`] if `fetch` does not render to
    /// `true` or `false`.
    pub fn build(self) -> BuildResult<Query> {
        if self.resource_type.trim().is_empty() {
            return Err(QueryError::EmptyType);
        }
        for (key, value) in &self.params {
            if key == "fetch" {
                let rendered = value.render();
                if rendered != "true" && rendered != "false" {
                    return Err(QueryError::InvalidFetch(rendered));
                }
            }
        }
        let carry_over = self
            .params
            .iter()
            .filter(|(k, _)| PAGING_CARRY_OVER.contains(&k.as_str()))
            .cloned()
            .collect();
        Ok(Query {
            resource_type: self.resource_type,
            expression: self.expression,
            params: self.params,
            carry_over,
        })
    }
}
