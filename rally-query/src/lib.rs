//! Query layer for the Rally webservice.
//!
//! - [`names`] — conversion between wire element names (`SalesforceCaseID`,
//!   `Card.IterationName`) and snake_case symbols
//! - [`Literal`] and [`render_literal`] — how values look on the wire
//! - [`Expression`] and [`Group`] — the filter expression tree and the
//!   append-only builder that produces it
//! - [`Query`] — a resource type plus filter plus parameters, rendered into
//!   the query string and advanced page by page
//!
//! # Example
//!
//! ```
//! use rally_query::Query;
//!
//! let query = Query::builder("defect")
//!     .filter(|q| {
//!         q.equal("name", "My Name");
//!     })
//!     .order(["package", "owner", "desc"])
//!     .fetch(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     query.render(),
//!     "query=(Name = \"My Name\")&order=Package, Owner desc&fetch=true"
//! );
//! ```

mod error;
mod expr;
mod literal;
pub mod names;
mod query;

pub use error::{QueryError, BuildResult};
pub use expr::{Combinator, Expression, Group, Operator, build};
pub use literal::{Literal, render_literal, render_operand};
pub use query::{PAGE_SIZE_PARAM, PAGING_CARRY_OVER, ParamValue, Query, QueryBuilder, START_PARAM};
