//! Paged query results.

use crate::api::RallyClient;
use crate::config::CollectionPolicy;
use crate::error::{RallyError, RallyResult};
use crate::parse::Parser;
use crate::resource::Resource;
use crate::session::Session;
use crate::value::AttributeValue;
use crate::xml::Element;
use rally_query::Query;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// One page of a query response.
///
/// `start_index` is 1-based; 0 means the response was not a paged result
/// (typically: nothing matched).
pub struct QueryResult {
    session: Rc<Session>,
    query: Query,
    total_result_count: u32,
    page_size: u32,
    start_index: u32,
    results: Vec<Resource>,
}

impl QueryResult {
    /// Parses a `QueryResult` document returned for `query`.
    pub fn parse(client: &RallyClient, query: Query, xml: &str) -> RallyResult<Self> {
        let document = Element::parse(xml)?;
        Self::from_document(Rc::clone(client.session()), query, &document)
    }

    pub(crate) fn from_document(
        session: Rc<Session>,
        query: Query,
        document: &Element,
    ) -> RallyResult<Self> {
        if document.name != "QueryResult" {
            return Err(RallyError::MalformedResponse(format!(
                "expected QueryResult, got <{}>",
                document.name
            )));
        }
        // Results are always a plain list, whatever the client's policy.
        let attributes = Parser {
            session: Some(&session),
            policy: CollectionPolicy::Flat,
        }
        .attributes(document);

        let count = |key: &str| -> u32 {
            attributes
                .get(key)
                .and_then(AttributeValue::as_text)
                .and_then(|t| t.trim().parse().ok())
                .unwrap_or(0)
        };
        let total_result_count = count("total_result_count");
        let page_size = count("page_size");
        let start_index = count("start_index");

        let results = attributes
            .get("results")
            .map(AttributeValue::flatten)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| match v {
                AttributeValue::Resource(r) => Some(r),
                _ => None,
            })
            .collect();

        Ok(Self {
            session,
            query,
            total_result_count,
            page_size,
            start_index,
            results,
        })
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn total_result_count(&self) -> u32 {
        self.total_result_count
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    /// Resources on this page.
    pub fn results(&self) -> &[Resource] {
        &self.results
    }

    /// Number of resources on this page.
    pub fn page_length(&self) -> usize {
        self.results.len()
    }

    /// First resource on this page. Handy for queries expected to match once.
    pub fn first(&self) -> Option<&Resource> {
        self.results.first()
    }

    /// True if results exist beyond this page.
    pub fn more_pages(&self) -> bool {
        more_pages(self.total_result_count, self.start_index, self.page_length())
    }

    /// Start index of the following page. The step is the reported page
    /// size, or this page's length when the response carried none. `None`
    /// when neither moves past this page.
    fn next_start(&self) -> Option<u32> {
        let step = match self.page_size {
            0 => u32::try_from(self.page_length()).unwrap_or(u32::MAX),
            size => size,
        };
        if step == 0 {
            return None;
        }
        self.start_index.checked_add(step)
    }

    /// Fetches the following page with a new request.
    pub fn next_page(&self) -> RallyResult<QueryResult> {
        let start = self.next_start().ok_or_else(|| {
            RallyError::InvalidState("cannot advance past an empty page without a page size".to_string())
        })?;
        let page_size = match self.page_size {
            0 => start - self.start_index,
            size => size,
        };
        let next = self.query.next_page(start, page_size);
        debug!(start, page_size, "Fetching next page");
        self.session.query(&next)
    }
}

/// Paging formula: no more pages for an unpaged response (start index 0),
/// otherwise more pages while the last index on this page is below the
/// total.
pub fn more_pages(total_result_count: u32, start_index: u32, page_length: usize) -> bool {
    if start_index == 0 {
        return false;
    }
    (u64::from(start_index) + page_length as u64 - 1) < u64::from(total_result_count)
}

impl fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("type", &self.query.resource_type())
            .field("total_result_count", &self.total_result_count)
            .field("page_size", &self.page_size)
            .field("start_index", &self.start_index)
            .field("page_length", &self.results.len())
            .finish()
    }
}

impl IntoIterator for QueryResult {
    type Item = RallyResult<Resource>;
    type IntoIter = Pages;

    fn into_iter(self) -> Pages {
        Pages {
            current: Some(self),
            position: 0,
        }
    }
}

/// Walks every result of a query, fetching pages as it goes.
///
/// Each item is a [`Resource::duplicate`] of the page's entry. The walk is
/// not restartable and stops for good after a failed page fetch.
///
/// Unlike a walk driven by the paging counts alone, it also stops at the
/// first follow-up page that is empty or does not advance the start index,
/// even if the counts still promise more.
pub struct Pages {
    current: Option<QueryResult>,
    position: usize,
}

impl Iterator for Pages {
    type Item = RallyResult<Resource>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let page = self.current.as_ref()?;
            if let Some(resource) = page.results.get(self.position) {
                self.position += 1;
                return Some(Ok(resource.duplicate()));
            }
            if !page.more_pages() || page.next_start().is_none() {
                self.current = None;
                return None;
            }
            match page.next_page() {
                // No results, or a start index that did not move: the server
                // has nothing further.
                Ok(next) if next.results.is_empty() || next.start_index <= page.start_index => {
                    self.current = None;
                    return None;
                }
                Ok(next) => {
                    self.current = Some(next);
                    self.position = 0;
                }
                Err(e) => {
                    self.current = None;
                    return Some(Err(e));
                }
            }
        }
    }
}
