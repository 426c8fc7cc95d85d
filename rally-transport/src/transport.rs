//! Transport abstraction.
//!
//! The resource layer talks to the webservice through [`Transport`] only:
//! three verbs, absolute URLs, XML bodies in and out. Error detection
//! (authentication, `<Errors>` payloads, timeouts) happens inside the
//! transport so every caller gets a classified [`TransportError`].

use crate::error::TransportResult;
use std::fmt;
use std::rc::Rc;

/// HTTP verb of a transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        })
    }
}

/// Sends requests to the webservice and returns response bodies.
///
/// Implementations authenticate every request, send `Content-Type: text/xml`
/// and fail with a classified error instead of returning an error payload.
pub trait Transport {
    /// Reads the XML document at `url`.
    fn get(&self, url: &str) -> TransportResult<String>;

    /// Posts an XML document to `url` and returns the response document.
    fn post(&self, url: &str, body: &str) -> TransportResult<String>;

    /// Deletes the resource at `url`.
    fn delete(&self, url: &str) -> TransportResult<String>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, url: &str) -> TransportResult<String> {
        (**self).get(url)
    }

    fn post(&self, url: &str, body: &str) -> TransportResult<String> {
        (**self).post(url, body)
    }

    fn delete(&self, url: &str) -> TransportResult<String> {
        (**self).delete(url)
    }
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn get(&self, url: &str) -> TransportResult<String> {
        (**self).get(url)
    }

    fn post(&self, url: &str, body: &str) -> TransportResult<String> {
        (**self).post(url, body)
    }

    fn delete(&self, url: &str) -> TransportResult<String> {
        (**self).delete(url)
    }
}

/// Mock transport for testing.
///
/// Responses are registered per `(method, url)`. A URL ending in `*` matches
/// any URL with that prefix. Queued responses are served once each, in order,
/// before the standing response for the same route. Clones share state, so a
/// test can keep one handle while the client owns another.
pub mod mock {
    use super::*;
    use crate::error::TransportError;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    /// A request seen by the mock.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedRequest {
        pub method: Method,
        pub url: String,
        pub body: Option<String>,
    }

    #[derive(Debug, Default)]
    struct MockState {
        queued: HashMap<(Method, String), VecDeque<TransportResult<String>>>,
        standing: HashMap<(Method, String), TransportResult<String>>,
        requests: Vec<RecordedRequest>,
    }

    impl MockState {
        fn route_for(&self, method: Method, url: &str) -> Option<(Method, String)> {
            let exact = (method, url.to_string());
            if self.queued.get(&exact).is_some_and(|q| !q.is_empty())
                || self.standing.contains_key(&exact)
            {
                return Some(exact);
            }
            // Longest matching prefix wins.
            self.queued
                .iter()
                .filter(|(_, q)| !q.is_empty())
                .map(|(k, _)| k)
                .chain(self.standing.keys())
                .filter(|(m, pattern)| {
                    *m == method
                        && pattern
                            .strip_suffix('*')
                            .is_some_and(|prefix| url.starts_with(prefix))
                })
                .max_by_key(|(_, pattern)| pattern.len())
                .cloned()
        }

        fn respond(&mut self, method: Method, url: &str) -> TransportResult<String> {
            let Some(route) = self.route_for(method, url) else {
                return Err(TransportError::Network(format!(
                    "no mock response for {method} {url}"
                )));
            };
            if let Some(response) = self.queued.get_mut(&route).and_then(VecDeque::pop_front) {
                return response;
            }
            self.standing.get(&route).cloned().unwrap_or_else(|| {
                Err(TransportError::Network(format!(
                    "mock responses for {method} {url} exhausted"
                )))
            })
        }
    }

    /// In-memory [`Transport`] with canned responses and a request log.
    #[derive(Debug, Clone, Default)]
    pub struct MockTransport {
        state: Arc<Mutex<MockState>>,
    }

    impl MockTransport {
        /// Creates a mock with no routes.
        pub fn new() -> Self {
            Self::default()
        }

        fn state(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Serves `body` for every GET of `url`.
        pub fn on_get(&self, url: impl Into<String>, body: impl Into<String>) -> &Self {
            self.respond_with(Method::Get, url, Ok(body.into()))
        }

        /// Serves `body` for every POST to `url`.
        pub fn on_post(&self, url: impl Into<String>, body: impl Into<String>) -> &Self {
            self.respond_with(Method::Post, url, Ok(body.into()))
        }

        /// Serves `body` for every DELETE of `url`.
        pub fn on_delete(&self, url: impl Into<String>, body: impl Into<String>) -> &Self {
            self.respond_with(Method::Delete, url, Ok(body.into()))
        }

        /// Sets the standing response for a route, replacing any previous one.
        pub fn respond_with(
            &self,
            method: Method,
            url: impl Into<String>,
            response: TransportResult<String>,
        ) -> &Self {
            self.state().standing.insert((method, url.into()), response);
            self
        }

        /// Queues a one-shot response for a route.
        pub fn enqueue(
            &self,
            method: Method,
            url: impl Into<String>,
            response: TransportResult<String>,
        ) -> &Self {
            self.state()
                .queued
                .entry((method, url.into()))
                .or_default()
                .push_back(response);
            self
        }

        /// All requests received so far, oldest first.
        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.state().requests.clone()
        }

        /// Total number of requests received.
        pub fn request_count(&self) -> usize {
            self.state().requests.len()
        }

        /// Number of requests received for one method and exact URL.
        pub fn count(&self, method: Method, url: &str) -> usize {
            self.state()
                .requests
                .iter()
                .filter(|r| r.method == method && r.url == url)
                .count()
        }

        /// The most recent request with the given method.
        pub fn last(&self, method: Method) -> Option<RecordedRequest> {
            self.state()
                .requests
                .iter()
                .rev()
                .find(|r| r.method == method)
                .cloned()
        }

        /// Forgets recorded requests. Routes stay registered.
        pub fn clear_requests(&self) {
            self.state().requests.clear();
        }

        fn call(&self, method: Method, url: &str, body: Option<&str>) -> TransportResult<String> {
            let mut state = self.state();
            state.requests.push(RecordedRequest {
                method,
                url: url.to_string(),
                body: body.map(str::to_string),
            });
            state.respond(method, url)
        }
    }

    impl Transport for MockTransport {
        fn get(&self, url: &str) -> TransportResult<String> {
            self.call(Method::Get, url, None)
        }

        fn post(&self, url: &str, body: &str) -> TransportResult<String> {
            self.call(Method::Post, url, Some(body))
        }

        fn delete(&self, url: &str) -> TransportResult<String> {
            self.call(Method::Delete, url, None)
        }
    }
}
