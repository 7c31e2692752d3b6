//! In-memory [`Transport`] that replays scripted responses per URL.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use serde_json::Value;

use crate::error::RequestError;
use crate::http::{RawResponse, RequestHeaders, Transport};

type Outcome = Result<RawResponse, RequestError>;

/// Replays queued outcomes for each URL in order.
///
/// Once a URL's queue is drained (or for URLs never scripted) the fallback
/// outcome is returned, a 404 unless changed.
pub struct ScriptedTransport {
    scripts: RefCell<HashMap<String, VecDeque<Outcome>>>,
    fallback: Outcome,
    calls: Cell<usize>,
    urls: RefCell<Vec<String>>,
    last_headers: RefCell<Option<RequestHeaders>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            scripts: RefCell::new(HashMap::new()),
            fallback: Ok(RawResponse {
                status: 404,
                body: r#"{"message":"Not Found"}"#.to_string(),
            }),
            calls: Cell::new(0),
            urls: RefCell::new(Vec::new()),
            last_headers: RefCell::new(None),
        }
    }

    fn push(self, url: &str, outcome: Outcome) -> Self {
        self.scripts
            .borrow_mut()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn respond(self, url: &str, response: RawResponse) -> Self {
        self.push(url, Ok(response))
    }

    pub fn respond_json(self, url: &str, body: &Value) -> Self {
        self.respond(url, RawResponse::ok(body.to_string()))
    }

    pub fn fail(self, url: &str, error: RequestError) -> Self {
        self.push(url, Err(error))
    }

    /// Answer every unscripted request with `status`.
    pub fn always_fail(mut self, status: u16) -> Self {
        self.fallback = Ok(RawResponse {
            status,
            body: String::new(),
        });
        self
    }

    /// Answer every unscripted request with a 200 and `body`.
    pub fn fallback_ok(mut self, body: &str) -> Self {
        self.fallback = Ok(RawResponse::ok(body));
        self
    }

    /// Total number of GETs issued
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Every requested URL in order
    pub fn urls(&self) -> Vec<String> {
        self.urls.borrow().clone()
    }

    pub fn last_headers(&self) -> Option<RequestHeaders> {
        self.last_headers.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str, headers: &RequestHeaders) -> Result<RawResponse, RequestError> {
        self.calls.set(self.calls.get() + 1);
        self.urls.borrow_mut().push(url.to_string());
        *self.last_headers.borrow_mut() = Some(headers.clone());
        self.scripts
            .borrow_mut()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.fallback.clone())
    }
}
