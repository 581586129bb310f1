//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request with its body fully read.
///
/// Besides the request itself, a `Request` carries the *staged response
/// headers*: headers a middleware wants on the eventual response, written
/// before the rest of the pipeline has produced that response. See
/// [`Request::response_headers_mut`].
pub struct Request {
    parts: Parts,
    body: Bytes,
    params: HashMap<String, String>,
    staged: HeaderMap,
    unreadable: bool,
}

impl Request {
    pub(crate) fn new(parts: Parts, body: Bytes) -> Self {
        Self { parts, body, params: HashMap::new(), staged: HeaderMap::new(), unreadable: false }
    }

    /// A request whose body failed to arrive. It still runs through the
    /// middleware so the error response gets the staged headers, and is
    /// answered with `400 Bad Request` in place of routing.
    pub(crate) fn unreadable(parts: Parts) -> Self {
        Self { unreadable: true, ..Self::new(parts, Bytes::new()) }
    }

    pub fn method(&self) -> &Method { &self.parts.method }
    pub fn uri(&self) -> &Uri { &self.parts.uri }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// `true` when reading the body failed; [`body`](Request::body) is then empty.
    pub fn body_unreadable(&self) -> bool { self.unreadable }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/quotes/{symbol}`, `req.param("symbol")` on `/quotes/BTC`
    /// returns `Some("BTC")`. Always `None` inside middleware, which runs
    /// before routing.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn response_headers(&self) -> &HeaderMap { &self.staged }

    /// Headers to attach to the response this request eventually produces.
    ///
    /// Whatever is staged here when [`Next::run`](crate::middleware::Next::run)
    /// is called is merged onto the downstream response, error responses
    /// included. A header the downstream response already sets keeps its
    /// downstream value.
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap { &mut self.staged }

    pub(crate) fn take_response_headers(&mut self) -> HeaderMap {
        std::mem::take(&mut self.staged)
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}
