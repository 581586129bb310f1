//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue, VARY};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use tracing::error;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK)
///
/// ```rust
/// use bulwark::Response;
/// use http::StatusCode;
///
/// Response::json(r#"{"symbol":"BTC"}"#);
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use bulwark::{ContentType, Response};
/// use http::StatusCode;
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/alerts/42")
///     .json(r#"{"id":42}"#);
///
/// Response::builder().bytes(ContentType::Html, "<h1>ok</h1>");
/// ```
#[derive(Debug)]
pub struct Response {
    inner: http::Response<Full<Bytes>>,
}

impl Response {
    /// `200 OK` — `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<Bytes>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        let mut inner = http::Response::new(Full::new(Bytes::new()));
        *inner.status_mut() = code;
        Self { inner }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { inner: http::Response::builder() }
    }

    pub fn status_code(&self) -> StatusCode { self.inner.status() }
    pub fn headers(&self) -> &HeaderMap { self.inner.headers() }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { self.inner.headers_mut() }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn into_inner(self) -> http::Response<Full<Bytes>> { self.inner }

    /// Copies staged headers onto this response, skipping every name the
    /// response already carries.
    ///
    /// `Vary` is a list: staged entries are appended unless every field name
    /// they list is already present, so a handler's `Vary: accept-encoding`
    /// and a stage's `Vary: origin` both reach the client.
    pub(crate) fn merge_staged(&mut self, staged: HeaderMap) {
        let headers = self.inner.headers_mut();
        for name in staged.keys() {
            if *name == VARY {
                for value in staged.get_all(VARY) {
                    if !vary_lists(headers, value) {
                        headers.append(VARY, value.clone());
                    }
                }
                continue;
            }
            if headers.contains_key(name) {
                continue;
            }
            for value in staged.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
    }
}

/// Whether every field name in `value` already appears in the `Vary`
/// entries of `headers`. Comparison is case-insensitive; `*` covers all.
fn vary_lists(headers: &HeaderMap, value: &HeaderValue) -> bool {
    let listed: Vec<&str> = headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .collect();
    if listed.contains(&"*") {
        return true;
    }

    let Ok(value) = value.to_str() else { return false };
    value
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .all(|field| listed.iter().any(|l| l.eq_ignore_ascii_case(field)))
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`. Terminated by a
/// typed body method. An invalid header name or value turns the result into
/// a bare `500 Internal Server Error`.
pub struct ResponseBuilder {
    inner: http::response::Builder,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.inner = self.inner.status(code);
        self
    }

    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        <K as TryInto<HeaderName>>::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        <V as TryInto<HeaderValue>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.header(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.bytes(ContentType::Json, body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<Bytes>) -> Response {
        self.bytes(ContentType::Text, body)
    }

    /// Terminate with a typed body.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        let builder = self.inner.header(CONTENT_TYPE, content_type.as_str());
        Self::finish(builder, body.into())
    }

    /// Terminate with no body (e.g. `204 No Content`, `301 Moved Permanently`).
    pub fn no_body(self) -> Response {
        Self::finish(self.inner, Bytes::new())
    }

    fn finish(builder: http::response::Builder, body: Bytes) -> Response {
        match builder.body(Full::new(body)) {
            Ok(inner) => Response { inner },
            Err(e) => {
                error!("invalid response: {e}");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// `(StatusCode::BAD_REQUEST, "missing symbol")`
impl<T: IntoResponse> IntoResponse for (StatusCode, T) {
    fn into_response(self) -> Response {
        let mut res = self.1.into_response();
        *res.inner.status_mut() = self.0;
        res
    }
}

/// Handlers may fail: the error side is rendered like any other response.
impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}
