//! Middleware layer.
//!
//! Middleware wraps the whole pipeline: every request passes through each
//! registered stage in order, then through routing and the matched handler
//! (or the 404 fallback). Stages are registered with
//! [`Router::layer`](crate::Router::layer); the first one registered is the
//! outermost.
//!
//! A stage receives the [`Request`] and a [`Next`] for the rest of the chain.
//! It may stage response headers, call [`Next::run`] once and return what it
//! yields, or answer on its own without calling `next` at all.
//!
//! ```rust,no_run
//! use bulwark::middleware::{self, CspConfig, HstsConfig};
//! use bulwark::{Request, Response, Router};
//! use http::Method;
//!
//! # async fn quotes(_: Request) -> Response { Response::text("") }
//! let app = Router::new()
//!     .on(Method::GET, "/quotes", quotes)
//!     .layer(middleware::security_headers())
//!     .layer(middleware::hsts(HstsConfig::default()))
//!     .layer(middleware::csp(CspConfig { report_only: true }));
//! ```
//!
//! Built-in stages:
//! - [`SecurityHeaders`] — baseline hardening headers
//! - [`Hsts`] — `Strict-Transport-Security`
//! - [`Csp`] — `Content-Security-Policy` (optionally report-only)
//! - [`Cors`] — origin allow-list and preflight answers
//! - [`Trace`] — per-request span with method, path, status, latency

use std::future::Future;
use std::sync::Arc;

use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;

mod cors;
mod csp;
mod hsts;
mod security_headers;
mod trace;

pub use cors::{Cors, CorsConfig, cors};
pub use csp::{CSP_DIRECTIVES, Csp, CspConfig, csp};
pub use hsts::{Hsts, HstsConfig, hsts};
pub use security_headers::{SecurityHeaders, security_headers};
pub use trace::{Trace, trace};

/// One stage of the request pipeline.
///
/// Implemented by the built-in stages; implement it yourself for a reusable
/// stage with configuration, or use [`from_fn`] for a one-off closure.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the pipeline after the current stage.
///
/// [`Next::run`] consumes `self`, so a stage cannot invoke the rest of the
/// chain more than once.
pub struct Next {
    router: Arc<Router>,
    index: usize,
}

impl Next {
    pub(crate) fn new(router: Arc<Router>) -> Self {
        Self { router, index: 0 }
    }

    /// Runs the rest of the pipeline and resolves to its response.
    ///
    /// Headers staged on `req` before this call are merged onto the returned
    /// response, whatever its status, unless the downstream response already
    /// carries the same header name.
    pub async fn run(self, mut req: Request) -> Response {
        let staged = req.take_response_headers();

        let stage = self.router.middleware(self.index);
        let mut res = match stage {
            Some(stage) => {
                let next = Next { router: self.router, index: self.index + 1 };
                stage.handle(req, next).await
            }
            None => self.router.route(req).await,
        };

        res.merge_staged(staged);
        res
    }
}

/// Turns an async closure into a [`Middleware`].
///
/// ```rust,no_run
/// use bulwark::middleware::{self, Next};
/// use bulwark::{Request, Router};
/// use http::HeaderValue;
///
/// let app = Router::new().layer(middleware::from_fn(|mut req: Request, next: Next| async move {
///     req.response_headers_mut().insert("x-service", HeaderValue::from_static("titan"));
///     next.run(req).await
/// }));
/// ```
pub fn from_fn<F, Fut, R>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    FromFn(f)
}

/// A [`Middleware`] built from a closure by [`from_fn`].
pub struct FromFn<F>(F);

impl<F, Fut, R> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self.0)(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}
