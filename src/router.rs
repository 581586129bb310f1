//! Radix-tree request router and the middleware stack in front of it.
//!
//! One tree per HTTP method, O(path-length) lookup. Middleware registered
//! with [`Router::layer`] wraps every request, matched or not.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use matchit::Router as MatchitRouter;
use tracing::warn;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// The application: routes plus the middleware that wraps them.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Every builder method returns `self` so registrations chain.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    middleware: Vec<BoxedMiddleware>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), middleware: Vec::new() }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or conflicts with an existing route.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Append a middleware stage. Stages run in registration order, so the
    /// first stage added sees the request first and the response last.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Runs one request through the whole pipeline: middleware, routing and
    /// the handler (or the `404` fallback).
    ///
    /// A body that fails to read still passes through the middleware and is
    /// answered with `400 Bad Request` where routing would happen.
    pub async fn call<B>(self: Arc<Self>, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Display,
    {
        // Buffer the whole body up front: handlers and middleware see `Bytes`,
        // never a stream.
        let (parts, body) = req.into_parts();
        let req = match body.collect().await {
            Ok(collected) => Request::new(parts, collected.to_bytes()),
            Err(e) => {
                warn!(path = %parts.uri.path(), "failed to read request body: {e}");
                Request::unreadable(parts)
            }
        };

        Next::new(self).run(req).await.into_inner()
    }

    pub(crate) fn middleware(&self, index: usize) -> Option<BoxedMiddleware> {
        self.middleware.get(index).cloned()
    }

    /// The innermost pipeline stage.
    pub(crate) async fn route(&self, mut req: Request) -> Response {
        if req.body_unreadable() {
            return Response::status(StatusCode::BAD_REQUEST);
        }

        match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.set_params(params);
                handler.call(req).await
            }
            None => Response::status(StatusCode::NOT_FOUND),
        }
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
