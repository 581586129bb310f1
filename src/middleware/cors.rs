//! Cross-origin resource sharing with a strict origin allow-list.
//!
//! Allowed origins get the `Access-Control-*` headers echoed back. Every
//! `OPTIONS` request is treated as a preflight and answered with
//! `204 No Content` without reaching the routes.

use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, HeaderMap, HeaderValue, ORIGIN, VARY,
};
use http::{Method, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Exact `scheme://host[:port]` origins, compared byte for byte.
    pub allowed_origins: Vec<String>,
    /// Accept any origin. Meant for local development only.
    pub allow_any_origin: bool,
    pub allow_credentials: bool,
    pub allowed_methods: String,
    pub allowed_headers: String,
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allow_any_origin: false,
            allow_credentials: true,
            allowed_methods: "GET, POST, PUT, DELETE, OPTIONS".to_owned(),
            allowed_headers: "Content-Type, Authorization, Idempotency-Key, X-Request-ID".to_owned(),
            max_age_seconds: 86_400,
        }
    }
}

/// Stages CORS headers for allowed origins and answers preflights.
#[derive(Clone, Debug)]
pub struct Cors {
    config: CorsConfig,
    methods: Option<HeaderValue>,
    headers: Option<HeaderValue>,
}

impl Cors {
    /// Method and header lists that are not valid header values are dropped
    /// from the response rather than failing construction.
    pub fn new(config: CorsConfig) -> Self {
        let methods = HeaderValue::from_str(&config.allowed_methods).ok();
        let headers = HeaderValue::from_str(&config.allowed_headers).ok();
        Self { config, methods, headers }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.config.allow_any_origin || self.config.allowed_origins.iter().any(|o| o == origin)
    }

    /// Writes the CORS headers for a request from `origin` if it is allowed.
    /// Returns whether anything was written.
    pub fn apply(&self, origin: &HeaderValue, headers: &mut HeaderMap) -> bool {
        let allowed = origin.to_str().map(|o| self.is_allowed(o)).unwrap_or(false);
        if !allowed {
            return false;
        }

        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        if self.config.allow_credentials {
            headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
        if let Some(methods) = &self.methods {
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, methods.clone());
        }
        if let Some(allowed_headers) = &self.headers {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allowed_headers.clone());
        }
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(self.config.max_age_seconds));
        headers.append(VARY, HeaderValue::from_static("origin"));
        true
    }
}

/// The CORS stage for `config`.
pub fn cors(config: CorsConfig) -> Cors {
    Cors::new(config)
}

impl Middleware for Cors {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
        if let Some(origin) = req.headers().get(ORIGIN).cloned() {
            if !self.apply(&origin, req.response_headers_mut()) {
                debug!(origin = ?origin, "cors: origin not allowed");
            }
        }

        if *req.method() == Method::OPTIONS {
            let mut res = Response::status(StatusCode::NO_CONTENT);
            res.merge_staged(req.take_response_headers());
            return Box::pin(async move { res });
        }

        Box::pin(next.run(req))
    }
}
