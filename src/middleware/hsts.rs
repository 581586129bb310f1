//! `Strict-Transport-Security`.
//!
//! Only enable this behind a proxy that terminates HTTPS with a valid
//! certificate. Once a browser has seen the header it refuses plain HTTP to
//! the host for `max_age_seconds`. Nothing here checks the scheme.

use http::header::{HeaderMap, HeaderValue, STRICT_TRANSPORT_SECURITY};
use serde::Deserialize;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// One year.
const DEFAULT_MAX_AGE: u64 = 31_536_000;

/// HSTS directives.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HstsConfig {
    pub max_age_seconds: u64,
    pub include_subdomains: bool,
    pub preload: bool,
}

impl Default for HstsConfig {
    fn default() -> Self {
        Self { max_age_seconds: DEFAULT_MAX_AGE, include_subdomains: true, preload: false }
    }
}

impl HstsConfig {
    /// `max-age=<n>[; includeSubDomains][; preload]`, clauses in that order.
    pub fn header_value(&self) -> String {
        let mut value = format!("max-age={}", self.max_age_seconds);
        if self.include_subdomains {
            value.push_str("; includeSubDomains");
        }
        if self.preload {
            value.push_str("; preload");
        }
        value
    }
}

/// Stages `Strict-Transport-Security`, then continues the chain.
///
/// The header value is rendered once, at construction.
#[derive(Clone, Debug)]
pub struct Hsts {
    value: HeaderValue,
}

impl Hsts {
    pub fn new(config: HstsConfig) -> Self {
        // Digits, letters, `=`, `;` and spaces only.
        let value = HeaderValue::from_str(&config.header_value())
            .expect("hsts directives are visible ASCII");
        Self { value }
    }

    pub fn header_value(&self) -> &HeaderValue { &self.value }

    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(STRICT_TRANSPORT_SECURITY, self.value.clone());
    }
}

impl Default for Hsts {
    fn default() -> Self { Self::new(HstsConfig::default()) }
}

/// The HSTS stage for `config`.
pub fn hsts(config: HstsConfig) -> Hsts {
    Hsts::new(config)
}

impl Middleware for Hsts {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
        self.apply(req.response_headers_mut());
        Box::pin(next.run(req))
    }
}
