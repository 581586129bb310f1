//! `Content-Security-Policy`, enforcing or report-only.
//!
//! The directive list is fixed. `script-src` allows `'unsafe-inline'` and
//! `'unsafe-eval'` because the dashboard bundles still rely on both; treat it
//! as a starting point, not a hardened policy.

use http::header::{
    CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY_REPORT_ONLY, HeaderMap, HeaderName,
    HeaderValue,
};
use serde::Deserialize;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// The policy sent by [`Csp`], in both modes.
pub const CSP_DIRECTIVES: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
    style-src 'self' 'unsafe-inline'; \
    img-src 'self' data: https:; \
    font-src 'self' data:; \
    connect-src 'self'; \
    frame-ancestors 'none'; \
    base-uri 'self'; \
    form-action 'self'";

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CspConfig {
    /// Send `Content-Security-Policy-Report-Only` so violations are reported
    /// by the browser but not blocked.
    pub report_only: bool,
}

/// Stages the content security policy, then continues the chain.
#[derive(Clone, Debug)]
pub struct Csp {
    name: HeaderName,
}

impl Csp {
    pub fn new(config: CspConfig) -> Self {
        let name = if config.report_only {
            CONTENT_SECURITY_POLICY_REPORT_ONLY
        } else {
            CONTENT_SECURITY_POLICY
        };
        Self { name }
    }

    pub fn header_name(&self) -> &HeaderName { &self.name }

    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(self.name.clone(), HeaderValue::from_static(CSP_DIRECTIVES));
    }
}

impl Default for Csp {
    fn default() -> Self { Self::new(CspConfig::default()) }
}

/// The CSP stage for `config`.
pub fn csp(config: CspConfig) -> Csp {
    Csp::new(config)
}

impl Middleware for Csp {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
        self.apply(req.response_headers_mut());
        Box::pin(next.run(req))
    }
}
