//! Baseline hardening headers, sent unconditionally on every response.
//!
//! | Header | Value |
//! |---|---|
//! | `X-Frame-Options` | `DENY` |
//! | `X-Content-Type-Options` | `nosniff` |
//! | `Referrer-Policy` | `no-referrer` |
//! | `Permissions-Policy` | geolocation, microphone, camera, payment, usb, magnetometer, gyroscope all disabled |
//! | `X-XSS-Protection` | `1; mode=block` |

use http::header::{
    HeaderMap, HeaderName, HeaderValue, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
    X_XSS_PROTECTION,
};

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

static BASELINE: [(HeaderName, HeaderValue); 5] = [
    (X_FRAME_OPTIONS,        HeaderValue::from_static("DENY")),
    (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
    (REFERRER_POLICY,        HeaderValue::from_static("no-referrer")),
    (
        PERMISSIONS_POLICY,
        HeaderValue::from_static(
            "geolocation=(), microphone=(), camera=(), payment=(), usb=(), magnetometer=(), gyroscope=()",
        ),
    ),
    (X_XSS_PROTECTION,       HeaderValue::from_static("1; mode=block")),
];

/// Stages the five baseline hardening headers, then continues the chain.
#[derive(Clone, Copy, Debug, Default)]
pub struct SecurityHeaders;

impl SecurityHeaders {
    pub fn new() -> Self { Self }

    /// Writes the baseline headers into `headers`, replacing earlier values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &BASELINE {
            headers.insert(name.clone(), value.clone());
        }
    }
}

/// The baseline hardening stage.
pub fn security_headers() -> SecurityHeaders {
    SecurityHeaders::new()
}

impl Middleware for SecurityHeaders {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
        self.apply(req.response_headers_mut());
        Box::pin(next.run(req))
    }
}
