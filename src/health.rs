//! Health-check handlers for orchestrators and load balancers.
//!
//! | Probe | Path | Meaning |
//! |---|---|---|
//! | liveness | `/healthz` | the process answers HTTP |
//! | readiness | `/readyz` | the process should receive traffic |
//!
//! ```rust,no_run
//! use bulwark::{Router, health};
//! use http::Method;
//!
//! let app = Router::new()
//!     .on(Method::GET, "/healthz", health::liveness)
//!     .on(Method::GET, "/readyz", health::readiness);
//! ```
//!
//! Probe responses go through the middleware stack like any other route, so
//! they carry the security headers too.

use crate::{Request, Response};

/// Always `200 OK` with body `ok`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// `200 OK` with body `ready`. Register your own handler instead when
/// readiness depends on upstream feeds or a database.
pub async fn readiness(_req: Request) -> Response {
    Response::text("ready")
}
