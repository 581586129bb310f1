//! Per-request tracing span.

use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// Runs the rest of the chain inside a `request` span carrying `method` and
/// `path`, then logs the status and latency. 5xx responses log at `warn`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

pub fn trace() -> Trace {
    Trace
}

impl Middleware for Trace {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let span = info_span!("request", method = %req.method(), path = %req.path());
        let started = Instant::now();

        Box::pin(
            async move {
                let res = next.run(req).await;
                let status = res.status_code().as_u16();
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                if res.status_code().is_server_error() {
                    warn!(status, latency_ms, "request failed");
                } else {
                    info!(status, latency_ms, "request completed");
                }
                res
            }
            .instrument(span),
        )
    }
}
