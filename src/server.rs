//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! On SIGTERM or Ctrl-C (or the future passed to
//! [`Server::serve_with_shutdown`]) the server:
//! 1. stops calling `listener.accept()`, so no new connections are made,
//! 2. lets every in-flight connection task run to completion,
//! 3. returns from `serve`, which lets `main` exit cleanly.
//!
//! Set the grace period longer than your slowest request.
//!
//! # TLS
//!
//! The server speaks plain HTTP. HSTS assumes the proxy in front of it
//! terminates HTTPS with a valid certificate.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::error::Error;
use crate::router::Router;

// ── Server ────────────────────────────────────────────────────────────────────

/// Where connections come from: an address to bind at start-up, or a
/// listener the caller already bound (port `0` in tests).
enum Listen {
    Addr(SocketAddr),
    Listener(TcpListener),
}

/// The HTTP server.
pub struct Server {
    listen: Listen,
}

impl Server {
    /// Configures the server to bind to `addr` when it starts serving.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// ```rust,no_run
    /// use bulwark::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { listen: Listen::Addr(addr) }
    }

    /// Serves on an already bound listener.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { listen: Listen::Listener(listener) }
    }

    /// Accepts connections and dispatches them through `router`.
    ///
    /// Returns only after a full graceful shutdown: SIGTERM or Ctrl-C,
    /// followed by every in-flight request completing.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting once `signal`
    /// resolves instead of waiting for a process signal.
    pub async fn serve_with_shutdown<F>(self, router: Router, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let listener = match self.listen {
            Listen::Addr(addr) => TcpListener::bind(addr).await?,
            Listen::Listener(listener) => listener,
        };
        let addr = listener.local_addr()?;

        // One routing table and middleware stack, shared by every connection
        // task through the `Arc`.
        let router = Arc::new(router);

        info!(%addr, "bulwark listening");

        // ── Request dispatch ──────────────────────────────────────────────────

        // Tracks every spawned connection task so shutdown can wait for them.
        let mut tasks = JoinSet::new();

        // `select!` polls the signal by reference on every iteration, so it
        // has to stay at one address: pin it to the stack.
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Arms are checked top to bottom. Shutdown comes first so a
                // signal stops accepting at once, even with connections queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    // Adapts tokio's AsyncRead/AsyncWrite to hyper's IO traits.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection, not once
                        // per connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { Ok::<_, Infallible>(router.call(req).await) }
                        });

                        // HTTP/1.1 or HTTP/2, whichever the client speaks.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(%peer, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the set does not grow
                // without bound on a long-running server.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection before returning.
        while tasks.join_next().await.is_some() {}

        info!("bulwark stopped");
        Ok(())
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this is **SIGTERM** (sent by the Kubernetes control plane) or
/// **SIGINT** (Ctrl-C during local development). Elsewhere only Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // Never resolves, which disables the SIGTERM arm off Unix.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
