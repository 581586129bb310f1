//! # bulwark
//!
//! A minimal HTTP framework whose middleware layer puts baseline hardening
//! headers on every response.
//!
//! ## The contract
//!
//! The reverse proxy in front of the service owns TLS termination, rate
//! limiting and body-size limits. bulwark owns routing and the response
//! headers that tell browsers what a page may do:
//!
//! - [`middleware::SecurityHeaders`]: `X-Frame-Options`, `X-Content-Type-Options`,
//!   `Referrer-Policy`, `Permissions-Policy`, `X-XSS-Protection`
//! - [`middleware::Hsts`]: `Strict-Transport-Security`
//! - [`middleware::Csp`]: `Content-Security-Policy` or its report-only twin
//! - [`middleware::Cors`]: origin allow-list and preflight answers
//!
//! Each stage is configured once, holds no mutable state, and stages its
//! headers before the rest of the pipeline runs, so they land on error
//! responses and 404s too.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use bulwark::middleware::{self, HstsConfig};
//! use bulwark::{Request, Response, Router, Server};
//! use http::Method;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .on(Method::GET, "/quotes/{symbol}", quote)
//!         .layer(middleware::trace())
//!         .layer(middleware::security_headers())
//!         .layer(middleware::hsts(HstsConfig::default()));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn quote(req: Request) -> Response {
//!     let symbol = req.param("symbol").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"symbol":"{symbol}"}}"#))
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod health;
pub mod middleware;

pub use config::SecurityConfig;
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
