//! Dashboard API behind the full security stack.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example dashboard
//!   RUST_LOG=info cargo run --example dashboard -- security.toml
//!
//! Try:
//!   curl -i http://localhost:3000/api/watchlist
//!   curl -i http://localhost:3000/healthz
//!   curl -i -X OPTIONS http://localhost:3000/api/watchlist -H 'origin: http://localhost:5173'

use bulwark::middleware::{self, CorsConfig, CspConfig, HstsConfig};
use bulwark::{Request, Response, Router, SecurityConfig, Server, health};
use http::{Method, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let security = match std::env::args().nth(1) {
        Some(path) => SecurityConfig::load(&path).expect("invalid security config"),
        None => SecurityConfig {
            baseline: true,
            hsts: Some(HstsConfig::default()),
            csp: Some(CspConfig { report_only: true }),
            cors: Some(CorsConfig {
                allowed_origins: vec!["http://localhost:5173".to_owned()],
                ..CorsConfig::default()
            }),
        },
    };

    let app = Router::new()
        .on(Method::GET,  "/api/watchlist",         watchlist)
        .on(Method::POST, "/api/alerts",            create_alert)
        .on(Method::GET,  "/api/quotes/{symbol}",   quote)
        .on(Method::GET,  "/healthz",               health::liveness)
        .on(Method::GET,  "/readyz",                health::readiness)
        .layer(middleware::trace());

    Server::bind("0.0.0.0:3000")
        .serve(security.apply(app))
        .await
        .expect("server error");
}

// GET /api/watchlist
async fn watchlist(_req: Request) -> Response {
    Response::json(r#"[{"symbol":"BTC"},{"symbol":"ETH"}]"#)
}

// POST /api/alerts → 201, or 400 on an empty body
async fn create_alert(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/api/alerts/1")
        .json(r#"{"id":1}"#)
}

// GET /api/quotes/{symbol}
async fn quote(req: Request) -> Result<Response, (StatusCode, &'static str)> {
    let symbol = req.param("symbol").unwrap_or_default();
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "bad symbol"));
    }
    Ok(Response::json(format!(r#"{{"symbol":"{symbol}","last":null}}"#)))
}
