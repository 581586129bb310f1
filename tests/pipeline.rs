use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use bulwark::middleware::{self, CorsConfig, CspConfig, HstsConfig, Next, CSP_DIRECTIVES};
use bulwark::{Request, Response, Router, SecurityConfig};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Frame};

const PERMISSIONS: &str =
    "geolocation=(), microphone=(), camera=(), payment=(), usb=(), magnetometer=(), gyroscope=()";

const BASELINE_KEYS: [&str; 5] = [
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
    "permissions-policy",
    "x-xss-protection",
];

fn request(method: Method, path: &str, body: &'static str) -> http::Request<Full<Bytes>> {
    http::Request::builder()
        .method(method)
        .uri(path)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

async fn send(app: &Arc<Router>, req: http::Request<Full<Bytes>>) -> (StatusCode, HeaderMap, Bytes) {
    let res = Arc::clone(app).call(req).await;
    let (parts, body) = res.into_parts();
    let body = body.collect().await.unwrap().to_bytes();
    (parts.status, parts.headers, body)
}

fn assert_baseline(headers: &HeaderMap) {
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(headers["permissions-policy"], PERMISSIONS);
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
}

async fn watchlist(_req: Request) -> Response {
    Response::json(r#"["BTC","ETH"]"#)
}

async fn echo(req: Request) -> Response {
    Response::text(Bytes::copy_from_slice(req.body()))
}

async fn broken(_req: Request) -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "feed offline")
}

fn app() -> Router {
    Router::new()
        .on(Method::GET,    "/api/watchlist", watchlist)
        .on(Method::POST,   "/api/echo",      echo)
        .on(Method::DELETE, "/api/echo",      echo)
        .on(Method::GET,    "/api/broken",    broken)
}

#[tokio::test]
async fn baseline_on_every_method_and_path() {
    let app = Arc::new(app().layer(middleware::security_headers()));

    let cases = [
        (Method::GET,    "/api/watchlist", ""),
        (Method::POST,   "/api/echo",      r#"{"qty":1}"#),
        (Method::DELETE, "/api/echo",      ""),
        (Method::GET,    "/api/broken",    ""),
        (Method::PUT,    "/nowhere",       "ignored"),
    ];

    for (method, path, body) in cases {
        let (_, headers, _) = send(&app, request(method, path, body)).await;
        assert_baseline(&headers);
    }
}

#[tokio::test]
async fn unmatched_route_still_gets_headers() {
    let app = Arc::new(app().layer(middleware::security_headers()));

    let (status, headers, _) = send(&app, request(Method::GET, "/missing", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_baseline(&headers);
}

#[tokio::test]
async fn running_baseline_twice_matches_once() {
    let once = Arc::new(app().layer(middleware::security_headers()));
    let twice = Arc::new(
        app()
            .layer(middleware::security_headers())
            .layer(middleware::security_headers()),
    );

    let (_, a, _) = send(&once, request(Method::GET, "/api/watchlist", "")).await;
    let (_, b, _) = send(&twice, request(Method::GET, "/api/watchlist", "")).await;

    for key in BASELINE_KEYS {
        assert_eq!(a.get_all(key).iter().count(), 1, "{key}");
        assert_eq!(b.get_all(key).iter().count(), 1, "{key}");
        assert_eq!(a[key], b[key], "{key}");
    }
}

#[tokio::test]
async fn hsts_values() {
    let short = Arc::new(app().layer(middleware::hsts(HstsConfig {
        max_age_seconds: 3600,
        include_subdomains: false,
        preload: false,
    })));
    let full = Arc::new(app().layer(middleware::hsts(HstsConfig {
        max_age_seconds: 100,
        include_subdomains: true,
        preload: true,
    })));

    let (_, headers, _) = send(&short, request(Method::GET, "/api/watchlist", "")).await;
    assert_eq!(headers["strict-transport-security"], "max-age=3600");

    let (_, headers, _) = send(&full, request(Method::GET, "/api/watchlist", "")).await;
    assert_eq!(headers["strict-transport-security"], "max-age=100; includeSubDomains; preload");
}

#[tokio::test]
async fn csp_header_name_follows_mode() {
    let enforcing = Arc::new(app().layer(middleware::csp(CspConfig { report_only: false })));
    let reporting = Arc::new(app().layer(middleware::csp(CspConfig { report_only: true })));

    let (_, headers, _) = send(&enforcing, request(Method::GET, "/api/watchlist", "")).await;
    assert_eq!(headers["content-security-policy"], CSP_DIRECTIVES);
    assert!(!headers.contains_key("content-security-policy-report-only"));

    let (_, headers, _) = send(&reporting, request(Method::GET, "/api/watchlist", "")).await;
    assert_eq!(headers["content-security-policy-report-only"], CSP_DIRECTIVES);
    assert!(!headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn downstream_result_passes_through_unchanged() {
    let plain = Arc::new(app());
    let secured = Arc::new(
        app()
            .layer(middleware::security_headers())
            .layer(middleware::hsts(HstsConfig::default()))
            .layer(middleware::csp(CspConfig::default())),
    );

    for (method, path, body) in [
        (Method::POST, "/api/echo",   "order:BTC:1"),
        (Method::GET,  "/api/broken", ""),
    ] {
        let (status_a, headers_a, body_a) = send(&plain, request(method.clone(), path, body)).await;
        let (status_b, headers_b, body_b) = send(&secured, request(method, path, body)).await;

        assert_eq!(status_a, status_b);
        assert_eq!(body_a, body_b);
        assert_eq!(headers_a["content-type"], headers_b["content-type"]);
    }

    let (status, headers, body) = send(&secured, request(Method::GET, "/api/broken", "")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(&body[..], b"feed offline");
    assert_baseline(&headers);
}

#[tokio::test]
async fn downstream_runs_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let app = Arc::new(
        Router::new()
            .on(Method::GET, "/api/watchlist", move |_req: Request| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Response::text("ok")
                }
            })
            .layer(middleware::security_headers())
            .layer(middleware::hsts(HstsConfig::default()))
            .layer(middleware::csp(CspConfig::default())),
    );

    send(&app, request(Method::GET, "/api/watchlist", "")).await;
    send(&app, request(Method::GET, "/api/watchlist", "")).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stages_compose_in_any_order() {
    let forward = Arc::new(
        app()
            .layer(middleware::security_headers())
            .layer(middleware::hsts(HstsConfig::default()))
            .layer(middleware::csp(CspConfig::default())),
    );
    let reverse = Arc::new(
        app()
            .layer(middleware::csp(CspConfig::default()))
            .layer(middleware::hsts(HstsConfig::default()))
            .layer(middleware::security_headers()),
    );

    let (_, a, _) = send(&forward, request(Method::GET, "/api/watchlist", "")).await;
    let (_, b, _) = send(&reverse, request(Method::GET, "/api/watchlist", "")).await;

    for headers in [&a, &b] {
        assert_baseline(headers);
        assert_eq!(headers["strict-transport-security"], "max-age=31536000; includeSubDomains");
        assert_eq!(headers["content-security-policy"], CSP_DIRECTIVES);
        // content-type + five baseline + hsts + csp
        assert_eq!(headers.len(), 8);
    }
}

#[tokio::test]
async fn handler_set_header_wins_over_staged() {
    async fn framed(_req: Request) -> Response {
        Response::builder().header("x-frame-options", "SAMEORIGIN").text("embeddable")
    }

    let app = Arc::new(
        Router::new()
            .on(Method::GET, "/embed", framed)
            .layer(middleware::security_headers()),
    );

    let (_, headers, _) = send(&app, request(Method::GET, "/embed", "")).await;
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
}

#[tokio::test]
async fn staged_headers_reach_short_circuit_responses() {
    let app = Arc::new(
        app()
            .layer(middleware::security_headers())
            .layer(middleware::from_fn(|req: Request, next: Next| async move {
                if req.header("authorization").is_none() {
                    return Response::status(StatusCode::UNAUTHORIZED);
                }
                next.run(req).await
            })),
    );

    let (status, headers, _) = send(&app, request(Method::GET, "/api/watchlist", "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_baseline(&headers);
}

#[tokio::test]
async fn from_fn_can_stage_headers() {
    let app = Arc::new(app().layer(middleware::from_fn(|mut req: Request, next: Next| async move {
        req.response_headers_mut().insert("x-service", HeaderValue::from_static("titan"));
        next.run(req).await
    })));

    let (_, headers, _) = send(&app, request(Method::GET, "/api/watchlist", "")).await;
    assert_eq!(headers["x-service"], "titan");
}

#[tokio::test]
async fn cors_preflight_and_simple_requests() {
    let app = Arc::new(
        app()
            .layer(middleware::security_headers())
            .layer(middleware::cors(CorsConfig {
                allowed_origins: vec!["https://dash.titan.example".to_owned()],
                ..CorsConfig::default()
            })),
    );

    let preflight = http::Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/watchlist")
        .header("origin", "https://dash.titan.example")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, headers, _) = send(&app, preflight).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(headers["access-control-allow-origin"], "https://dash.titan.example");
    assert_baseline(&headers);

    let foreign = http::Request::builder()
        .method(Method::GET)
        .uri("/api/watchlist")
        .header("origin", "https://evil.example")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, headers, _) = send(&app, foreign).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!headers.contains_key("access-control-allow-origin"));
    assert_baseline(&headers);
}

#[tokio::test]
async fn cors_vary_survives_handler_vary() {
    async fn compressed(_req: Request) -> Response {
        Response::builder().header("vary", "accept-encoding").json(r#"["BTC"]"#)
    }

    let app = Arc::new(
        Router::new()
            .on(Method::GET, "/api/watchlist", compressed)
            .layer(middleware::cors(CorsConfig {
                allowed_origins: vec!["https://a.example".to_owned()],
                ..CorsConfig::default()
            })),
    );

    let req = http::Request::builder()
        .uri("/api/watchlist")
        .header("origin", "https://a.example")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (_, headers, _) = send(&app, req).await;

    assert_eq!(headers["access-control-allow-origin"], "https://a.example");
    let vary: Vec<_> = headers.get_all("vary").iter().collect();
    assert_eq!(vary, ["accept-encoding", "origin"]);
}

/// A body whose connection drops before the first frame.
struct ResetBody;

impl Body for ResetBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, io::Error>>> {
        Poll::Ready(Some(Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"))))
    }
}

#[tokio::test]
async fn unreadable_body_is_400_with_headers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let app = Arc::new(
        Router::new()
            .on(Method::POST, "/api/echo", move |_req: Request| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Response::text("unreachable")
                }
            })
            .layer(middleware::security_headers())
            .layer(middleware::hsts(HstsConfig::default())),
    );

    let req = http::Request::post("/api/echo").body(ResetBody).unwrap();
    let res = Arc::clone(&app).call(req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_baseline(res.headers());
    assert_eq!(res.headers()["strict-transport-security"], "max-age=31536000; includeSubDomains");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn config_drives_the_stack() {
    let config = SecurityConfig::from_toml(
        r#"
        [hsts]
        max_age_seconds = 3600
        include_subdomains = false

        [csp]
        report_only = true
        "#,
    )
    .unwrap();
    let app = Arc::new(config.apply(app()));

    let (_, headers, _) = send(&app, request(Method::GET, "/api/watchlist", "")).await;
    assert_baseline(&headers);
    assert_eq!(headers["strict-transport-security"], "max-age=3600");
    assert_eq!(headers["content-security-policy-report-only"], CSP_DIRECTIVES);
    assert!(!headers.contains_key("access-control-allow-origin"));
}
