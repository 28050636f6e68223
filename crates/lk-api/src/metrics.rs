//! Prometheus metrics: HTTP traffic plus auth flow outcomes.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const REQUEST_DURATION: &str = "http_request_duration_seconds";
const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Installs the global recorder. Call once per process.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), DURATION_BUCKETS)?
        .install_recorder()?;

    Ok(handle)
}

pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = method_label(req.method());
    let path = normalize_path(req.uri().path());

    let in_flight = gauge!("http_requests_in_flight", "method" => method, "path" => path);
    in_flight.increment(1.0);

    let response = next.run(req).await;

    in_flight.decrement(1.0);

    let status = response.status().as_u16().to_string();
    counter!(
        "http_requests_total",
        "method" => method,
        "path" => path,
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        REQUEST_DURATION,
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// Clients may send any extension method; only the standard ones get a label.
fn method_label(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        _ => "OTHER",
    }
}

/// Label for a request path: the route it matched, or `/:unmatched`.
///
/// Every served route is listed here, so the label set stays fixed no matter
/// which paths clients request.
fn normalize_path(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/robots.txt" => "/robots.txt",
        "/sitemap.xml" => "/sitemap.xml",
        "/metrics" => "/metrics",
        "/auth/confirm" => "/auth/confirm",
        "/auth/callback" => "/auth/callback",
        p if p
            .strip_prefix("/auth/oauth/")
            .is_some_and(|provider| !provider.is_empty() && !provider.contains('/')) =>
        {
            "/auth/oauth/:provider"
        }
        _ => "/:unmatched",
    }
}

pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
}

/// Count one outcome of an auth flow step.
///
/// `event` is the flow step (`confirm`, `oauth_start`, `oauth_callback`);
/// `method` the OTP type or provider, or `invalid` when validation failed.
pub fn record_auth_event(event: &'static str, method: &str, success: bool) {
    let status = if success { "success" } else { "failure" };

    counter!(
        "auth_events_total",
        "type" => event,
        "method" => method.to_string(),
        "status" => status
    )
    .increment(1);
}

pub fn record_sitemap_build(duration_secs: f64, urls: usize) {
    histogram!("sitemap_build_duration_seconds").record(duration_secs);
    gauge!("sitemap_urls").set(urls as f64);
}
