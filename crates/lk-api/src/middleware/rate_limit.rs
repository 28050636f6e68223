//! Per-client rate limits, keyed on the client IP.
//!
//! Clients are identified by [`SmartIpKeyExtractor`]: `X-Forwarded-For`,
//! `X-Real-IP` and `Forwarded` first, then the peer address. The binary must
//! therefore be served with `into_make_service_with_connect_info`.
//!
//! [`SmartIpKeyExtractor`]: tower_governor::key_extractor::SmartIpKeyExtractor

/// One auth request is replenished every this many milliseconds (2 per second).
pub const AUTH_REPLENISH_MS: u64 = 500;
/// Auth requests a client may fire back to back.
pub const AUTH_BURST_SIZE: u32 = 10;

/// Crawler endpoints are cheap but walk the disk on every sitemap hit.
pub const SITE_REPLENISH_MS: u64 = 100;
pub const SITE_BURST_SIZE: u32 = 30;

/// Build a `GovernorLayer` replenishing one request every `$replenish_ms`
/// milliseconds with a burst of `$burst`.
#[macro_export]
macro_rules! make_rate_limit_layer {
    ($replenish_ms:expr, $burst:expr) => {{
        let config = ::tower_governor::governor::GovernorConfigBuilder::default()
            .per_millisecond($replenish_ms)
            .burst_size($burst)
            .key_extractor(::tower_governor::key_extractor::SmartIpKeyExtractor)
            .use_headers()
            .finish()
            .expect("rate limit period and burst size must be non-zero");

        ::tower_governor::GovernorLayer::new(config)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        extract::ConnectInfo,
        http::{Request, StatusCode},
        routing::get,
    };
    use std::net::SocketAddr;
    use tower::ServiceExt;

    fn request(ip: &str) -> Request<Body> {
        let mut request = Request::builder()
            .uri("/")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 8080))));
        request
    }

    #[tokio::test]
    async fn test_burst_then_limited() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(make_rate_limit_layer!(60_000, 2));

        for _ in 0..2 {
            let response = app.clone().oneshot(request("10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.clone().oneshot(request("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        // Budgets are per client.
        let response = app.oneshot(request("10.0.0.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
