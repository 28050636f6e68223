use std::time::Instant;

use axum::{
    Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use lk_site::{robots, sitemap};

use crate::{ApiState, error::ApiError, metrics::record_sitemap_build, middleware::rate_limit};

const CACHE_CONTROL: &str = "public, max-age=3600";

pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    Router::new()
        .route("/robots.txt", get(robots_txt))
        .route("/sitemap.xml", get(sitemap_xml))
        .layer(make_rate_limit_layer!(
            rate_limit::SITE_REPLENISH_MS,
            rate_limit::SITE_BURST_SIZE
        ))
}

async fn robots_txt(State(state): State<ApiState>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        robots::render(&state.robots),
    )
}

/// Rebuilt on every request so new content shows up without a restart.
async fn sitemap_xml(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    let urls = sitemap::collect(&state.sitemap, Utc::now()).await?;
    record_sitemap_build(start.elapsed().as_secs_f64(), urls.len());
    tracing::debug!(urls = urls.len(), "Built sitemap");

    Ok((
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        sitemap::render(&urls),
    ))
}
