use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    auth,
    metrics::track_metrics,
    middleware::{
        cors::create_cors_layer, request_id::request_id_middleware,
        security_headers::security_headers_middleware,
    },
    site,
    state::ApiState,
};

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(site::routes())
        .fallback(handler_404)
}

/// [`router`] with state and the full middleware stack.
///
/// Outermost first: CORS, request ID, HTTP trace, security headers, metrics.
pub fn app(state: ApiState, allowed_origins: Vec<String>) -> Router {
    let environment = state.environment;

    router()
        .with_state(state)
        .layer(middleware::from_fn(track_metrics))
        .layer(middleware::from_fn(move |req, next| {
            security_headers_middleware(environment, req, next)
        }))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(create_cors_layer(allowed_origins))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "The requested resource was not found" })),
    )
}
