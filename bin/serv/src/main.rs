use std::net::SocketAddr;

use axum::{Router, routing::get};
use lk_api::{
    ApiConfig, ApiState,
    metrics::{init_metrics, metrics_handler},
    router,
    tracing::init_tracing,
};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside local development.
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;

    init_tracing(&config.env);
    let metrics = init_metrics()?;

    let state = ApiState::new(&config)?;
    let addr = config.bind_address()?;

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .merge(router::app(state, config.parsed_allowed_origins()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        env = ?config.env,
        site_url = %config.site_url,
        "Server listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = until_signal("ctrl_c", signal::ctrl_c());

    #[cfg(unix)]
    let terminate = until_signal("sigterm", async {
        signal::unix::signal(signal::unix::SignalKind::terminate())?
            .recv()
            .await;
        Ok::<_, std::io::Error>(())
    });

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

/// Resolve when `listener` reports its signal. A listener that could not be
/// installed never resolves, so it cannot trigger a shutdown by itself.
async fn until_signal<E, F>(name: &'static str, listener: F)
where
    E: std::fmt::Display,
    F: Future<Output = Result<(), E>>,
{
    if let Err(e) = listener.await {
        tracing::error!(signal = name, error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
