//! HTTP server: routes, middleware, listener and graceful shutdown

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::handlers::{health, jenjang, kategori, modul};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .merge(jenjang_routes())
        .merge(modul_routes())
        .merge(kategori_routes())
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn jenjang_routes() -> Router<AppState> {
    use axum::routing::delete;

    Router::new()
        .route("/jenjang", get(jenjang::list).post(jenjang::create))
        .route("/jenjang/:id", delete(jenjang::delete))
}

fn modul_routes() -> Router<AppState> {
    Router::new()
        .route("/modul", get(modul::list).post(modul::create))
        .route("/modul/jenjang/:id", get(modul::list_by_jenjang))
        .route("/modul/:id", get(modul::get).delete(modul::delete))
}

fn kategori_routes() -> Router<AppState> {
    Router::new().route("/kategori", get(kategori::list))
}

/// Serve until `shutdown` resolves, then close the pool
pub async fn serve<F>(addr: SocketAddr, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let db = state.db.clone();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Server listening");

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await;

    db.close().await;
    result
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Received shutdown signal");
}
