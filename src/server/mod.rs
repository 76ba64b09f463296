//! HTTP surface over the cached analysis service.

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::source::ElectoralSource;

pub mod error;
pub mod routes;
pub mod state;

use routes::{analysis_handler, invalidate_handler, profile_handler, trending_handler};
use state::AppState;

pub fn router<S>(state: Arc<AppState<S>>) -> Router
where
    S: ElectoralSource + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/analise-eleitoral", get(analysis_handler::<S>))
        .route("/api/candidato", get(profile_handler::<S>))
        .route("/api/cache/invalidate", post(invalidate_handler::<S>))
        .route("/api/trending/:uf", get(trending_handler::<S>))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server<S>(port: u16, state: AppState<S>) -> std::io::Result<()>
where
    S: ElectoralSource + Send + Sync + 'static,
{
    let app = router(Arc::new(state));

    let address = format!("0.0.0.0:{port}");
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
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
}
