//! HTTP server implementation using Axum.

use crate::handlers::{
    handle_app_feed, handle_archive, handle_health, handle_icon, handle_push_feed,
};
use axum::{routing::get, Router};
use softcenter_core::SoftcenterPaths;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Installation layout (feeds, icons, archives)
    pub paths: SoftcenterPaths,
    /// Absolute archive storage root used for containment checks
    pub file_root: PathBuf,
}

impl AppState {
    pub fn new(paths: SoftcenterPaths) -> Self {
        let file_dir = paths.file_dir();
        let file_root = std::path::absolute(&file_dir).unwrap_or(file_dir);
        Self { paths, file_root }
    }
}

/// A running server and the means to stop it.
pub struct ServerHandle {
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            error!("Server task ended abnormally: {}", e);
        }
    }
}

/// Build the router for the softcenter endpoints.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Feeds are fetched cross-origin by router admin pages
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/softcenter/app.json.js", get(handle_app_feed))
        .route("/softcenter/push_message.json.js", get(handle_push_feed))
        .route("/softcenter/softcenter/res/*filename", get(handle_icon))
        .route("/:module/:filename", get(handle_archive))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns once the listener is bound; the actual address is useful when
/// port=0.
pub async fn start_server(
    paths: SoftcenterPaths,
    host: &str,
    port: u16,
) -> anyhow::Result<ServerHandle> {
    let state = Arc::new(AppState::new(paths));
    let app = build_router(state);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    // Bind to the address
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    // Spawn the server in the background
    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: actual_addr,
        shutdown: shutdown_tx,
        task,
    })
}
