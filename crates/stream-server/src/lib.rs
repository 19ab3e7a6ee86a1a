//! Holo-Control Stream Server
//!
//! Runs the gesture pipeline against a hand source and streams the result
//! to renderer clients over WebSocket:
//! - **Source:** pluggable landmark acquisition ([`HandSource`])
//! - **Session:** the acquire → process → publish loop
//! - **Registry/Broadcaster:** per-client bounded queues and fan-out
//! - **Connection:** per-client reader/writer tasks
//! - **API:** health, configuration and stats endpoints

pub mod api;
pub mod broadcaster;
pub mod connection;
pub mod registry;
pub mod session;
pub mod source;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use holo_common::config::AppConfig;
use holo_common::error::{HoloError, HoloResult};

pub use api::AppState;
pub use broadcaster::Broadcaster;
pub use registry::{BroadcastReport, ClientId, ClientRegistry};
pub use session::{GestureSession, ProfileSelection, SessionHandle, SessionStatus, SessionSummary};
pub use source::{CapturedFrame, HandSource, ReplaySource};

/// How often the HTTP server checks the stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Serve `source` over HTTP/WebSocket until `stop_flag` is set.
pub async fn serve(
    config: AppConfig,
    source: Box<dyn HandSource>,
    stop_flag: Arc<AtomicBool>,
) -> HoloResult<SessionSummary> {
    config.validate()?;

    let registry = Arc::new(ClientRegistry::new(config.server.client_queue_capacity));
    let broadcaster = Broadcaster::new(registry.clone(), config.preview.clone());
    let (session, handle) = GestureSession::new(&config, source, broadcaster, stop_flag.clone())?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HoloError::stream(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!(
        addr = %addr,
        profile = %config.gestures.profile,
        fps_limit = config.server.fps_limit,
        "Stream server listening"
    );

    let state = AppState {
        config: Arc::new(config),
        registry,
        session: Arc::new(handle),
    };
    let app = api::router(state);

    let session_task = tokio::task::spawn_blocking(move || session.run());

    let shutdown_flag = stop_flag.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        while !shutdown_flag.load(Ordering::Relaxed) {
            tokio::time::sleep(STOP_POLL_INTERVAL).await;
        }
    });
    let served = server.await;

    // Whatever ended the server also ends the session.
    stop_flag.store(true, Ordering::SeqCst);
    let summary = session_task
        .await
        .map_err(|e| HoloError::stream(format!("Session task failed: {e}")))?;
    served.map_err(|e| HoloError::stream(format!("Server error: {e}")))?;

    tracing::info!("Stream server stopped");
    Ok(summary)
}
