//! HTTP and WebSocket routes.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use holo_common::config::AppConfig;
use holo_gesture_core::FsmStats;
use serde_json::{json, Value};

use crate::connection;
use crate::registry::ClientRegistry;
use crate::session::{ProfileSelection, SessionHandle};

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<ClientRegistry>,
    pub session: Arc<SessionHandle>,
}

impl AppState {
    fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.config.server.idle_timeout_secs)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(current_config))
        .route("/config/profile/:name", post(select_profile))
        .route("/stats", get(stats))
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "clients": state.registry.len(),
        "mode": state.session.status().mode,
    }))
}

pub async fn current_config(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "gesture_profile": state.session.profile().name,
        "available_profiles": state.config.gestures.profile_names(),
        "kalman_enabled": state.config.kalman.enabled,
    }))
}

pub async fn select_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> (StatusCode, Json<Value>) {
    let Some(profile) = state.config.gestures.profiles.get(&name) else {
        tracing::warn!(profile = %name, "Rejected unknown gesture profile");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "error", "message": "Invalid profile"})),
        );
    };

    state.session.select_profile(ProfileSelection {
        name: name.clone(),
        profile: *profile,
    });
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "profile": name})),
    )
}

pub async fn stats(State(state): State<AppState>) -> Json<FsmStats> {
    Json(state.session.status().stats)
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let idle_timeout = state.idle_timeout();
    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| connection::handle_socket(socket, registry, idle_timeout))
}
