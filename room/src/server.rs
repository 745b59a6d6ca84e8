//! HTTP edge: service info, health and the per-auction WebSocket route.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MAX_FRAME_BYTES;
use crate::error::RoomError;
use crate::registry::RoomRegistry;
use crate::session::serve_session;
use crate::traits::{SettlementStore, TimeProvider};

mod cors;

use cors::cors_middleware;

pub struct AppState<S: SettlementStore, C: TimeProvider> {
    pub registry: Arc<RoomRegistry<S, C>>,
}

impl<S: SettlementStore, C: TimeProvider> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

/// Status code used when an auction cannot be joined.
pub const fn rejection_status(err: &RoomError) -> StatusCode {
    match err {
        RoomError::AuctionNotFound(_) => StatusCode::NOT_FOUND,
        RoomError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RoomError::AuctionEnded => StatusCode::GONE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        let status = rejection_status(&self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn build_app<S: SettlementStore, C: TimeProvider>(registry: Arc<RoomRegistry<S, C>>) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health::<S, C>))
        .route("/auction/:id/websocket", get(auction_socket::<S, C>))
        .with_state(AppState { registry })
        .layer(middleware::from_fn(cors_middleware))
}

/// Bind `addr` and serve until `shutdown` is cancelled.
pub async fn serve<S: SettlementStore, C: TimeProvider>(
    addr: SocketAddr,
    registry: Arc<RoomRegistry<S, C>>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Auction room listening on {}", listener.local_addr()?);
    axum::serve(listener, build_app(registry))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("Auction room stopped");
    Ok(())
}

async fn service_info() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "realtime": "/auction/:id/websocket",
        "status": "operational",
    }))
}

async fn health<S: SettlementStore, C: TimeProvider>(
    State(state): State<AppState<S, C>>,
) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "liveRooms": state.registry.live_rooms(),
    }))
}

/// The auction is opened before the upgrade is inspected, so an unknown or
/// settled auction is refused with a plain HTTP status.
async fn auction_socket<S: SettlementStore, C: TimeProvider>(
    Path(auction_id): Path<String>,
    State(state): State<AppState<S, C>>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    let handle = match state.registry.open(&auction_id).await {
        Ok(handle) => handle,
        Err(e) => {
            if matches!(e, RoomError::StoreUnavailable(_)) {
                warn!("Cannot open auction {}: {}", auction_id, e);
            } else {
                debug!("Refusing connection to auction {}: {}", auction_id, e);
            }
            return e.into_response();
        }
    };

    let Some(ws) = ws else {
        return (StatusCode::BAD_REQUEST, "Expected WebSocket").into_response();
    };
    ws.max_message_size(MAX_FRAME_BYTES)
        .on_upgrade(move |socket| serve_session(socket, handle))
}
