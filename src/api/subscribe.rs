use crate::sync::{session, SyncHub};
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

/// Shared state for the subscribe endpoint.
#[derive(Clone)]
pub struct WsAppState {
    pub hub: Arc<SyncHub>,
    /// Plaintext greeting sent as the first frame of every session.
    pub greeting: String,
}

/// GET /subscribe - upgrade and hand the socket to the sync loop.
pub async fn subscribe_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WsAppState>>,
) -> Response {
    info!("subscribe upgrade request received");
    ws.on_upgrade(move |socket| {
        session::run(socket, Arc::clone(&state.hub), state.greeting.clone())
    })
}

/// Create the subscribe router.
pub fn create_subscribe_router(state: Arc<WsAppState>) -> Router {
    Router::new()
        .route("/subscribe", get(subscribe_handler))
        .with_state(state)
}
