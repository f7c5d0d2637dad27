use crate::state::{World, WorldStore};
use axum::{extract::State, response::Json, routing::get, Router};
use std::sync::Arc;
use tracing::info;

/// Shared state for the world API.
#[derive(Clone)]
pub struct WorldAppState {
    pub store: Arc<WorldStore>,
}

/// Create the world router. Both endpoints accept GET and POST.
pub fn create_world_router(state: Arc<WorldAppState>) -> Router {
    Router::new()
        .route("/world", get(read_world).post(read_world))
        .route("/clear", get(clear_world).post(clear_world))
        .with_state(state)
}

/// GET|POST /world - full snapshot.
async fn read_world(State(state): State<Arc<WorldAppState>>) -> Json<World> {
    Json(state.store.snapshot())
}

/// GET|POST /clear - empty the world and return the (empty) snapshot.
async fn clear_world(State(state): State<Arc<WorldAppState>>) -> Json<World> {
    info!(entities = state.store.len(), "clearing world");
    state.store.clear();
    Json(state.store.snapshot())
}
