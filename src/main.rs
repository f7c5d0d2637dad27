use anyhow::{Context, Result};
use axum::{response::Redirect, routing::get, Router};
use chorus::api::{
    create_entity_router, create_subscribe_router, create_world_router, EntityAppState,
    WorldAppState, WsAppState,
};
use chorus::config::{self, ChorusConfig};
use chorus::state::WorldStore;
use chorus::sync::SyncHub;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chorus=info".into()),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "chorus.toml".to_string());
    let config = match config::load_config(&config_path) {
        Ok(config) => {
            info!(path = %config_path, "loaded configuration");
            config
        }
        Err(e) => {
            info!(path = %config_path, error = %e, "no config file loaded, using defaults");
            ChorusConfig::default()
        }
    };

    let store = Arc::new(WorldStore::new());
    let hub = Arc::new(SyncHub::new(Arc::clone(&store), config.sync.channel_capacity));

    let entity_state = Arc::new(EntityAppState {
        store: Arc::clone(&store),
        max_body_bytes: config.api.max_body_bytes,
    });
    let world_state = Arc::new(WorldAppState {
        store: Arc::clone(&store),
    });
    let ws_state = Arc::new(WsAppState {
        hub: Arc::clone(&hub),
        greeting: config.server.greeting.clone(),
    });

    let app = Router::new()
        .merge(create_entity_router(entity_state))
        .merge(create_world_router(world_state))
        .merge(create_subscribe_router(ws_state))
        .route("/", get(|| async { Redirect::to("/static/index.html") }))
        .nest_service("/static", ServeDir::new(&config.server.static_dir))
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!(addr = %config.server.bind, "chorus listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
