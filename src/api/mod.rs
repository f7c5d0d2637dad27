// HTTP and WebSocket APIs

pub mod entity;
pub mod subscribe;
pub mod world;

pub use entity::{create_entity_router, EntityAppState};
pub use subscribe::{create_subscribe_router, WsAppState};
pub use world::{create_world_router, WorldAppState};
