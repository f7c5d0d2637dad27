// Change-listener dispatch
pub mod bus;

// Entity model and authoritative world store
pub mod state;

// HTTP and WebSocket APIs
pub mod api;

// Connection registry, broadcast fan-out, per-connection sync loop
pub mod sync;

// TOML configuration
pub mod config;
