// Connection registry, broadcast fan-out, and the per-connection sync loop

pub mod hub;
pub mod protocol;
pub mod session;

pub use hub::{Subscription, SyncHub};
pub use protocol::WireDiff;
