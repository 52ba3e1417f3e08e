//! Availability heartbeat towards the call router
//!
//! The router load-balances calls across endpoints; every endpoint pings it with its
//! BUSY/AVAILABLE status and the key a routed client must present.

mod client;
mod websocket;

pub use client::{
    HeartbeatClient, HeartbeatConfig, RouterConnector, RouterLink, DEFAULT_HEARTBEAT_INTERVAL,
};
pub use websocket::WebSocketRouter;
