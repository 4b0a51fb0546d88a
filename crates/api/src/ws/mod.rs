//! WebSocket infrastructure for pushing job status to UI clients.
//!
//! Provides connection management, heartbeat monitoring, the status
//! forwarder, and the HTTP upgrade handler used by Axum routes.

mod forwarder;
mod handler;
mod heartbeat;
pub mod manager;

pub use forwarder::start_status_forwarder;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
