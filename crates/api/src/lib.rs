//! Encodrop UI bridge library.
//!
//! Exposes the building blocks of the bridge (config, state, error handling,
//! routes, WebSocket infrastructure) so integration tests and the binary
//! entrypoint can both access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
