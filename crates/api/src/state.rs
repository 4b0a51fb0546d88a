use std::sync::Arc;

use encodrop_pipeline::{EncoderLauncher, Orchestrator};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Bridge configuration.
    pub config: Arc<ServerConfig>,
    /// Job orchestrator; owns the registry and the status dispatcher.
    pub orchestrator: Arc<Orchestrator<EncoderLauncher>>,
    /// WebSocket connection manager (UI clients).
    pub ws_manager: Arc<WsManager>,
}
