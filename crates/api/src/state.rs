use std::sync::Arc;

use crate::config::ServerConfig;
use crate::reinvoke::Reinvoker;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already
/// `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: gala_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// The pipeline orchestrator driving upload jobs.
    pub orchestrator: Arc<gala_pipeline::Orchestrator>,
    /// Job event bus for publishing status changes.
    pub event_bus: Arc<gala_events::JobEventBus>,
    /// Continuation dispatch capability for self re-invocations.
    pub reinvoker: Arc<Reinvoker>,
}
