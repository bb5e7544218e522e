//! WebSocket infrastructure: connection manager, upgrade handler, and
//! heartbeat task.

pub mod handler;
pub mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
