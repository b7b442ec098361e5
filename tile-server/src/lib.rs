//! Tile World Server Library
//!
//! Authoritative server for a shared 2D tile world:
//! - Background world generation behind a readiness gate
//! - Session coordinator owning the world grid and player registry
//! - Per-client chunk streaming and edit relay over WebSocket (axum)
//! - JSON wire protocol, env-based config, lock-free metrics

pub mod api; // WebSocket + health/metrics routes
pub mod async_generation; // Off-thread generation and WorldGate
pub mod config;
pub mod coordinator; // Single authoritative owner of world + registry
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod session; // Per-connection state and teardown

pub use api::{build_router, AppState};
pub use async_generation::{spawn_generation, WorldGate};
pub use config::ServerConfig;
pub use coordinator::{SessionCoordinator, SessionHandle};
pub use error::ServerError;
pub use metrics::ServerMetrics;
pub use protocol::{ClientMessage, Frame, PlayerId, ServerMessage};
pub use session::ClientConnection;
