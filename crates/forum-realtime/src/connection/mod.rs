//! Live connection tracking.

pub mod handle;
pub mod registry;

pub use handle::{ConnectionHandle, ConnectionId, ConnectionPhase};
pub use registry::ConnectionRegistry;
