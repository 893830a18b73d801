//! # forum-realtime
//!
//! The session-authenticated real-time layer: every inbound connection is
//! forced through the same session resolution HTTP requests use, then
//! tracked in the process-wide [`connection::ConnectionRegistry`]. The
//! registry is constructed once at startup and passed explicitly to every
//! collaborator that broadcasts — there is no ambient global handle.

pub mod bridge;
pub mod connection;
pub mod events;
pub mod push;

pub use bridge::SessionBridge;
pub use connection::{ConnectionHandle, ConnectionId, ConnectionRegistry};
pub use events::ServerEvent;
pub use push::PushGateway;
