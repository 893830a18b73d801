//! # forum-api
//!
//! The narrow HTTP surface of the Powrum core: health, presence queries,
//! realtime stats, and the WebSocket upgrade that binds sockets to HTTP
//! session identity. Forum content routes (threads, posts, moderation) live
//! in their own layer and are not part of this crate.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
