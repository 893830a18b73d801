//! Session layer: signed credential codec, store access, and resolution.

pub mod service;
pub mod token;

pub use service::SessionService;
pub use token::{SessionClaims, SessionTokenCodec};
