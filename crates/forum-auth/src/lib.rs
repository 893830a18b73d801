//! # forum-auth
//!
//! Authentication plumbing for Powrum: startup secret provisioning and the
//! session layer. The [`session::SessionService`] is the single
//! session-resolution path — HTTP middleware and real-time handshakes both
//! go through it, so a socket inherits exactly the identity the HTTP layer
//! would assign.

pub mod secrets;
pub mod session;

pub use secrets::{PersistenceCapability, SecretProvisioner};
pub use session::SessionService;
