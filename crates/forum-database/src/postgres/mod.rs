//! PostgreSQL repository implementations of the store traits.

pub mod account;
pub mod ephemeral;
pub mod session;
pub mod setting;

pub use account::PgAccountStore;
pub use ephemeral::PgEphemeralStore;
pub use session::PgSessionStore;
pub use setting::PgSettingStore;
