//! # forum-core
//!
//! Core crate for the Powrum forum server. Contains configuration schemas,
//! typed identifiers, the resolved-identity type, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other Powrum crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
