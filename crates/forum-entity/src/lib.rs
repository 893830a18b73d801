//! # forum-entity
//!
//! Domain entity models for Powrum. Every struct in this crate represents a
//! stored document or a domain value object. Entities are
//! persistence-agnostic: the database crate maps them to and from rows, and
//! the in-memory store holds them directly.

pub mod account;
pub mod ephemeral;
pub mod session;
pub mod setting;
