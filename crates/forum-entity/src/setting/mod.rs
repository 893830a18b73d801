//! Forum setting entity.

pub mod model;

pub use model::ForumSetting;
