//! Domain layer types and invariants.

pub mod error;
pub mod exercise;
pub mod names;
pub mod package;
pub mod payload;
