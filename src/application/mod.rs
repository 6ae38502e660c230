//! Application services: loading, banding, feedback and page content.

pub mod banding;
pub mod content;
pub mod error;
pub mod feedback;
pub mod loader;
pub mod packages;
pub mod service;
