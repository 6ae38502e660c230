//! Infrastructure adapters: filesystem discovery, submission logs, telemetry.

pub mod discovery;
pub mod error;
pub mod event_log;
pub mod telemetry;
