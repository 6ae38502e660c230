use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("exercise discovery failed in `{}`: {message}", path.display())]
    Discovery { path: PathBuf, message: String },
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn discovery(path: &Path, message: impl Into<String>) -> Self {
        Self::Discovery {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
