//! Append-only submission logs, one file per exercise.
//!
//! Layout: `<root>/<namespace>/<package>/<exercise>.log`. Each line holds an
//! RFC 3339 timestamp, the submission payload and the protocol payload, both
//! as single-line JSON.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::task::JoinHandle;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};

use crate::domain::names::ExerciseName;

use super::error::InfraError;

/// One logged submission.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub namespace: String,
    pub package_id: String,
    pub exercise: ExerciseName,
    pub submission: Value,
    pub protocol: Value,
}

#[derive(Debug)]
pub struct EventLog {
    root: PathBuf,
}

impl EventLog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(
        &self,
        namespace: &str,
        package_id: &str,
        exercise: &ExerciseName,
    ) -> Result<PathBuf, InfraError> {
        let mut path = self.root.join(path_segment(namespace)?);
        path.push(path_segment(package_id)?);
        path.push(format!("{exercise}.log"));
        Ok(path)
    }

    /// Append one line for `record`, creating parent directories as needed.
    pub async fn append(&self, record: &EventRecord) -> Result<(), InfraError> {
        let path = self.path_for(&record.namespace, &record.package_id, &record.exercise)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let line = format_line(
            OffsetDateTime::now_utc(),
            &record.submission,
            &record.protocol,
        )?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(
            target = "infra::event_log",
            path = %path.display(),
            "Submission logged"
        );
        Ok(())
    }

    /// Append in the background. Failures are logged and otherwise ignored.
    /// Must be called from within a Tokio runtime.
    pub fn spawn_append(self: &Arc<Self>, record: EventRecord) -> JoinHandle<()> {
        let log = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = log.append(&record).await {
                warn!(
                    target = "infra::event_log",
                    package = %record.package_id,
                    exercise = %record.exercise,
                    error = %err,
                    "Failed to append submission log"
                );
            }
        })
    }
}

/// Render one log line, newline included.
pub fn format_line(
    timestamp: OffsetDateTime,
    submission: &Value,
    protocol: &Value,
) -> Result<String, InfraError> {
    let timestamp = timestamp
        .format(&Rfc3339)
        .map_err(|err| InfraError::Io(io::Error::other(err)))?;
    Ok(format!("{timestamp} {submission} {protocol}\n"))
}

fn path_segment(raw: &str) -> Result<&str, InfraError> {
    if raw.is_empty() || raw == "." || raw == ".." || raw.contains(['/', '\\', '\0']) {
        return Err(InfraError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("`{raw}` is not a valid log path segment"),
        )));
    }
    Ok(raw)
}
