//! Reading exercise definitions from a content package.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, instrument};

use crate::domain::error::ExerciseError;
use crate::domain::exercise::{ExerciseRecord, ParsedExercise};
use crate::domain::names::ExerciseName;
use crate::domain::package::ContentPackage;
use crate::domain::payload::{ExercisePayload, merge_payload};

/// Parser for one content type's exercise definition format.
pub trait ExerciseParser: Send + Sync {
    /// Parse the definition text into a content tree and optional head tree.
    fn parse(&self, namespace: &str, xml: &str) -> Result<ParsedExercise, ExerciseError>;

    /// Payload data derived from the parsed tree, merged over the authored
    /// JSON by [`merge_payload`].
    fn generated_payload(
        &self,
        namespace: &str,
        parsed: &ParsedExercise,
    ) -> Result<Map<String, Value>, ExerciseError>;
}

/// Produces a fresh [`ExerciseRecord`] for a package and exercise name.
#[async_trait]
pub trait LoadExercise: Send + Sync {
    async fn load(
        &self,
        package: &ContentPackage,
        name: &ExerciseName,
    ) -> Result<ExerciseRecord, ExerciseError>;
}

/// Filesystem-backed loader: `<package>/<exercises_dir>/<name>.xml` plus the
/// optional sibling `<name>.json`.
pub struct ExerciseLoader {
    parser: Arc<dyn ExerciseParser>,
    namespace: String,
    exercises_dir: String,
}

impl ExerciseLoader {
    pub fn new(
        parser: Arc<dyn ExerciseParser>,
        namespace: impl Into<String>,
        exercises_dir: impl Into<String>,
    ) -> Self {
        Self {
            parser,
            namespace: namespace.into(),
            exercises_dir: exercises_dir.into(),
        }
    }

    fn base_path(&self, package: &ContentPackage, name: &ExerciseName) -> PathBuf {
        package
            .dir()
            .join(&self.exercises_dir)
            .join(name.relative_path())
    }

    async fn read_authored_payload(&self, path: &Path) -> Result<Value, ExerciseError> {
        match fs::read_to_string(path).await {
            Ok(text) => serde_json::from_str(&text).map_err(|err| {
                ExerciseError::payload_merge(format!("authored payload is not valid JSON: {err}"))
            }),
            Err(err) => {
                debug!(
                    target = "application::loader",
                    path = %path.display(),
                    error = %err,
                    "No authored payload; using an empty mapping"
                );
                Ok(Value::Object(Map::new()))
            }
        }
    }
}

#[async_trait]
impl LoadExercise for ExerciseLoader {
    #[instrument(
        level = "debug",
        skip(self, package),
        fields(package = package.id(), namespace = %self.namespace)
    )]
    async fn load(
        &self,
        package: &ContentPackage,
        name: &ExerciseName,
    ) -> Result<ExerciseRecord, ExerciseError> {
        let base = self.base_path(package, name);
        let xml_path = with_suffix(&base, "xml");

        let xml = fs::read_to_string(&xml_path).await.map_err(|err| {
            debug!(
                target = "application::loader",
                path = %xml_path.display(),
                error = %err,
                "Exercise definition unreadable"
            );
            ExerciseError::not_found(name.as_str())
        })?;

        let parsed = self.parser.parse(&self.namespace, &xml)?;

        let authored = self.read_authored_payload(&with_suffix(&base, "json")).await?;
        let generated = self.parser.generated_payload(&self.namespace, &parsed)?;
        let payload = ExercisePayload::from_map(merge_payload(authored, generated)?)?;

        let body = parsed.content.html_without_root();
        let head = parsed
            .head
            .as_ref()
            .map(|head| head.html_without_root())
            .unwrap_or_default();

        Ok(ExerciseRecord::new(body, head, payload))
    }
}

/// Append `.ext` without touching dots already present in the final component.
fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut raw = OsString::from(base.as_os_str());
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}
