//! Entry points used by a content type.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{instrument, warn};

use crate::application::content::{InitializedContent, render_fragments};
use crate::application::error::{ContentError, render_error};
use crate::application::feedback::{FrameIds, SubmissionEvent, assemble};
use crate::application::loader::{ExerciseLoader, ExerciseParser, LoadExercise};
use crate::application::packages::PackageRegistry;
use crate::cache::ExerciseCache;
use crate::config::ContentSettings;
use crate::domain::names::ExerciseName;
use crate::domain::package::Catalog;
use crate::domain::payload::ExercisePayload;
use crate::infra::error::InfraError;
use crate::infra::event_log::{EventLog, EventRecord};
use crate::presentation::views::ExerciseTemplates;

/// Exercise pages, feedback and submission logs for one content type.
pub struct ExerciseService {
    settings: ContentSettings,
    registry: Arc<PackageRegistry>,
    cache: ExerciseCache,
    templates: Arc<dyn ExerciseTemplates>,
    event_log: Arc<EventLog>,
}

impl ExerciseService {
    /// Service reading exercises from disk with `parser`.
    pub fn new(
        settings: ContentSettings,
        parser: Arc<dyn ExerciseParser>,
        templates: Arc<dyn ExerciseTemplates>,
    ) -> Self {
        let loader = ExerciseLoader::new(
            parser,
            settings.content_type_namespace.clone(),
            settings.exercises_dir.clone(),
        );
        Self::with_loader(settings, Arc::new(loader), templates)
    }

    pub fn with_loader(
        settings: ContentSettings,
        loader: Arc<dyn LoadExercise>,
        templates: Arc<dyn ExerciseTemplates>,
    ) -> Self {
        let registry = Arc::new(PackageRegistry::with_exercises_dir(
            settings.exercises_dir.clone(),
        ));
        let cache = ExerciseCache::new(loader, Arc::clone(&registry));
        let event_log = Arc::new(EventLog::new(settings.log_directory.clone()));
        Self {
            settings,
            registry,
            cache,
            templates,
            event_log,
        }
    }

    pub fn settings(&self) -> &ContentSettings {
        &self.settings
    }

    pub fn registry(&self) -> &PackageRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ExerciseCache {
        &self.cache
    }

    pub fn register_content_package(
        &self,
        package_id: &str,
        dir: impl Into<PathBuf>,
    ) -> Result<Catalog, InfraError> {
        self.registry.register_content_package(package_id, dir)
    }

    /// Head and body fragments for an exercise page. Rendered once per
    /// exercise; failures yield an error fragment in the body.
    #[instrument(level = "debug", skip(self))]
    pub async fn initialize(&self, package_id: &str, exercise: &str) -> InitializedContent {
        let templates = Arc::clone(&self.templates);
        let rendered = self
            .cache
            .get_or_load_and_render::<ContentError, _>(package_id, exercise, move |record| {
                render_fragments(record, templates.as_ref())
            })
            .await;

        match rendered {
            Ok(fragments) => fragments.into(),
            Err(err) => {
                warn!(
                    target = "application::service",
                    package = package_id,
                    exercise,
                    error = %err,
                    render_origin = err.render_origin(),
                    "Exercise content unavailable"
                );
                InitializedContent {
                    head_content: String::new(),
                    body_content: render_error(&err),
                }
            }
        }
    }

    /// Wrapped feedback fragment for a graded submission, or an error
    /// fragment.
    ///
    /// `server_address` is the base address of this request; without one the
    /// configured address is used.
    #[instrument(level = "debug", skip(self, event, transform))]
    pub async fn build_final_feedback<F>(
        &self,
        package_id: &str,
        exercise: &str,
        event: &SubmissionEvent,
        server_address: Option<&str>,
        transform: F,
    ) -> String
    where
        F: FnOnce(&mut ExercisePayload, &str) -> Result<(), ContentError> + Send,
    {
        let feedback = match self.cache.get_or_load(package_id, exercise).await {
            Ok(record) => assemble(
                &record,
                event,
                server_address.unwrap_or(&self.settings.server_address),
                self.templates.as_ref(),
                FrameIds {
                    prefix: &self.settings.feedback_id_prefix,
                    length: self.settings.feedback_id_length.get(),
                },
                transform,
            ),
            Err(err) => Err(err.into()),
        };

        feedback.unwrap_or_else(|err| {
            warn!(
                target = "application::service",
                package = package_id,
                exercise,
                error = %err,
                render_origin = err.render_origin(),
                "Feedback could not be built"
            );
            render_error(&err)
        })
    }

    /// Append the submission to the exercise's log in the background.
    /// Returns `None` when nothing was scheduled.
    pub fn record_event(
        &self,
        package_id: &str,
        exercise: &str,
        event: &SubmissionEvent,
    ) -> Option<JoinHandle<()>> {
        let Ok(name) = ExerciseName::parse(exercise) else {
            warn!(
                target = "application::service",
                package = package_id,
                exercise,
                "Not logging a submission for an invalid exercise name"
            );
            return None;
        };

        let submission = match serde_json::to_value(event) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    target = "application::service",
                    error = %err,
                    "Submission could not be serialized for logging"
                );
                return None;
            }
        };

        let record = EventRecord {
            namespace: self.settings.content_type_namespace.clone(),
            package_id: package_id.to_string(),
            exercise: name,
            submission,
            protocol: event
                .protocol_payload
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
        };
        Some(self.event_log.spawn_append(record))
    }
}
