//! Head and body fragments for the initial page of an exercise.

use crate::application::error::ContentError;
use crate::domain::exercise::{ExerciseRecord, RenderedFragments};
use crate::presentation::escape::script_safe_json;
use crate::presentation::views::{ExerciseBodyView, ExerciseHeadView, ExerciseTemplates};

/// Fragments the host appends to its page head and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializedContent {
    pub head_content: String,
    pub body_content: String,
}

impl From<RenderedFragments> for InitializedContent {
    fn from(fragments: RenderedFragments) -> Self {
        Self {
            head_content: fragments.head,
            body_content: fragments.body,
        }
    }
}

/// Render the cached part of an exercise page.
pub fn render_fragments(
    record: &ExerciseRecord,
    templates: &dyn ExerciseTemplates,
) -> Result<RenderedFragments, ContentError> {
    let payload = script_safe_json(&record.payload().to_json()?);

    let head = templates.render_head(&ExerciseHeadView {
        head_content: record.head_markup(),
        payload: &payload,
    })?;
    let body = templates.render_body(&ExerciseBodyView {
        exercise: record.body_markup(),
    })?;

    Ok(RenderedFragments { head, body })
}
