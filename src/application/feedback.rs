//! Final feedback for a graded submission.
//!
//! The feedback document is rendered with the content type's templates, then
//! escaped and handed to a small inline script that writes it into a fresh
//! iframe. The host page never parses the document itself.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::application::banding::final_comment;
use crate::application::error::ContentError;
use crate::domain::exercise::ExerciseRecord;
use crate::domain::payload::ExercisePayload;
use crate::presentation::escape::{encode_for_script_literal, script_safe_json};
use crate::presentation::views::{
    ExerciseTemplates, FeedbackFrameView, FeedbackView, render_feedback_frame,
};
use crate::util::random::random_id;

/// Grading result reported by the browser.
///
/// Serializes back to the fields it was read from, so the submission log
/// shows what the browser sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionEvent {
    /// Score in percent, 0 to 100, kept in its submitted number form.
    pub points: Number,
    #[serde(default, skip_serializing_if = "SubmissionFeedback::is_empty")]
    pub feedback: SubmissionFeedback,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Protocol data supplied by the host; logged next to the submission.
    #[serde(skip)]
    pub protocol_payload: Option<Value>,
}

impl SubmissionEvent {
    pub fn new(points: impl Into<Number>) -> Self {
        Self {
            points: points.into(),
            feedback: SubmissionFeedback::default(),
            extra: Map::new(),
            protocol_payload: None,
        }
    }

    pub fn score(&self) -> f64 {
        self.points.as_f64().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incorrect_answers: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubmissionFeedback {
    pub fn is_empty(&self) -> bool {
        self.answers.is_none()
            && self.correct_answers.is_none()
            && self.incorrect_answers.is_none()
            && self.extra.is_empty()
    }
}

/// Identifier settings for the feedback iframe element.
#[derive(Debug, Clone)]
pub struct FrameIds<'a> {
    pub prefix: &'a str,
    pub length: usize,
}

/// Drop one trailing slash.
pub fn normalize_server_address(address: &str) -> &str {
    address.strip_suffix('/').unwrap_or(address)
}

/// Build the wrapped feedback fragment for `event`.
///
/// `transform` receives a private copy of the payload, after answers are
/// attached and the final comment is chosen, together with the normalized
/// server address.
pub fn assemble<F>(
    record: &ExerciseRecord,
    event: &SubmissionEvent,
    server_address: &str,
    templates: &dyn ExerciseTemplates,
    ids: FrameIds<'_>,
    transform: F,
) -> Result<String, ContentError>
where
    F: FnOnce(&mut ExercisePayload, &str) -> Result<(), ContentError>,
{
    let mut payload = record.payload().clone();
    payload.answers = Some(
        event
            .feedback
            .answers
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new())),
    );

    let server_url = normalize_server_address(server_address);
    let score = event.score();
    let comment = final_comment(score, payload.finalcomment.as_ref());

    transform(&mut payload, server_url)?;

    let payload_json = script_safe_json(&payload.to_json()?);
    let server_url_json = script_safe_json(&serde_json::to_string(server_url)?);
    let document = templates.render_feedback(&FeedbackView {
        exercise: record.body_markup(),
        head_content: record.head_markup(),
        payload: &payload_json,
        score,
        correct_answers: event.feedback.correct_answers.unwrap_or(0),
        incorrect_answers: event.feedback.incorrect_answers.unwrap_or(0),
        server_url,
        server_url_json: &server_url_json,
        final_comment: &comment,
    })?;

    let iframe_content = encode_for_script_literal(&document);
    let iframe_id = random_id(ids.prefix, ids.length);

    Ok(render_feedback_frame(&FeedbackFrameView {
        iframe_content: &iframe_content,
        server_url,
        iframe_id: &iframe_id,
    })?)
}
