use std::fmt::Display;

use thiserror::Error;

use crate::domain::error::ExerciseError;
use crate::presentation::absolutize::AbsolutizeError;
use crate::presentation::views::TemplateRenderError;

/// Failures while turning a loaded exercise into HTML for the host.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
    #[error("payload could not be serialized: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("payload transform failed: {message}")]
    Transform { message: String },
}

impl ContentError {
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    /// Renderer that failed, for template errors.
    pub fn render_origin(&self) -> Option<&'static str> {
        match self {
            Self::Template(err) => Some(err.origin()),
            _ => None,
        }
    }
}

impl From<AbsolutizeError> for ContentError {
    fn from(err: AbsolutizeError) -> Self {
        Self::transform(err.to_string())
    }
}

/// Error fragment shown in place of exercise content. The message is
/// text-escaped.
pub fn render_error(error: &dyn Display) -> String {
    format!(
        "<div class=\"alert-danger\">\n{}\n</div>",
        ammonia::clean_text(&error.to_string())
    )
}
