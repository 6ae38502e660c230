use askama::{Error as AskamaError, Template};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }

    /// Module path of the renderer that failed.
    pub fn origin(&self) -> &'static str {
        self.source
    }
}

pub fn render_template<T: Template>(
    template: T,
    source: &'static str,
) -> Result<String, TemplateRenderError> {
    template
        .render()
        .map_err(|err| TemplateRenderError::new(source, "Template rendering failed", err))
}

/// Data for `exercise_head.html`.
pub struct ExerciseHeadView<'a> {
    pub head_content: &'a str,
    /// Serialized payload, already safe inside a `<script>` element.
    pub payload: &'a str,
}

/// Data for `exercise_body.html`.
pub struct ExerciseBodyView<'a> {
    pub exercise: &'a str,
}

/// Data for `feedback.html`, the document shown inside the feedback iframe.
pub struct FeedbackView<'a> {
    pub exercise: &'a str,
    pub head_content: &'a str,
    pub payload: &'a str,
    pub score: f64,
    pub correct_answers: u64,
    pub incorrect_answers: u64,
    /// For HTML contexts; askama escapes it.
    pub server_url: &'a str,
    /// The server address as a JSON string literal, safe inside `<script>`.
    pub server_url_json: &'a str,
    pub final_comment: &'a str,
}

/// Data for `feedback-iframe.html`.
pub struct FeedbackFrameView<'a> {
    /// Feedback document escaped for a script string literal.
    pub iframe_content: &'a str,
    pub server_url: &'a str,
    pub iframe_id: &'a str,
}

#[derive(Template)]
#[template(path = "exercise_head.html")]
pub struct ExerciseHeadTemplate<'a> {
    pub view: &'a ExerciseHeadView<'a>,
}

#[derive(Template)]
#[template(path = "exercise_body.html")]
pub struct ExerciseBodyTemplate<'a> {
    pub view: &'a ExerciseBodyView<'a>,
}

#[derive(Template)]
#[template(path = "feedback.html")]
pub struct FeedbackTemplate<'a> {
    pub view: &'a FeedbackView<'a>,
}

#[derive(Template)]
#[template(path = "feedback-iframe.html")]
pub struct FeedbackFrameTemplate<'a> {
    pub view: &'a FeedbackFrameView<'a>,
}

/// Templates owned by a content type. Each content type may ship its own
/// markup around the shared exercise data.
pub trait ExerciseTemplates: Send + Sync {
    fn render_head(&self, view: &ExerciseHeadView<'_>) -> Result<String, TemplateRenderError>;

    fn render_body(&self, view: &ExerciseBodyView<'_>) -> Result<String, TemplateRenderError>;

    fn render_feedback(&self, view: &FeedbackView<'_>) -> Result<String, TemplateRenderError>;
}

/// The bundled templates in `templates/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTemplates;

impl ExerciseTemplates for DefaultTemplates {
    fn render_head(&self, view: &ExerciseHeadView<'_>) -> Result<String, TemplateRenderError> {
        render_template(
            ExerciseHeadTemplate { view },
            "presentation::views::render_head",
        )
    }

    fn render_body(&self, view: &ExerciseBodyView<'_>) -> Result<String, TemplateRenderError> {
        render_template(
            ExerciseBodyTemplate { view },
            "presentation::views::render_body",
        )
    }

    fn render_feedback(&self, view: &FeedbackView<'_>) -> Result<String, TemplateRenderError> {
        render_template(
            FeedbackTemplate { view },
            "presentation::views::render_feedback",
        )
    }
}

/// The iframe wrapper is shared by every content type.
pub fn render_feedback_frame(view: &FeedbackFrameView<'_>) -> Result<String, TemplateRenderError> {
    render_template(
        FeedbackFrameTemplate { view },
        "presentation::views::render_feedback_frame",
    )
}
