use once_cell::sync::OnceCell;

use super::payload::ExercisePayload;

/// Serialized markup produced by an exercise parser, optionally wrapped in a
/// synthetic root element the parser introduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupTree {
    root: Option<String>,
    inner: String,
}

impl MarkupTree {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            root: None,
            inner: markup.into(),
        }
    }

    pub fn with_root(root: impl Into<String>, inner: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
            inner: inner.into(),
        }
    }

    /// Full serialization, including the synthetic root if there is one.
    pub fn html(&self) -> String {
        match &self.root {
            Some(root) => format!("<{root}>{}</{root}>", self.inner),
            None => self.inner.clone(),
        }
    }

    pub fn html_without_root(&self) -> &str {
        &self.inner
    }
}

/// Output of the external exercise parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExercise {
    pub content: MarkupTree,
    pub head: Option<MarkupTree>,
}

/// Template-rendered head/body fragments reused on every view request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFragments {
    pub head: String,
    pub body: String,
}

/// Fully loaded exercise. Only constructed once every loading step succeeded,
/// and never mutated afterwards apart from the one-time render cache.
#[derive(Debug)]
pub struct ExerciseRecord {
    body_markup: String,
    head_markup: String,
    payload: ExercisePayload,
    rendered: OnceCell<RenderedFragments>,
}

impl ExerciseRecord {
    pub fn new(
        body_markup: impl Into<String>,
        head_markup: impl Into<String>,
        payload: ExercisePayload,
    ) -> Self {
        Self {
            body_markup: body_markup.into(),
            head_markup: head_markup.into(),
            payload,
            rendered: OnceCell::new(),
        }
    }

    pub fn body_markup(&self) -> &str {
        &self.body_markup
    }

    pub fn head_markup(&self) -> &str {
        &self.head_markup
    }

    /// Shared payload. Callers that need to modify it clone first.
    pub fn payload(&self) -> &ExercisePayload {
        &self.payload
    }

    pub fn rendered(&self) -> Option<&RenderedFragments> {
        self.rendered.get()
    }

    /// Return the cached fragments, running `render` only if no render pass
    /// has completed yet. A failed render leaves the cache empty.
    pub fn rendered_or_try_init<E, F>(&self, render: F) -> Result<&RenderedFragments, E>
    where
        F: FnOnce(&Self) -> Result<RenderedFragments, E>,
    {
        self.rendered.get_or_try_init(|| render(self))
    }
}
