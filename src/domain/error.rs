use thiserror::Error;

/// Failures surfaced while turning an exercise definition into a record.
///
/// `Clone` so that one failed load can be handed to every request that was
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExerciseError {
    /// Missing, unreadable, or malformed name. Deliberately indistinguishable.
    #[error("exercise `{name}` not found")]
    NotFound { name: String },
    #[error("exercise definition could not be parsed: {message}")]
    Parse { message: String },
    #[error("exercise payload could not be generated: {message}")]
    PayloadMerge { message: String },
}

impl ExerciseError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn payload_merge(message: impl Into<String>) -> Self {
        Self::PayloadMerge {
            message: message.into(),
        }
    }
}
