//! Exercise identifiers.
//!
//! Exercise files may be nested below the `exercises` directory of a content
//! package. The externally visible identifier flattens that nesting by joining
//! the path components with dashes, so `exercises/week1/colors.xml` becomes
//! `week1-colors`. File names therefore must not contain dashes themselves;
//! discovery warns when one does.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use super::error::ExerciseError;

/// Separator used to encode directory nesting inside an exercise name.
pub const NESTING_SEPARATOR: char = '-';

/// Validated, dash-encoded exercise identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExerciseName(String);

impl ExerciseName {
    /// Validate an identifier received from a request.
    ///
    /// Anything that could not have been produced by discovery (empty
    /// segments, `.`/`..`, embedded path separators) is reported as not found.
    pub fn parse(raw: &str) -> Result<Self, ExerciseError> {
        let valid = !raw.is_empty()
            && !raw.contains(['/', '\\', '\0'])
            && raw
                .split(NESTING_SEPARATOR)
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(ExerciseError::not_found(raw))
        }
    }

    /// Encode a path relative to the exercises directory, dropping the file
    /// extension of the last component. Returns `None` for non UTF-8 paths or
    /// paths that escape the directory.
    pub fn from_relative_path(path: &Path) -> Option<Self> {
        let stem = path.with_extension("");
        let mut segments = Vec::new();
        for component in stem.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }

        if segments.is_empty() {
            return None;
        }

        Some(Self(segments.join(&NESTING_SEPARATOR.to_string())))
    }

    /// Decode the identifier back into a path relative to the exercises
    /// directory, without any file extension.
    pub fn relative_path(&self) -> PathBuf {
        self.0.split(NESTING_SEPARATOR).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExerciseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExerciseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_path_is_encoded_with_dashes() {
        let name = ExerciseName::from_relative_path(Path::new("a/b.xml")).expect("name");
        assert_eq!(name.as_str(), "a-b");
    }

    #[test]
    fn relative_path_decodes_dashes_into_components() {
        let name = ExerciseName::parse("week1-colors").expect("valid name");
        assert_eq!(name.relative_path(), Path::new("week1").join("colors"));
    }

    #[test]
    fn dotted_file_names_keep_their_inner_dots() {
        let name = ExerciseName::from_relative_path(Path::new("v1.2/intro.xml")).expect("name");
        assert_eq!(name.as_str(), "v1.2-intro");
        assert_eq!(name.relative_path(), Path::new("v1.2").join("intro"));
    }

    #[test]
    fn traversal_attempts_are_not_found() {
        for raw in ["", "..-secret", "a--b", "a/b", "a\\b", "-a", "a-", ".-x"] {
            let err = ExerciseName::parse(raw).expect_err(raw);
            assert!(matches!(err, ExerciseError::NotFound { .. }), "{raw}");
        }
    }

    #[test]
    fn escaping_relative_paths_are_rejected() {
        assert!(ExerciseName::from_relative_path(Path::new("../x.xml")).is_none());
        assert!(ExerciseName::from_relative_path(Path::new("/abs/x.xml")).is_none());
    }
}
