//! Exercise discovery inside a content package.

use std::ffi::OsStr;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::names::{ExerciseName, NESTING_SEPARATOR};
use crate::domain::package::Catalog;

use super::error::InfraError;

const DEFINITION_EXTENSION: &str = "xml";

/// Walk `exercises_dir` recursively and catalog every exercise definition.
///
/// Entries are visited sorted by file name so catalog order is stable across
/// platforms.
pub fn discover_exercises(exercises_dir: &Path) -> Result<Catalog, InfraError> {
    if !exercises_dir.is_dir() {
        return Err(InfraError::discovery(
            exercises_dir,
            "exercises directory does not exist",
        ));
    }

    let mut catalog = Catalog::default();
    for entry in WalkDir::new(exercises_dir).sort_by_file_name() {
        let entry = entry.map_err(|err| InfraError::discovery(exercises_dir, err.to_string()))?;
        if !entry.file_type().is_file()
            || entry.path().extension() != Some(OsStr::new(DEFINITION_EXTENSION))
        {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(exercises_dir) else {
            continue;
        };

        if relative.to_string_lossy().contains(NESTING_SEPARATOR) {
            warn!(
                target = "infra::discovery",
                path = %relative.display(),
                "Exercise path contains `-`; its identifier will not resolve back to this file"
            );
        }

        match ExerciseName::from_relative_path(relative) {
            Some(name) => {
                debug!(target = "infra::discovery", exercise = %name, "Exercise discovered");
                let label = name.to_string();
                if catalog.push(name) {
                    warn!(
                        target = "infra::discovery",
                        exercise = %label,
                        path = %relative.display(),
                        "Exercise identifier already cataloged; replacing the earlier file"
                    );
                }
            }
            None => warn!(
                target = "infra::discovery",
                path = %relative.display(),
                "Skipping exercise with a non UTF-8 path"
            ),
        }
    }

    Ok(catalog)
}
