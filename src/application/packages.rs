//! Content packages known to this process.

use std::path::PathBuf;

use dashmap::DashMap;
use tracing::info;

use crate::domain::package::{Catalog, ContentPackage};
use crate::infra::discovery::discover_exercises;
use crate::infra::error::InfraError;

const DEFAULT_EXERCISES_DIR: &str = "exercises";

/// Registered content packages and their exercise catalogs, keyed by id.
#[derive(Debug)]
pub struct PackageRegistry {
    exercises_dir: String,
    packages: DashMap<String, ContentPackage>,
    catalogs: DashMap<String, Catalog>,
}

impl Default for PackageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::with_exercises_dir(DEFAULT_EXERCISES_DIR)
    }

    pub fn with_exercises_dir(exercises_dir: impl Into<String>) -> Self {
        Self {
            exercises_dir: exercises_dir.into(),
            packages: DashMap::new(),
            catalogs: DashMap::new(),
        }
    }

    /// Discover the exercises of the package at `dir` and register it under
    /// `id`, replacing any earlier registration.
    pub fn register_content_package(
        &self,
        id: &str,
        dir: impl Into<PathBuf>,
    ) -> Result<Catalog, InfraError> {
        let package = ContentPackage::new(id, dir);
        let catalog = discover_exercises(&package.dir().join(&self.exercises_dir))?;

        info!(
            target = "application::packages",
            package = id,
            exercises = catalog.len(),
            "Content package registered"
        );

        self.catalogs.insert(id.to_string(), catalog.clone());
        self.insert(package);
        Ok(catalog)
    }

    /// Register a package without scanning it.
    pub fn insert(&self, package: ContentPackage) {
        self.packages.insert(package.id().to_string(), package);
    }

    pub fn get(&self, id: &str) -> Option<ContentPackage> {
        self.packages.get(id).map(|package| package.value().clone())
    }

    pub fn catalog(&self, id: &str) -> Option<Catalog> {
        self.catalogs.get(id).map(|catalog| catalog.value().clone())
    }

    pub fn exercises_dir(&self) -> &str {
        &self.exercises_dir
    }
}
