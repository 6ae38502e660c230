//! Exercise content cache and feedback assembly for point-and-click,
//! drag-and-drop, and text fill-in exercises.
//!
//! A content type registers its content packages, then asks
//! [`ExerciseService`](application::service::ExerciseService) for page
//! fragments and for the feedback of graded submissions. Parsing the exercise
//! definition format is left to the content type through
//! [`ExerciseParser`](application::loader::ExerciseParser).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;

/// Name under which the host registers this library.
pub const LIBRARY_NAMESPACE: &str = "clickdragfillin-util";

/// Package description reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryMeta {
    pub name: &'static str,
    pub short_description: &'static str,
    pub description: &'static str,
    pub author: &'static str,
    pub license: &'static str,
    pub version: &'static str,
    pub url: &'static str,
}

pub const LIBRARY_META: LibraryMeta = LibraryMeta {
    name: LIBRARY_NAMESPACE,
    short_description: "Utility functions for point-and-click, drag-and-drop, and text fill-in exercises",
    description: "Utility functions for point-and-click, drag-and-drop, and text fill-in exercises",
    author: "Markku Riekkinen",
    license: env!("CARGO_PKG_LICENSE"),
    version: env!("CARGO_PKG_VERSION"),
    url: "",
};
