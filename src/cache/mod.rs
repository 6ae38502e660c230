//! Exercise cache.
//!
//! Two-level, process-lifetime storage: content package id → exercise name →
//! loaded record. Loads are single-flight per key: while one is running every
//! other request for the same key awaits that same load and observes its
//! outcome. Failed loads leave no trace, so the next request retries.
//!
//! Records are never evicted; exercises are static for a deployment. Call
//! [`ExerciseCache::invalidate`] to force a reload after content changes.

mod exercises;
mod slot;

pub use exercises::ExerciseCache;

pub(crate) const METRIC_CACHE_HIT: &str = "clickfill_exercise_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "clickfill_exercise_cache_miss_total";
pub(crate) const METRIC_CACHE_JOIN: &str = "clickfill_exercise_cache_join_total";
pub(crate) const METRIC_LOAD_FAILURE: &str = "clickfill_exercise_load_failure_total";
pub(crate) const METRIC_LOAD_MS: &str = "clickfill_exercise_load_ms";
pub(crate) const METRIC_RENDER_HIT: &str = "clickfill_render_cache_hit_total";
