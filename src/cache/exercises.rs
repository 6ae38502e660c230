use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use metrics::{counter, histogram};
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use crate::application::loader::LoadExercise;
use crate::application::packages::PackageRegistry;
use crate::domain::error::ExerciseError;
use crate::domain::exercise::{ExerciseRecord, RenderedFragments};
use crate::domain::names::ExerciseName;
use crate::domain::package::ContentPackage;

use super::slot::{LoadOutcome, PendingLoad, Slot};
use super::{
    METRIC_CACHE_HIT, METRIC_CACHE_JOIN, METRIC_CACHE_MISS, METRIC_LOAD_FAILURE, METRIC_LOAD_MS,
    METRIC_RENDER_HIT,
};

type ExerciseSlots = DashMap<ExerciseName, Slot>;

/// Shared cache of loaded exercises for one content type.
pub struct ExerciseCache {
    packages: DashMap<String, Arc<ExerciseSlots>>,
    loader: Arc<dyn LoadExercise>,
    registry: Arc<PackageRegistry>,
}

impl ExerciseCache {
    pub fn new(loader: Arc<dyn LoadExercise>, registry: Arc<PackageRegistry>) -> Self {
        Self {
            packages: DashMap::new(),
            loader,
            registry,
        }
    }

    /// Return the record for `(package_id, exercise)`, loading it if needed.
    ///
    /// Concurrent callers for a key that is still loading await the same load
    /// and all receive its outcome.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_or_load(
        &self,
        package_id: &str,
        exercise: &str,
    ) -> Result<Arc<ExerciseRecord>, ExerciseError> {
        let name = ExerciseName::parse(exercise)?;
        let Some(package) = self.registry.get(package_id) else {
            debug!(
                target = "cache::exercises",
                package = package_id,
                "Unknown content package"
            );
            return Err(ExerciseError::not_found(exercise));
        };
        let slots = self.package_slots(package_id);

        let pending = match slots.entry(name.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Ready(record) => {
                    counter!(METRIC_CACHE_HIT).increment(1);
                    return Ok(Arc::clone(record));
                }
                Slot::Loading { pending, .. } => {
                    counter!(METRIC_CACHE_JOIN).increment(1);
                    debug!(
                        target = "cache::exercises",
                        exercise = %name,
                        "Joining in-flight exercise load"
                    );
                    pending.clone()
                }
            },
            Entry::Vacant(entry) => {
                counter!(METRIC_CACHE_MISS).increment(1);
                let pending = self.start_load(package, name.clone());
                entry.insert(Slot::loading(pending.clone()));
                pending
            }
        };

        let outcome = pending.clone().await;
        settle(&slots, &name, &pending, &outcome);
        outcome
    }

    /// Like [`get_or_load`](Self::get_or_load), then return the record's
    /// rendered fragments, running `render` only if they were never produced.
    pub async fn get_or_load_and_render<E, F>(
        &self,
        package_id: &str,
        exercise: &str,
        render: F,
    ) -> Result<RenderedFragments, E>
    where
        E: From<ExerciseError>,
        F: FnOnce(&ExerciseRecord) -> Result<RenderedFragments, E> + Send,
    {
        let record = self.get_or_load(package_id, exercise).await?;
        if record.rendered().is_some() {
            counter!(METRIC_RENDER_HIT).increment(1);
        }
        record.rendered_or_try_init(render).cloned()
    }

    /// Drop a cached record so the next request reloads it.
    ///
    /// A load that is still running stays in its slot: requests arriving
    /// before it finishes join it, and its result is discarded instead of
    /// stored. The key never has two loads in flight.
    pub fn invalidate(&self, package_id: &str, exercise: &str) -> bool {
        let Ok(name) = ExerciseName::parse(exercise) else {
            return false;
        };
        let Some(slots) = self.existing_slots(package_id) else {
            return false;
        };
        let mut changed = false;
        if let Entry::Occupied(mut entry) = slots.entry(name)
            && !entry.get_mut().keep_after_invalidate(&mut changed)
        {
            entry.remove();
        }
        changed
    }

    /// Invalidate every exercise of a content package, with the same rules
    /// as [`invalidate`](Self::invalidate).
    pub fn invalidate_package(&self, package_id: &str) -> bool {
        let Some(slots) = self.existing_slots(package_id) else {
            return false;
        };
        let mut changed = false;
        slots.retain(|_, slot| slot.keep_after_invalidate(&mut changed));
        changed
    }

    /// Number of cached or loading exercises for a package.
    pub fn len(&self, package_id: &str) -> usize {
        self.packages
            .get(package_id)
            .map(|slots| slots.len())
            .unwrap_or(0)
    }

    fn existing_slots(&self, package_id: &str) -> Option<Arc<ExerciseSlots>> {
        self.packages
            .get(package_id)
            .map(|slots| Arc::clone(slots.value()))
    }

    fn package_slots(&self, package_id: &str) -> Arc<ExerciseSlots> {
        if let Some(slots) = self.packages.get(package_id) {
            return Arc::clone(slots.value());
        }
        let slots = self.packages.entry(package_id.to_string()).or_default();
        Arc::clone(slots.value())
    }

    fn start_load(&self, package: ContentPackage, name: ExerciseName) -> PendingLoad {
        let loader = Arc::clone(&self.loader);
        let span = info_span!("exercise_load", package = package.id(), exercise = %name);

        async move {
            let started = Instant::now();
            let outcome = loader.load(&package, &name).await;
            histogram!(METRIC_LOAD_MS).record(started.elapsed().as_secs_f64() * 1000.0);

            match outcome {
                Ok(record) => {
                    info!(target = "cache::exercises", "Exercise loaded");
                    Ok(Arc::new(record))
                }
                Err(err) => {
                    counter!(METRIC_LOAD_FAILURE).increment(1);
                    warn!(
                        target = "cache::exercises",
                        error = %err,
                        "Exercise load failed"
                    );
                    Err(err)
                }
            }
        }
        .instrument(span)
        .boxed()
        .shared()
    }
}

/// Publish a finished load. Failed and stale loads clear the slot; a slot
/// already settled by another waiter is left alone.
fn settle(slots: &ExerciseSlots, name: &ExerciseName, pending: &PendingLoad, outcome: &LoadOutcome) {
    let Entry::Occupied(mut entry) = slots.entry(name.clone()) else {
        return;
    };
    if !entry.get().is_loading(pending) {
        return;
    }
    let fresh = matches!(entry.get(), Slot::Loading { stale: false, .. });
    match outcome {
        Ok(record) if fresh => {
            entry.insert(Slot::Ready(Arc::clone(record)));
        }
        _ => {
            entry.remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::future::join_all;

    use super::*;
    use crate::domain::payload::ExercisePayload;

    /// Counts invocations and the peak number of overlapping loads; fails
    /// the first `failures` loads.
    struct CountingLoader {
        calls: AtomicUsize,
        active: AtomicUsize,
        peak: AtomicUsize,
        failures: usize,
        delay: Duration,
    }

    impl CountingLoader {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                failures,
                delay: Duration::from_millis(20),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LoadExercise for CountingLoader {
        async fn load(
            &self,
            _package: &ContentPackage,
            name: &ExerciseName,
        ) -> Result<ExerciseRecord, ExerciseError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(active, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(ExerciseError::parse("simulated failure"));
            }
            Ok(ExerciseRecord::new(
                format!("<p>{name}</p>"),
                "",
                ExercisePayload::default(),
            ))
        }
    }

    fn cache_with(loader: Arc<CountingLoader>) -> ExerciseCache {
        let registry = Arc::new(PackageRegistry::new());
        registry.insert(ContentPackage::new("pkg", "/srv/packages/pkg"));
        ExerciseCache::new(loader, registry)
    }

    #[tokio::test]
    async fn sequential_hits_reuse_the_same_record() {
        let loader = CountingLoader::new(0);
        let cache = cache_with(Arc::clone(&loader));

        let first = cache.get_or_load("pkg", "a-b").await.expect("first");
        let second = cache.get_or_load("pkg", "a-b").await.expect("second");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_load() {
        let loader = CountingLoader::new(0);
        let cache = cache_with(Arc::clone(&loader));

        let results = join_all((0..16).map(|_| cache.get_or_load("pkg", "shared"))).await;

        assert_eq!(loader.calls(), 1);
        let records: Vec<_> = results
            .into_iter()
            .map(|result| result.expect("record"))
            .collect();
        assert!(records.iter().all(|record| Arc::ptr_eq(record, &records[0])));
        assert_eq!(records[0].body_markup(), "<p>shared</p>");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_share_one_load() {
        let loader = CountingLoader::new(0);
        let cache = Arc::new(cache_with(Arc::clone(&loader)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_or_load("pkg", "threaded").await })
            })
            .collect();

        let mut records = Vec::new();
        for handle in handles {
            records.push(handle.await.expect("join").expect("record"));
        }

        assert_eq!(loader.calls(), 1);
        assert!(records.iter().all(|record| Arc::ptr_eq(record, &records[0])));
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter_and_clears_the_slot() {
        let loader = CountingLoader::new(1);
        let cache = cache_with(Arc::clone(&loader));

        let results = join_all((0..4).map(|_| cache.get_or_load("pkg", "flaky"))).await;
        assert_eq!(loader.calls(), 1);
        assert!(results.iter().all(|result| matches!(result, Err(ExerciseError::Parse { .. }))));
        assert_eq!(cache.len("pkg"), 0);

        let retried = cache.get_or_load("pkg", "flaky").await.expect("retry succeeds");
        assert_eq!(retried.body_markup(), "<p>flaky</p>");
        assert_eq!(loader.calls(), 2);
    }

    #[tokio::test]
    async fn unknown_package_is_not_found_and_not_cached() {
        let loader = CountingLoader::new(0);
        let cache = cache_with(Arc::clone(&loader));

        let err = cache.get_or_load("other", "a").await.expect_err("unknown");
        assert_eq!(err, ExerciseError::not_found("a"));
        assert_eq!(loader.calls(), 0);
        assert_eq!(cache.len("other"), 0);
    }

    #[tokio::test]
    async fn invalid_names_never_reach_the_loader() {
        let loader = CountingLoader::new(0);
        let cache = cache_with(Arc::clone(&loader));

        let err = cache.get_or_load("pkg", "..-etc").await.expect_err("traversal");
        assert!(matches!(err, ExerciseError::NotFound { .. }));
        assert_eq!(loader.calls(), 0);
    }

    #[tokio::test]
    async fn invalidate_forces_a_reload() {
        let loader = CountingLoader::new(0);
        let cache = cache_with(Arc::clone(&loader));

        let first = cache.get_or_load("pkg", "x").await.expect("first");
        assert!(cache.invalidate("pkg", "x"));
        assert!(!cache.invalidate("pkg", "x"));
        let second = cache.get_or_load("pkg", "x").await.expect("second");

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(loader.calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_during_load_never_starts_a_second_load() {
        let loader = CountingLoader::new(0);
        let cache = cache_with(Arc::clone(&loader));

        let first = cache.get_or_load("pkg", "x");
        let second = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert!(cache.invalidate("pkg", "x"));
            assert!(!cache.invalidate("pkg", "x"));
            cache.get_or_load("pkg", "x").await
        };
        let (first, second) = tokio::join!(first, second);
        let (first, second) = (first.expect("first"), second.expect("second"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.calls(), 1);
        assert_eq!(loader.peak(), 1);
        assert_eq!(cache.len("pkg"), 0);

        let reloaded = cache.get_or_load("pkg", "x").await.expect("reload");
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(loader.calls(), 2);
        assert_eq!(cache.len("pkg"), 1);
    }

    #[tokio::test]
    async fn invalidating_a_package_during_load_keeps_one_load_in_flight() {
        let loader = CountingLoader::new(0);
        let cache = cache_with(Arc::clone(&loader));
        cache.get_or_load("pkg", "done").await.expect("ready");

        let loading = cache.get_or_load("pkg", "slow");
        let racing = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert!(cache.invalidate_package("pkg"));
            assert_eq!(cache.len("pkg"), 1);
            cache.get_or_load("pkg", "slow").await
        };
        let (loading, racing) = tokio::join!(loading, racing);

        assert!(Arc::ptr_eq(&loading.expect("loading"), &racing.expect("racing")));
        assert_eq!(loader.calls(), 2);
        assert_eq!(loader.peak(), 1);
        assert_eq!(cache.len("pkg"), 0);
    }

    #[tokio::test]
    async fn packages_are_isolated() {
        let loader = CountingLoader::new(0);
        let registry = Arc::new(PackageRegistry::new());
        registry.insert(ContentPackage::new("one", "/srv/one"));
        registry.insert(ContentPackage::new("two", "/srv/two"));
        let cache = ExerciseCache::new(Arc::clone(&loader) as Arc<dyn LoadExercise>, registry);

        cache.get_or_load("one", "x").await.expect("one");
        cache.get_or_load("two", "x").await.expect("two");

        assert_eq!(loader.calls(), 2);
        assert!(cache.invalidate_package("one"));
        assert_eq!(cache.len("one"), 0);
        assert_eq!(cache.len("two"), 1);
    }

    #[tokio::test]
    async fn render_pass_runs_once_per_record() {
        let loader = CountingLoader::new(0);
        let cache = cache_with(Arc::clone(&loader));
        let renders = AtomicUsize::new(0);

        for _ in 0..3 {
            let fragments = cache
                .get_or_load_and_render::<ExerciseError, _>("pkg", "view", |record| {
                    renders.fetch_add(1, Ordering::SeqCst);
                    Ok(RenderedFragments {
                        head: "<meta>".into(),
                        body: record.body_markup().to_string(),
                    })
                })
                .await
                .expect("fragments");
            assert_eq!(fragments.body, "<p>view</p>");
        }

        assert_eq!(renders.load(Ordering::SeqCst), 1);
        assert_eq!(loader.calls(), 1);
    }
}
