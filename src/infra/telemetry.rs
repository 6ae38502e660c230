use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::{
    METRIC_CACHE_HIT, METRIC_CACHE_JOIN, METRIC_CACHE_MISS, METRIC_LOAD_FAILURE, METRIC_LOAD_MS,
    METRIC_RENDER_HIT,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Hosts that already run their own subscriber should skip this and call
/// [`describe_metrics`] directly.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Exercise requests served from a loaded record."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Exercise requests that started a load."
        );
        describe_counter!(
            METRIC_CACHE_JOIN,
            Unit::Count,
            "Exercise requests that awaited a load already in flight."
        );
        describe_counter!(
            METRIC_LOAD_FAILURE,
            Unit::Count,
            "Exercise loads that failed."
        );
        describe_counter!(
            METRIC_RENDER_HIT,
            Unit::Count,
            "Content initializations served from cached fragments."
        );
        describe_histogram!(
            METRIC_LOAD_MS,
            Unit::Milliseconds,
            "Exercise load latency in milliseconds."
        );
    });
}
