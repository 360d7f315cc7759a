pub mod logger;

pub mod logging_defs;
#[macro_use]
pub mod macros;

use logger::{PerfListener, SpanCategories};
use logging_defs::*;
use std::time::Duration;
use std::time::Instant;

/// A [`PerfListener`] that forwards span events to `tracing` at debug level.
/// Only spans in the configured [`SpanCategories`] are reported.
pub struct TracingListener {
    categories: SpanCategories,
}

impl TracingListener {
    pub fn new(categories: SpanCategories) -> TracingListener {
        TracingListener { categories }
    }
}

impl PerfListener for TracingListener {
    fn is_interested_in_span(&self, span_id: u64) -> bool {
        self.categories.intersects(SpanCategories::of(span_id))
    }

    fn on_span_start(&self, span_id: u64, _start_time: Instant) {
        tracing::debug!(span = name(span_id), "span started");
    }

    fn on_check_point(
        &self,
        span_id: u64,
        _point_time: Instant,
        duration_since_last_checkpoint: Duration,
        point_label: &str,
    ) {
        tracing::debug!(
            span = name(span_id),
            point = point_label,
            seconds = duration_since_last_checkpoint.as_secs_f64(),
            "checkpoint"
        );
    }

    fn on_annotate(&self, span_id: u64, annotation: &str) {
        tracing::debug!(span = name(span_id), "{}", annotation);
    }

    fn on_span_end(&self, span_id: u64, span_duration: Duration) {
        tracing::debug!(
            span = name(span_id),
            seconds = span_duration.as_secs_f64(),
            "span ended"
        );
    }
}
