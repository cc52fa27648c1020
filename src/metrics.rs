use crate::{BatchSummary, Strategy};
use metrics::{gauge, histogram, increment_counter};
use std::time::Duration;

// Recorded through the `metrics` facade. Without an installed recorder
// every call is a no-op.

pub fn record_fetch(duration: Duration, success: bool) {
    if success {
        increment_counter!("photo_fetches_succeeded_total");
    } else {
        increment_counter!("photo_fetches_failed_total");
    }

    histogram!("photo_fetch_duration_seconds", duration.as_secs_f64());
}

pub fn record_error(kind: &'static str) {
    increment_counter!("photo_fetch_errors_total", "kind" => kind);
}

pub fn record_batch(strategy: Strategy, elapsed: Duration, summary: &BatchSummary) {
    let name = strategy.name();

    histogram!("batch_duration_seconds", elapsed.as_secs_f64(), "strategy" => name);
    gauge!("batch_succeeded", summary.succeeded as f64, "strategy" => name);
    gauge!("batch_failed", summary.failed as f64, "strategy" => name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_fetch(Duration::from_millis(12), true);
        record_fetch(Duration::from_millis(40), false);
        record_error("timeout");
        record_batch(
            Strategy::Threads,
            Duration::from_secs(1),
            &BatchSummary {
                total: 3,
                succeeded: 2,
                failed: 1,
            },
        );
    }
}
