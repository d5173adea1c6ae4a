//! Metric names recorded by the Store runtime.
//!
//! The runtime records through the [`metrics`] facade only. Install whatever
//! recorder/exporter the application uses; without one, recording is a no-op.
//!
//! Every metric carries a `store` label with [`StoreConfig::name`](crate::StoreConfig::name).

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use std::sync::Once;

/// Actions reduced, labelled by `source` (`external` or `effect`)
pub const ACTIONS_TOTAL: &str = "store.actions.total";

/// Time spent inside the reducer per action
pub const REDUCER_DURATION_SECONDS: &str = "store.reducer.duration_seconds";

/// Number of effects returned by one reduction
pub const EFFECTS_COUNT: &str = "store.effects.count";

/// Effect handler streams that failed
pub const EFFECTS_FAILED_TOTAL: &str = "store.effects.failed";

/// Effect handler streams currently merged into the timeline
pub const EFFECTS_ACTIVE: &str = "store.effects.active";

/// States published to subscribers
pub const STATES_PUBLISHED_TOTAL: &str = "store.states.published";

/// Live state subscribers
pub const SUBSCRIBERS: &str = "store.subscribers";

/// Stores that terminated, labelled by `outcome` (`completed` or `failed`)
pub const TERMINATIONS_TOTAL: &str = "store.terminations.total";

static DESCRIBE: Once = Once::new();

/// Register descriptions for every runtime metric.
///
/// Idempotent; the store calls it on construction.
pub fn describe_metrics() {
    DESCRIBE.call_once(|| {
        describe_counter!(ACTIONS_TOTAL, "Total number of actions processed by the reducer");
        describe_histogram!(
            REDUCER_DURATION_SECONDS,
            Unit::Seconds,
            "Time taken to execute the reducer"
        );
        describe_histogram!(EFFECTS_COUNT, "Effects produced per reduction");
        describe_counter!(
            EFFECTS_FAILED_TOTAL,
            "Total number of effect handler streams that failed"
        );
        describe_gauge!(
            EFFECTS_ACTIVE,
            "Effect handler streams still producing actions"
        );
        describe_counter!(
            STATES_PUBLISHED_TOTAL,
            "Total number of states published to subscribers"
        );
        describe_gauge!(SUBSCRIBERS, "Number of live state subscribers");
        describe_counter!(TERMINATIONS_TOTAL, "Total number of terminated stores");
    });
}
