//! Ambient configuration structs, in the teacher's plain
//! `#[derive(Default)]`-struct-with-overridable-fields style
//! (`gtfs::Config`) rather than a builder-of-builders.

use crate::shared::time::Duration;

/// Tuning knobs for [`crate::transfers::TransferBuilder`] (spec.md §4.2, §6).
#[derive(Debug, Clone)]
pub struct TransferBuilderConfig {
    /// The 15-minute `MAXIMUM_TRANSFER_DURATION` pattern-pruning cap.
    pub max_transfer_duration: Duration,
    /// `None` uses whichever `rayon` global thread pool is active, matching
    /// spec.md §6's "default CPUs" for `transferBuilderThreads`.
    pub threads: Option<usize>,
}

impl Default for TransferBuilderConfig {
    fn default() -> Self {
        Self {
            max_transfer_duration: Duration::from_minutes(15),
            threads: None,
        }
    }
}

/// Tuning knobs for [`crate::router::TripBasedRouter`] (spec.md §6).
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Caps the number of rounds a single `route` call will run. Deliberately
    /// a much smaller default than `raptor::MAX_ROUNDS` (15): that constant
    /// belongs to the single-criterion RAPTOR search this crate does not
    /// implement, and TB's transfer count is the rider-facing "number of
    /// transfers" rather than RAPTOR's internal trip-hop count.
    pub max_rounds: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { max_rounds: 3 }
    }
}
