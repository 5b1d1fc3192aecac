use std::sync::Arc;

use crate::model::feed::FeedId;
use crate::shared::time::Time;

/// Identifies a single trip, after frequency expansion.
///
/// Frequency-based trips are expanded at index-build time so that each
/// `(tripId, startTime)` pair becomes its own [`TripDescriptor`]; downstream
/// code never re-expands a frequency block. `start_time` is `None` for trips
/// that were not generated from a `frequencies.txt` block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TripDescriptor {
    pub feed: FeedId,
    pub trip_id: Arc<str>,
    pub start_time: Option<Time>,
    pub route_id: Arc<str>,
}

/// Opaque caller-defined operating day.
///
/// The core treats this as nothing more than a key a [`ServiceCalendar`]
/// predicate and a [`crate::store::TransferStore`] can be indexed by; turning
/// a calendar date into a `ServiceDay` is the GTFS parser's job, upstream of
/// this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceDay(pub i64);

/// A predicate answering whether a service operates on a given [`ServiceDay`].
///
/// Built once per distinct `service_id` at index-build time from whatever
/// `calendar.txt`/`calendar_dates.txt` representation the caller's GTFS
/// parser produced.
pub type ServiceCalendar = Arc<dyn Fn(ServiceDay) -> bool + Send + Sync>;

/// Metadata about a trip exposed to a [`crate::router::TripFilter`].
///
/// This is intentionally a thin read-only view rather than the full internal
/// `Trip` record, so that filters stay decoupled from the index's storage
/// layout.
#[derive(Debug, Clone)]
pub struct TripMeta<'a> {
    pub descriptor: &'a TripDescriptor,
    pub route_type: i32,
    pub agency_id: &'a str,
    pub block_id: Option<&'a str>,
}

/// Equivalence class of trips sharing an identical stop-id sequence (and
/// pickup/drop-off-type sequence) within one feed.
///
/// Trips in a pattern are sorted by first-stop departure time; per spec this
/// sort order is required for the pruning trick in [`crate::router`] to be
/// correct. Feeds that violate the "strict total order by first-stop
/// departure" invariant are still accepted — the pattern's pruning is simply
/// less effective, not incorrect.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub index: u32,
    pub feed: FeedId,
    /// Stop indices (into [`crate::index::ScheduleIndex`]'s stop table), in
    /// the order every trip in this pattern visits them.
    pub stops: Arc<[u32]>,
    /// Trip indices, sorted ascending by departure time at `stops[0]`.
    pub trips: Arc<[u32]>,
}

impl Pattern {
    /// Position of `stop_idx` within this pattern's stop sequence, if served.
    pub fn index_of_stop(&self, stop_idx: u32) -> Option<u32> {
        self.stops
            .iter()
            .position(|s| *s == stop_idx)
            .map(|i| i as u32)
    }
}
