use std::collections::HashMap;

use crate::model::{ServiceDay, StopId, StoppingEvent, TripDescriptor};
use crate::shared::time::{self, Duration, Time};

/// A single boarded ride within one query, held in a per-query arena.
///
/// `parent` indexes into the same arena the way `raptor::Allocator`'s flat
/// `parents` matrix indexes by `(round, stop)` — generalized here to "arena
/// slot" since the TB queue is sparse and variable length round to round.
#[derive(Debug, Clone)]
pub(crate) struct EnqueuedTripSegment {
    pub event: StoppingEvent,
    pub to_sequence_exclusive: u32,
    pub day: ServiceDay,
    pub transfer_origin: Option<StoppingEvent>,
    pub parent: Option<u32>,
    pub access: Option<AccessRef>,
}

/// Recorded only on a round-0 (root) segment, so `itinerary::backtrack` can
/// report which access stop a journey started from without re-deriving it.
#[derive(Debug, Clone)]
pub(crate) struct AccessRef {
    pub stop: StopId,
    pub walk: Duration,
    pub board_time: Time,
}

/// A Pareto-optimal arrival recorded during the search. Round/arrival/
/// transfers/departure are public for callers inspecting results directly;
/// `final_event`/`parent_segment` are reconstruction-only and stay crate
/// -private.
#[derive(Debug, Clone)]
pub struct ResultLabel {
    pub round: usize,
    pub egress_stop: StopId,
    pub arrival: Time,
    pub transfers: usize,
    pub departure: Time,
    pub(crate) final_event: StoppingEvent,
    pub(crate) parent_segment: u32,
}

/// Per-query memory pool, reused across repeated `route` calls against one
/// `ScheduleIndex` — the `router` analogue of `raptor::Allocator`.
pub struct Allocator {
    pub(crate) segments: Vec<EnqueuedTripSegment>,
    pub(crate) queue: Vec<u32>,
    pub(crate) next_queue: Vec<u32>,
    pub(crate) trip_done_from_index: HashMap<TripDescriptor, u32>,
    pub(crate) earliest_arrival: Time,
    pub(crate) result: Vec<ResultLabel>,
}

impl Allocator {
    pub fn new() -> Self {
        Self {
            segments: Vec::with_capacity(256),
            queue: Vec::with_capacity(64),
            next_queue: Vec::with_capacity(64),
            trip_done_from_index: HashMap::new(),
            earliest_arrival: time::MAX,
            result: Vec::new(),
        }
    }

    /// Clears all per-query buffers without releasing their allocations.
    pub fn reset(&mut self) {
        self.segments.clear();
        self.queue.clear();
        self.next_queue.clear();
        self.trip_done_from_index.clear();
        self.earliest_arrival = time::MAX;
        self.result.clear();
    }

    /// The current result set. Still populated after an `Err(Error::Aborted)`
    /// from `route` — callers that want the partial journeys found before
    /// cancellation read them here.
    pub fn result(&self) -> &[ResultLabel] {
        &self.result
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Pareto dominance over (arrival, transfers, -departure): `a` dominates `b`
/// when it is at least as good in every dimension (spec.md §4.4).
fn weakly_dominates(a: &ResultLabel, b: &ResultLabel) -> bool {
    a.arrival <= b.arrival && a.transfers <= b.transfers && a.departure >= b.departure
}

/// Inserts `candidate` into `result`, removing anything it dominates and
/// refusing to insert if something already in `result` dominates it. Ties
/// are broken by insertion order: an existing equal label blocks the insert.
pub(crate) fn insert_dominant(result: &mut Vec<ResultLabel>, candidate: ResultLabel) {
    if result.iter().any(|l| weakly_dominates(l, &candidate)) {
        return;
    }
    result.retain(|l| !weakly_dominates(&candidate, l));
    result.push(candidate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeedId;

    fn stop(code: &str) -> StopId {
        StopId::new(FeedId::new("f"), code)
    }

    fn label(arrival: u32, transfers: usize, departure: u32) -> ResultLabel {
        ResultLabel {
            round: transfers,
            egress_stop: stop("C"),
            arrival: Time::from_seconds(arrival),
            transfers,
            departure: Time::from_seconds(departure),
            final_event: StoppingEvent::new(
                crate::model::TripDescriptor {
                    feed: FeedId::new("f"),
                    trip_id: "t".into(),
                    start_time: None,
                    route_id: "r".into(),
                },
                0,
            ),
            parent_segment: 0,
        }
    }

    #[test]
    fn pareto_alternatives_both_survive() {
        let mut result = Vec::new();
        insert_dominant(&mut result, label(100, 1, 10));
        insert_dominant(&mut result, label(90, 0, 5));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn dominated_candidate_is_rejected() {
        let mut result = Vec::new();
        insert_dominant(&mut result, label(100, 0, 10));
        insert_dominant(&mut result, label(110, 1, 5));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].arrival, Time::from_seconds(100));
    }

    #[test]
    fn strictly_better_candidate_evicts_existing() {
        let mut result = Vec::new();
        insert_dominant(&mut result, label(110, 1, 5));
        insert_dominant(&mut result, label(100, 0, 10));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].arrival, Time::from_seconds(100));
    }
}
