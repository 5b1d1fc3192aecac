//! Reconstructs traveller-visible journeys from a [`ResultLabel`] by walking
//! its [`EnqueuedTripSegment`](super::state::EnqueuedTripSegment) parent
//! chain back to the access root (spec.md §4.5).

use std::sync::Arc;

use crate::index::ScheduleIndex;
use crate::model::StopId;
use crate::shared::time::{Duration, Time};

use super::state::Allocator;
use super::ResultLabel;

/// One ride on a single trip, from boarding to alighting.
///
/// `trip_id`/`route_id` identify the trip actually ridden; a GTFS `block_id`
/// continuation still produces two legs here (the trip id genuinely
/// changes), even though [`super::TripBasedRouter`] does not count it as a
/// transfer for Pareto purposes (spec.md §4.4's transfer-counting rule is
/// about the *count*, not about collapsing the itinerary's legs).
#[derive(Debug, Clone, serde::Serialize)]
pub struct Leg {
    pub board_stop: StopId,
    pub board_time: Time,
    pub alight_stop: StopId,
    pub alight_time: Time,
    pub trip_id: Arc<str>,
    pub route_id: Arc<str>,
}

/// A full journey: an ordered ride sequence terminating in an egress walk.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Itinerary {
    pub legs: Vec<Leg>,
    pub egress_stop: StopId,
    pub egress_walk: Duration,
    pub departure: Time,
    pub arrival: Time,
    pub transfers: usize,
}

/// Walks `label`'s parent chain through `allocator`'s segment arena back to
/// the access root and assembles the ordered [`Leg`] list.
///
/// Mirrors `raptor::path::backtrack`'s walk of `Allocator::parents`,
/// generalized from "one hop per round" to "one hop per enqueued segment",
/// since a single TB round can chain through several transfers once profile
/// search is layered on top.
pub fn backtrack(index: &ScheduleIndex, allocator: &Allocator, label: &ResultLabel) -> Itinerary {
    // Collect the chain root-first by walking parent pointers and reversing.
    let mut chain = Vec::new();
    let mut current = Some(label.parent_segment);
    while let Some(idx) = current {
        chain.push(idx);
        current = allocator.segments[idx as usize].parent;
    }
    chain.reverse();

    let mut legs = Vec::with_capacity(chain.len());
    for (pos, &seg_idx) in chain.iter().enumerate() {
        let segment = &allocator.segments[seg_idx as usize];
        let trip_idx = index
            .trip_idx(&segment.event.trip)
            .expect("segment's trip existed during the query that produced it");
        let stop_times = index.stop_times_by_trip_idx(trip_idx);

        let board_st = stop_times[segment.event.stop_sequence as usize];
        let board_stop = index.stop_id_by_idx(board_st.stop_idx).clone();
        let board_time = segment
            .access
            .as_ref()
            .map(|a| a.board_time)
            .unwrap_or(board_st.departure);

        // The alighting point of this leg is where the *next* segment in the
        // chain transferred in from, or — for the final leg — the label's
        // own final stopping event.
        let alight_sequence = match chain.get(pos + 1) {
            Some(&next_idx) => allocator.segments[next_idx as usize]
                .transfer_origin
                .as_ref()
                .expect("non-root segments always record a transfer origin")
                .stop_sequence,
            None => label.final_event.stop_sequence,
        };
        let alight_st = stop_times[alight_sequence as usize];

        legs.push(Leg {
            board_stop,
            board_time,
            alight_stop: index.stop_id_by_idx(alight_st.stop_idx).clone(),
            alight_time: alight_st.arrival,
            trip_id: segment.event.trip.trip_id.clone(),
            route_id: segment.event.trip.route_id.clone(),
        });
    }

    let egress_walk = label.arrival - legs.last().map(|l| l.alight_time).unwrap_or(Time::from_seconds(0));

    Itinerary {
        legs,
        egress_stop: label.egress_stop.clone(),
        egress_walk,
        departure: label.departure,
        arrival: label.arrival,
        transfers: label.transfers,
    }
}
