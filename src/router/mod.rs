//! Multi-round Trip-Based search (spec.md §4.4): a synchronous, single
//! -threaded scan that starts from access boardings, walks enqueued trip
//! segments round by round, and records Pareto-optimal egress arrivals.

mod filter;
pub mod itinerary;
pub mod state;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{trace, warn};

pub use filter::{AcceptAll, ByAgencyAllowList, ByRouteType, TripFilter};
pub use itinerary::{Itinerary, Leg, backtrack};
pub use state::{Allocator, ResultLabel};

use crate::config::RouterConfig;
use crate::index::ScheduleIndex;
use crate::model::{ServiceDay, StopId, StoppingEvent};
use crate::shared::time::{Duration, Time};
use crate::store::TransferStore;
use crate::transfers::TransferMap;

use state::{AccessRef, EnqueuedTripSegment, insert_dominant};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The query's abort flag fired between rounds. The allocator passed to
    /// `route` still holds whatever partial `result` was found — see
    /// [`Allocator::result`].
    #[error("query aborted before completion")]
    Aborted,
    /// Access stops resolved to zones whose service-day definitions may
    /// disagree and no [`TimeZonePolicy`] was supplied to arbitrate.
    #[error("access stops span incompatible time zones with no TimeZonePolicy supplied")]
    IncompatibleServiceDays,
}

/// Resolves spec.md §9's open question about access-stop time zones: the
/// core has no calendar/timezone library (deliberately — see DESIGN.md), so
/// it cannot itself decide whether two IANA zone strings denote the same
/// service day at a given instant. A query spanning more than one distinct
/// zone must supply a policy; otherwise it is rejected outright rather than
/// silently guessing.
#[derive(Debug, Clone)]
pub enum TimeZonePolicy {
    /// All access stops are asserted to share one zone regardless of what
    /// their individual `zone` fields say.
    TreatAsSingleZone,
    /// The caller has already reconciled zones upstream and supplies the
    /// single [`ServiceDay`] to use.
    Resolved(ServiceDay),
}

#[derive(Debug, Clone)]
pub struct AccessStop {
    pub stop: StopId,
    pub walk: Duration,
    pub zone: Option<Arc<str>>,
}

#[derive(Debug, Clone)]
pub struct EgressStop {
    pub stop: StopId,
    pub walk: Duration,
}

pub struct RouteQuery<'a> {
    pub access: &'a [AccessStop],
    pub egress: &'a [EgressStop],
    pub initial_time: Time,
    pub day: ServiceDay,
    pub trip_filter: Arc<dyn TripFilter>,
    pub time_zone_policy: Option<TimeZonePolicy>,
}

/// Executes the round-based TB scan against one [`ScheduleIndex`].
pub struct TripBasedRouter<'a> {
    index: &'a ScheduleIndex,
    config: RouterConfig,
}

impl<'a> TripBasedRouter<'a> {
    pub fn new(index: &'a ScheduleIndex, config: RouterConfig) -> Self {
        Self { index, config }
    }

    /// Fetches the day's [`TransferMap`] from `store`, defaulting to an
    /// empty map for an unprepared day (spec.md §4.3 — not an error), and
    /// runs [`Self::route`] against it.
    pub fn route_via_store(
        &self,
        store: &dyn TransferStore,
        query: &RouteQuery,
        allocator: &mut Allocator,
        abort: &AtomicBool,
    ) -> Result<Vec<ResultLabel>, Error> {
        let transfers = store.get_or_empty(query.day);
        self.route(&transfers, query, allocator, abort)
    }

    /// Runs one profile-free TB search: all rounds up to `config.max_rounds`,
    /// or until a round enqueues nothing new.
    pub fn route(
        &self,
        transfers: &TransferMap,
        query: &RouteQuery,
        allocator: &mut Allocator,
        abort: &AtomicBool,
    ) -> Result<Vec<ResultLabel>, Error> {
        allocator.reset();

        if query.access.is_empty() {
            return Ok(Vec::new());
        }

        self.check_time_zones(query)?;

        self.seed(allocator, query);

        std::mem::swap(&mut allocator.queue, &mut allocator.next_queue);
        allocator.next_queue.clear();
        allocator
            .queue
            .sort_by_key(|&idx| self.event_departure(&allocator.segments[idx as usize].event));

        for round in 0..self.config.max_rounds {
            if abort.load(Ordering::Relaxed) {
                warn!("router: aborted at round {round}");
                return Err(Error::Aborted);
            }
            if allocator.queue.is_empty() {
                break;
            }

            for seg_idx in allocator.queue.clone() {
                self.scan_egress(allocator, seg_idx, round, query);
            }
            for seg_idx in allocator.queue.clone() {
                self.scan_transfers(allocator, seg_idx, transfers, query);
            }

            std::mem::swap(&mut allocator.queue, &mut allocator.next_queue);
            allocator.next_queue.clear();
        }

        Ok(allocator.result.clone())
    }

    /// `routeNaiveProfile(start, length)` — spec.md §4.4: runs `route` once
    /// per minute from `start + length` down to `start`, accumulating a
    /// single dominated result set.
    pub fn route_naive_profile(
        &self,
        transfers: &TransferMap,
        base_query: &RouteQuery,
        profile_length: Duration,
        allocator: &mut Allocator,
        abort: &AtomicBool,
    ) -> Result<Vec<ResultLabel>, Error> {
        let mut combined: Vec<ResultLabel> = Vec::new();
        let minute = Duration::from_seconds(60);
        let start = base_query.initial_time;
        let end = start + profile_length;

        let mut t = end;
        loop {
            if abort.load(Ordering::Relaxed) {
                warn!("router: profile search aborted");
                return Err(Error::Aborted);
            }

            let query = RouteQuery {
                access: base_query.access,
                egress: base_query.egress,
                initial_time: t,
                day: base_query.day,
                trip_filter: base_query.trip_filter.clone(),
                time_zone_policy: base_query.time_zone_policy.clone(),
            };
            let found = self.route(transfers, &query, allocator, abort)?;
            for label in found {
                insert_dominant(&mut combined, label);
            }

            if t <= start {
                break;
            }
            t = t - minute;
        }

        Ok(combined)
    }

    fn check_time_zones(&self, query: &RouteQuery) -> Result<(), Error> {
        let mut zones = query.access.iter().filter_map(|a| a.zone.as_ref());
        let Some(first) = zones.next() else {
            return Ok(());
        };
        let diverges = zones.any(|z| z != first);
        if diverges && query.time_zone_policy.is_none() {
            return Err(Error::IncompatibleServiceDays);
        }
        Ok(())
    }

    fn seed(&self, allocator: &mut Allocator, query: &RouteQuery) {
        for access in query.access {
            let earliest_departure = query.initial_time + access.walk;
            let Ok(boardings) = self.index.boardings_by_pattern(&access.stop) else {
                continue;
            };
            for events in boardings.values() {
                if let Some((event, trip_idx)) =
                    self.first_valid_boarding(events, earliest_departure, query.day, query.trip_filter.as_ref())
                {
                    let board_time =
                        self.index.stop_times_by_trip_idx(trip_idx)[event.stop_sequence as usize].departure;
                    self.enqueue(
                        allocator,
                        event,
                        None,
                        None,
                        query.day,
                        Some(AccessRef {
                            stop: access.stop.clone(),
                            walk: access.walk,
                            board_time,
                        }),
                    );
                }
            }
        }
    }

    fn first_valid_boarding(
        &self,
        events: &[StoppingEvent],
        earliest_departure: Time,
        day: ServiceDay,
        filter: &dyn TripFilter,
    ) -> Option<(StoppingEvent, u32)> {
        let start = events.partition_point(|event| self.event_departure(event) < earliest_departure);
        for event in &events[start..] {
            let Some(trip_idx) = self.index.trip_idx(&event.trip) else {
                continue;
            };
            if !self
                .index
                .service_active_idx(self.index.trip_record(trip_idx).service_idx, day)
            {
                continue;
            }
            let Ok(meta) = self.index.trip_meta(&event.trip) else {
                continue;
            };
            if !filter.accept(&meta) {
                continue;
            }
            return Some((event.clone(), trip_idx));
        }
        None
    }

    fn event_departure(&self, event: &StoppingEvent) -> Time {
        let Some(trip_idx) = self.index.trip_idx(&event.trip) else {
            return crate::shared::time::MAX;
        };
        self.index.stop_times_by_trip_idx(trip_idx)[event.stop_sequence as usize].departure
    }

    /// Pass 1: records egress hits along `seg_idx`'s trip within its
    /// enqueued range, applying result dominance pruning.
    fn scan_egress(&self, allocator: &mut Allocator, seg_idx: u32, round: usize, query: &RouteQuery) {
        let segment = allocator.segments[seg_idx as usize].clone();
        let Some(trip_idx) = self.index.trip_idx(&segment.event.trip) else {
            return;
        };
        let stop_times = self.index.stop_times_by_trip_idx(trip_idx);
        let start = segment.event.stop_sequence + 1;
        let end = segment.to_sequence_exclusive.min(stop_times.len() as u32);

        for i in start..end {
            let st = stop_times[i as usize];
            if st.arrival >= allocator.earliest_arrival {
                break;
            }
            for egress in query.egress {
                let Some(egress_idx) = self.index.stop_idx(&egress.stop) else {
                    continue;
                };
                if egress_idx != st.stop_idx {
                    continue;
                }
                let arrival = st.arrival + egress.walk;
                if arrival < allocator.earliest_arrival {
                    allocator.earliest_arrival = arrival;
                    let transfers = self.count_transfers(allocator, seg_idx);
                    let departure = self.root_departure(allocator, seg_idx);
                    let label = ResultLabel {
                        round,
                        egress_stop: egress.stop.clone(),
                        arrival,
                        transfers,
                        departure,
                        final_event: StoppingEvent::new(segment.event.trip.clone(), st.sequence),
                        parent_segment: seg_idx,
                    };
                    trace!(
                        "router: egress hit at {:?} round {round} arrival {:?}",
                        egress.stop, arrival
                    );
                    insert_dominant(&mut allocator.result, label);
                }
            }
        }
    }

    /// Pass 2: enqueues every precomputed transfer reachable from `seg_idx`'s
    /// trip within its enqueued range.
    fn scan_transfers(&self, allocator: &mut Allocator, seg_idx: u32, transfers: &TransferMap, query: &RouteQuery) {
        let segment = allocator.segments[seg_idx as usize].clone();
        let Some(trip_idx) = self.index.trip_idx(&segment.event.trip) else {
            return;
        };
        let stop_times = self.index.stop_times_by_trip_idx(trip_idx);
        let start = segment.event.stop_sequence + 1;
        let end = segment.to_sequence_exclusive.min(stop_times.len() as u32);

        for i in start..end {
            let st = stop_times[i as usize];
            let e = StoppingEvent::new(segment.event.trip.clone(), st.sequence);
            let Some(onward) = transfers.get(&e) else {
                continue;
            };
            for d in onward.iter() {
                let Ok(meta) = self.index.trip_meta(&d.trip) else {
                    continue;
                };
                if !query.trip_filter.accept(&meta) {
                    continue;
                }
                self.enqueue(allocator, d.clone(), Some(e.clone()), Some(seg_idx), segment.day, None);
            }
        }
    }

    /// `enqueue(d, origin, parent, ...)` — spec.md §4.4. `access` is `Some`
    /// only for round-0 boardings; their `to_sequence_exclusive` naturally
    /// comes out as "+∞" since `trip_done_from_index` starts empty.
    fn enqueue(
        &self,
        allocator: &mut Allocator,
        event: StoppingEvent,
        transfer_origin: Option<StoppingEvent>,
        parent: Option<u32>,
        day: ServiceDay,
        access: Option<AccessRef>,
    ) {
        let done_from = allocator
            .trip_done_from_index
            .get(&event.trip)
            .copied()
            .unwrap_or(u32::MAX);
        if event.stop_sequence >= done_from {
            return;
        }

        let idx = allocator.segments.len() as u32;
        allocator.segments.push(EnqueuedTripSegment {
            event: event.clone(),
            to_sequence_exclusive: done_from,
            day,
            transfer_origin,
            parent,
            access,
        });
        allocator.next_queue.push(idx);

        if let Ok(pattern) = self.index.pattern_of(&event.trip)
            && let Some(pos) = pattern
                .trips
                .iter()
                .position(|&t| self.index.trip_descriptor_by_idx(t) == &event.trip)
        {
            for &later_trip_idx in &pattern.trips[pos..] {
                let descriptor = self.index.trip_descriptor_by_idx(later_trip_idx).clone();
                allocator
                    .trip_done_from_index
                    .entry(descriptor)
                    .and_modify(|v| {
                        if event.stop_sequence < *v {
                            *v = event.stop_sequence;
                        }
                    })
                    .or_insert(event.stop_sequence);
            }
        }
    }

    /// Counts "real" transfers from the root to `seg_idx`, suppressing
    /// same-`block_id` through-runs (spec.md §4.4).
    fn count_transfers(&self, allocator: &Allocator, seg_idx: u32) -> usize {
        let mut count = 0usize;
        let mut current = seg_idx;
        loop {
            let segment = &allocator.segments[current as usize];
            let Some(parent_idx) = segment.parent else {
                return count;
            };
            let parent_segment = &allocator.segments[parent_idx as usize];
            if segment.event.trip != parent_segment.event.trip {
                let this_block = self.index.trip_meta(&segment.event.trip).ok().and_then(|m| m.block_id);
                let parent_block = self
                    .index
                    .trip_meta(&parent_segment.event.trip)
                    .ok()
                    .and_then(|m| m.block_id);
                let continuation = matches!((this_block, parent_block), (Some(a), Some(b)) if a == b);
                if !continuation {
                    count += 1;
                }
            }
            current = parent_idx;
        }
    }

    fn root_departure(&self, allocator: &Allocator, seg_idx: u32) -> Time {
        let mut current = seg_idx;
        loop {
            let segment = &allocator.segments[current as usize];
            match segment.parent {
                Some(parent_idx) => current = parent_idx,
                None => {
                    return segment
                        .access
                        .as_ref()
                        .map(|a| a.board_time)
                        .unwrap_or_else(|| self.event_departure(&segment.event));
                }
            }
        }
    }
}
