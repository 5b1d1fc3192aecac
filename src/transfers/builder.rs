use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::TransferBuilderConfig;
use crate::index::ScheduleIndex;
use crate::model::{InterpolatedTransfer, ServiceDay, StoppingEvent, TransferRule};
use crate::shared::time::{Duration, Time};
use crate::transfers::{Error, TransferMap};

/// Consumes a [`ScheduleIndex`] plus a graph of intra- and inter-feed walking
/// transfers and produces, per service day, a [`TransferMap`].
pub struct TransferBuilder<'a> {
    index: &'a ScheduleIndex,
    config: TransferBuilderConfig,
    stop_to_rules: HashMap<u32, Vec<TransferRule>>,
    stop_to_interpolated: HashMap<u32, Vec<InterpolatedTransfer>>,
}

impl<'a> TransferBuilder<'a> {
    pub fn new(
        index: &'a ScheduleIndex,
        rules: Vec<TransferRule>,
        interpolated: Vec<InterpolatedTransfer>,
        config: TransferBuilderConfig,
    ) -> Self {
        let mut stop_to_rules: HashMap<u32, Vec<TransferRule>> = HashMap::new();
        for rule in rules {
            stop_to_rules.entry(rule.from_stop).or_default().push(rule);
        }

        let mut stop_to_interpolated: HashMap<u32, Vec<InterpolatedTransfer>> = HashMap::new();
        for walk in interpolated {
            stop_to_interpolated
                .entry(walk.from_stop)
                .or_default()
                .push(walk);
        }

        Self {
            index,
            config,
            stop_to_rules,
            stop_to_interpolated,
        }
    }

    /// Builds the [`TransferMap`] for `day`, processing trips in parallel via
    /// `rayon`, mirroring `raptor/explorer.rs`'s `map_init`-scratch-buffer
    /// pattern and feeding a `DashMap` for the thread-safe insert the spec
    /// calls for (spec.md §4.2 "Concurrency").
    pub fn build(&self, day: ServiceDay) -> Result<TransferMap, Error> {
        let now = std::time::Instant::now();

        let pool = self.config.threads.map(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .expect("failed to build transfer-builder thread pool")
        });

        let map: DashMap<StoppingEvent, Vec<StoppingEvent>> = DashMap::new();

        let run = || -> Result<(), Error> {
            (0..self.index.trip_count() as u32)
                .into_par_iter()
                .try_for_each(|trip_idx| {
                    if !self.trip_active(trip_idx, day) {
                        return Ok(());
                    }
                    let produced = self.build_for_trip(trip_idx, day)?;
                    for (origin, onward) in produced {
                        map.entry(origin).or_default().extend(onward);
                    }
                    Ok(())
                })
        };

        match &pool {
            Some(pool) => pool.install(run)?,
            None => run()?,
        }

        let frozen: TransferMap = map
            .into_iter()
            .map(|(origin, onward)| (origin, onward.into_boxed_slice()))
            .collect();

        debug!(
            "built transfer map for service day {:?}: {} origins in {:?}",
            day,
            frozen.len(),
            now.elapsed()
        );

        Ok(frozen)
    }

    fn trip_active(&self, trip_idx: u32, day: ServiceDay) -> bool {
        let record = self.index.trip_record(trip_idx);
        self.index.service_active_idx(record.service_idx, day)
    }

    /// Per-trip backward walk (spec.md §4.2 steps 1-3).
    fn build_for_trip(
        &self,
        trip_idx: u32,
        day: ServiceDay,
    ) -> Result<Vec<(StoppingEvent, Vec<StoppingEvent>)>, Error> {
        let descriptor = self.index.trip_descriptor_by_idx(trip_idx).clone();
        let stop_times = self.index.stop_times_by_trip_idx(trip_idx);
        if stop_times.is_empty() {
            return Ok(Vec::new());
        }

        for w in stop_times.windows(2) {
            if w[0].arrival > w[0].departure || w[0].departure > w[1].arrival {
                return Err(Error::InconsistentStopTimes(descriptor));
            }
        }

        let mut earliest_arrival: HashMap<u32, Time> = HashMap::new();
        let mut out: Vec<(StoppingEvent, Vec<StoppingEvent>)> = Vec::new();

        // Walk backward from the second-to-last stop: a `StoppingEvent` is
        // never keyed on the last stop of its trip (spec.md §3).
        for i in (0..stop_times.len() - 1).rev() {
            let st = stop_times[i];
            let a = st.arrival;
            let origin = StoppingEvent::new(descriptor.clone(), st.sequence);

            let mut candidates: Vec<(u32, Duration, Option<u32>)> = vec![(st.stop_idx, Duration::ZERO, None)];
            if let Some(rules) = self.stop_to_rules.get(&st.stop_idx) {
                for rule in rules {
                    if rule.from_trip.is_some_and(|t| t != trip_idx) {
                        continue;
                    }
                    let walk = rule.min_transfer_time.unwrap_or(Duration::ZERO);
                    candidates.push((rule.to_stop, walk, rule.to_trip));
                }
            }
            if let Some(walks) = self.stop_to_interpolated.get(&st.stop_idx) {
                for walk in walks {
                    candidates.push((walk.to_stop, walk.walk_seconds, None));
                }
            }

            let mut retained: Vec<StoppingEvent> = Vec::new();

            for (to_stop, walk, scoped_trip) in candidates {
                let earliest_departure = a + walk;
                // One candidate per pattern serving `to_stop` (spec.md §4.2
                // step 2): a scoped rule names a single trip, so it can only
                // ever contribute one candidate; an unscoped rule/walk may
                // surface one qualifying boarding per pattern, each subject
                // independently to the cap and the dominance check below.
                let found: Vec<(StoppingEvent, Time, Duration)> = match scoped_trip {
                    Some(target_trip) => {
                        if target_trip as usize >= self.index.trip_count() {
                            return Err(Error::ServiceMissing(descriptor.clone()));
                        }
                        self.find_scoped_boarding(target_trip, to_stop, earliest_departure, day, &origin)
                            .into_iter()
                            .collect()
                    }
                    None => self.find_first_boarding(to_stop, earliest_departure, day, &origin)?,
                };

                for (event, effective_departure, day_offset) in found {
                    if effective_departure - a >= self.config.max_transfer_duration {
                        continue;
                    }

                    if let Some(updates) =
                        self.simulate_forward(&event, day_offset, &earliest_arrival)
                    {
                        for (stop_idx, arrival) in &updates {
                            earliest_arrival
                                .entry(*stop_idx)
                                .and_modify(|e| {
                                    if *arrival < *e {
                                        *e = *arrival;
                                    }
                                })
                                .or_insert(*arrival);
                        }
                        retained.push(event);
                    }
                }
            }

            if !retained.is_empty() {
                out.push((origin, retained));
            }

            // Fold walking costs into the dominance bound for stops reachable
            // from this origin, so earlier (lower-sequence) iterations of
            // this same backward walk see the tightened bound (spec.md
            // §4.2 step 3).
            if let Some(walks) = self.stop_to_interpolated.get(&st.stop_idx) {
                for walk in walks {
                    let arrival = a + walk.walk_seconds;
                    earliest_arrival
                        .entry(walk.to_stop)
                        .and_modify(|e| {
                            if arrival < *e {
                                *e = arrival;
                            }
                        })
                        .or_insert(arrival);
                }
            }
        }

        Ok(out)
    }

    /// Binary-searches the sorted boardings of *every* pattern serving
    /// `to_stop` for that pattern's first departure `>= earliest_departure`
    /// whose service is active on `day`, returning one candidate per
    /// pattern rather than a single cross-pattern winner (spec.md §4.2 step
    /// 2: "For each pattern boarding at s' ... take the first trip T'").
    /// Collapsing every pattern serving a stop into one earliest-departing
    /// boarding would silently drop transfers onto any pattern whose first
    /// qualifying departure isn't globally the earliest at that stop, even
    /// though each pattern is independently subject to the cap and the
    /// dominance check in `build_for_trip`. Falls back to a one-day
    /// wraparound search per pattern when that pattern has nothing
    /// qualifying directly — the overnight heuristic of spec.md §4.2 and
    /// §9's first open question.
    fn find_first_boarding(
        &self,
        to_stop: u32,
        earliest_departure: Time,
        day: ServiceDay,
        origin: &StoppingEvent,
    ) -> Result<Vec<(StoppingEvent, Time, Duration)>, Error> {
        let stop_id = self.index.stop_id_by_idx(to_stop).clone();
        let boardings = self
            .index
            .boardings_by_pattern(&stop_id)
            .map_err(|_| Error::UnknownStop(stop_id.clone()))?;

        let mut out = Vec::new();
        for events in boardings.values() {
            if let Some(found) =
                self.first_qualifying_boarding(events, earliest_departure, day, Duration::ZERO, origin)
            {
                out.push(found);
                continue;
            }

            if earliest_departure.as_seconds() >= 86_400 {
                let wrapped_departure = Time::from_seconds(earliest_departure.as_seconds() - 86_400);
                if let Some(found) = self.first_qualifying_boarding(
                    events,
                    wrapped_departure,
                    day,
                    Duration::from_seconds(86_400),
                    origin,
                ) {
                    warn!(
                        "transfer builder: overnight wrap applied searching boardings at stop {:?}",
                        stop_id
                    );
                    out.push(found);
                }
            }
        }

        Ok(out)
    }

    /// Scans one pattern's sorted boardings, starting at the first departure
    /// `>= earliest_departure`, for the first event that is neither equal to
    /// `origin` (spec.md §3: "Transfers never point to themselves") nor on
    /// an inactive service — advancing within the pattern rather than
    /// abandoning it, since a later boarding in the same pattern may still
    /// qualify.
    fn first_qualifying_boarding(
        &self,
        events: &[StoppingEvent],
        earliest_departure: Time,
        day: ServiceDay,
        day_offset: Duration,
        origin: &StoppingEvent,
    ) -> Option<(StoppingEvent, Time, Duration)> {
        let start = events.partition_point(|event| {
            self.event_departure(event) + day_offset < earliest_departure
        });

        for event in &events[start..] {
            if event == origin {
                continue;
            }
            let Some(trip_idx) = self.index.trip_idx(&event.trip) else {
                continue;
            };
            if !self.index.service_active_idx(self.index.trip_record(trip_idx).service_idx, day) {
                continue;
            }
            let departure = self.event_departure(event) + day_offset;
            return Some((event.clone(), departure, day_offset));
        }

        None
    }

    /// Finds the first qualifying stop time of `target_trip` at `to_stop`
    /// (a GTFS transfer rule scoped to a specific `to_trip`), falling back to
    /// a one-day wraparound search when nothing qualifies directly — the
    /// same overnight heuristic `find_first_boarding` applies, since spec.md
    /// §4.2's overnight rule carves out no exception for scoped transfers.
    fn find_scoped_boarding(
        &self,
        target_trip: u32,
        to_stop: u32,
        earliest_departure: Time,
        day: ServiceDay,
        origin: &StoppingEvent,
    ) -> Option<(StoppingEvent, Time, Duration)> {
        if !self.index.service_active_idx(self.index.trip_record(target_trip).service_idx, day) {
            return None;
        }

        if let Some(found) = self.first_scoped_match(
            target_trip,
            to_stop,
            earliest_departure,
            Duration::ZERO,
            origin,
        ) {
            return Some(found);
        }

        if earliest_departure.as_seconds() >= 86_400 {
            let wrapped_departure = Time::from_seconds(earliest_departure.as_seconds() - 86_400);
            if let Some(found) = self.first_scoped_match(
                target_trip,
                to_stop,
                wrapped_departure,
                Duration::from_seconds(86_400),
                origin,
            ) {
                warn!(
                    "transfer builder: overnight wrap applied searching scoped boarding on trip {:?}",
                    self.index.trip_descriptor_by_idx(target_trip)
                );
                return Some(found);
            }
        }

        None
    }

    fn first_scoped_match(
        &self,
        target_trip: u32,
        to_stop: u32,
        earliest_departure: Time,
        day_offset: Duration,
        origin: &StoppingEvent,
    ) -> Option<(StoppingEvent, Time, Duration)> {
        let descriptor = self.index.trip_descriptor_by_idx(target_trip).clone();
        let is_origin_trip = descriptor == origin.trip;
        let stop_times = self.index.stop_times_by_trip_idx(target_trip);
        let st = stop_times.iter().find(|st| {
            st.stop_idx == to_stop
                && st.departure + day_offset >= earliest_departure
                && !(is_origin_trip && st.sequence == origin.stop_sequence)
        })?;
        Some((
            StoppingEvent::new(descriptor, st.sequence),
            st.departure + day_offset,
            day_offset,
        ))
    }

    fn event_departure(&self, event: &StoppingEvent) -> Time {
        let trip_idx = self
            .index
            .trip_idx(&event.trip)
            .expect("boardings_by_pattern only yields events for trips present in the index");
        self.index.stop_times_by_trip_idx(trip_idx)[event.stop_sequence as usize].departure
    }

    /// Simulates `event`'s trip forward from its boarding sequence,
    /// returning the downstream `(stop_idx, arrival)` pairs it improves on,
    /// or `None` if it improves nothing (spec.md §4.2's dominance rule).
    fn simulate_forward(
        &self,
        event: &StoppingEvent,
        day_offset: Duration,
        earliest_arrival: &HashMap<u32, Time>,
    ) -> Option<Vec<(u32, Time)>> {
        let trip_idx = self.index.trip_idx(&event.trip)?;
        let stop_times = self.index.stop_times_by_trip_idx(trip_idx);
        let mut improves = false;
        let mut updates = Vec::new();

        for st in &stop_times[event.stop_sequence as usize + 1..] {
            let arrival = st.arrival + day_offset;
            let existing = earliest_arrival.get(&st.stop_idx).copied();
            if existing.is_none_or(|e| arrival < e) {
                improves = true;
            }
            updates.push((st.stop_idx, arrival));
        }

        improves.then_some(updates)
    }
}
