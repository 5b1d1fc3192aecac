use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::index::raw::{RawFrequency, RawService, RawStop, RawStopTime, RawTrip};
use crate::index::{Error, ScheduleIndex, ServiceRecord, TripRecord};
use crate::model::{FeedId, Pattern, ServiceCalendar, StopId, StopTime, StopTimeSlice, TripDescriptor};
use crate::shared::time::{Duration, Time};

/// Accepts already-parsed GTFS-shaped rows and produces an immutable
/// [`ScheduleIndex`]. Row parsing itself (CSV, zip, frequency expansion of
/// upstream formats other than GTFS `frequencies.txt`) is the caller's GTFS
/// parser's job — out of scope here (spec.md §1).
#[derive(Default)]
pub struct ScheduleIndexBuilder {
    stops: Vec<StopId>,
    trips: Vec<RawTrip>,
    stop_times: Vec<RawStopTime>,
    frequencies: Vec<RawFrequency>,
    services: Vec<RawService>,
}

impl ScheduleIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stop(mut self, stop: RawStop) -> Self {
        self.stops.push(stop.id);
        self
    }

    pub fn with_trip(mut self, trip: RawTrip) -> Self {
        self.trips.push(trip);
        self
    }

    pub fn with_stop_time(mut self, stop_time: RawStopTime) -> Self {
        self.stop_times.push(stop_time);
        self
    }

    pub fn with_frequency(mut self, frequency: RawFrequency) -> Self {
        self.frequencies.push(frequency);
        self
    }

    /// Convenience wrapper over [`Self::with_service_row`] for tests and
    /// small fixtures: wraps a bare predicate in a [`ServiceCalendar`].
    pub fn with_service(
        self,
        feed: FeedId,
        service_id: impl Into<Arc<str>>,
        calendar: impl Fn(crate::model::ServiceDay) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.with_service_row(RawService {
            feed,
            service_id: service_id.into(),
            calendar: Arc::new(calendar) as ServiceCalendar,
        })
    }

    pub fn with_service_row(mut self, service: RawService) -> Self {
        self.services.push(service);
        self
    }

    pub fn build(self) -> Result<ScheduleIndex, Error> {
        let now = std::time::Instant::now();

        let (stops, stop_lookup) = Self::build_stops(self.stops);

        let (services, service_lookup) = Self::build_services(self.services);

        let stop_times_by_trip = Self::group_stop_times(self.stop_times);
        let frequencies_by_trip = Self::group_frequencies(self.frequencies);

        let mut trips: Vec<TripRecord> = Vec::with_capacity(self.trips.len());
        let mut trip_lookup: HashMap<TripDescriptor, u32> = HashMap::with_capacity(self.trips.len());
        let mut stop_times: Vec<StopTime> = Vec::new();
        let mut trip_to_stop_slice: Vec<StopTimeSlice> = Vec::new();

        for raw_trip in &self.trips {
            let key = (raw_trip.feed.clone(), raw_trip.trip_id.clone());
            let template = stop_times_by_trip.get(&key).cloned().unwrap_or_default();

            let service_idx = *service_lookup
                .get(&(raw_trip.feed.clone(), raw_trip.service_id.clone()))
                .ok_or_else(|| {
                    Error::UnknownService(raw_trip.feed.clone(), raw_trip.service_id.clone())
                })?;

            let expansions: Vec<Option<Time>> = match frequencies_by_trip.get(&key) {
                Some(freqs) if !freqs.is_empty() && !template.is_empty() => freqs
                    .iter()
                    .flat_map(|f| {
                        let mut t = f.start;
                        let mut starts = Vec::new();
                        while t < f.end {
                            starts.push(t);
                            t += f.headway;
                        }
                        starts
                    })
                    .map(Some)
                    .collect(),
                _ => vec![None],
            };

            let base_departure = template.first().map(|st| st.departure).unwrap_or(Time::from_seconds(0));

            for start_time in expansions {
                let descriptor = TripDescriptor {
                    feed: raw_trip.feed.clone(),
                    trip_id: raw_trip.trip_id.clone(),
                    start_time,
                    route_id: raw_trip.route_id.clone(),
                };

                let offset = match start_time {
                    Some(t) => t - base_departure,
                    None => Duration::ZERO,
                };

                let shifted: Vec<(StopId, StopTime)> = template
                    .iter()
                    .map(|row| {
                        let stop_id = StopId::new(row.feed.clone(), row.stop_code.clone());
                        let stop_time = StopTime {
                            trip_idx: u32::MAX,
                            stop_idx: u32::MAX,
                            sequence: row.sequence,
                            arrival: row.arrival + offset,
                            departure: row.departure + offset,
                            pickup_type: row.pickup_type,
                            drop_off_type: row.drop_off_type,
                        };
                        (stop_id, stop_time)
                    })
                    .collect();

                let monotonic = shifted.iter().all(|(_, st)| st.arrival <= st.departure)
                    && shifted
                        .windows(2)
                        .all(|w| w[0].1.departure <= w[1].1.arrival);
                if !monotonic {
                    return Err(Error::InconsistentSchedule(descriptor));
                }

                let trip_idx = trips.len() as u32;
                let start = stop_times.len() as u32;
                for (stop_id, mut stop_time) in shifted {
                    let stop_idx = *stop_lookup
                        .get(&stop_id)
                        .ok_or_else(|| Error::UnknownStop(stop_id.clone()))?;
                    stop_time.trip_idx = trip_idx;
                    stop_time.stop_idx = stop_idx;
                    stop_times.push(stop_time);
                }
                let count = stop_times.len() as u32 - start;
                trip_to_stop_slice.push(StopTimeSlice { start, count });

                trip_lookup.insert(descriptor.clone(), trip_idx);
                trips.push(TripRecord {
                    descriptor,
                    route_type: raw_trip.route_type,
                    agency_id: raw_trip.agency_id.clone(),
                    block_id: raw_trip.block_id.clone(),
                    service_idx,
                    pattern_idx: u32::MAX,
                });
            }
        }

        let (patterns, trips) = Self::build_patterns(trips, &trip_to_stop_slice, &stop_times);

        let mut stop_to_stop_times: Vec<Vec<u32>> = vec![Vec::new(); stops.len()];
        for (idx, stop_time) in stop_times.iter().enumerate() {
            stop_to_stop_times[stop_time.stop_idx as usize].push(idx as u32);
        }

        debug!(
            "built schedule index: {} stops, {} trips, {} patterns in {:?}",
            stops.len(),
            trips.len(),
            patterns.len(),
            now.elapsed()
        );

        Ok(ScheduleIndex {
            stops: stops.into_boxed_slice(),
            stop_lookup,
            trips: trips.into_boxed_slice(),
            trip_lookup,
            stop_times: stop_times.into_boxed_slice(),
            trip_to_stop_slice: trip_to_stop_slice.into_boxed_slice(),
            services: services.into_boxed_slice(),
            patterns: patterns.into_boxed_slice(),
            stop_to_stop_times: stop_to_stop_times
                .into_iter()
                .map(|v| v.into_boxed_slice())
                .collect(),
            boarding_cache: Default::default(),
        })
    }

    fn build_stops(raw: Vec<StopId>) -> (Vec<StopId>, HashMap<StopId, u32>) {
        let mut stops = Vec::with_capacity(raw.len());
        let mut lookup = HashMap::with_capacity(raw.len());
        for id in raw {
            lookup.entry(id.clone()).or_insert_with(|| {
                let idx = stops.len() as u32;
                stops.push(id);
                idx
            });
        }
        (stops, lookup)
    }

    fn build_services(
        raw: Vec<RawService>,
    ) -> (Vec<ServiceRecord>, HashMap<(FeedId, Arc<str>), u32>) {
        let mut services = Vec::with_capacity(raw.len());
        let mut lookup = HashMap::with_capacity(raw.len());
        for row in raw {
            let idx = services.len() as u32;
            lookup.insert((row.feed, row.service_id), idx);
            services.push(ServiceRecord {
                calendar: row.calendar,
            });
        }
        (services, lookup)
    }

    fn group_stop_times(
        raw: Vec<RawStopTime>,
    ) -> HashMap<(FeedId, Arc<str>), Vec<RawStopTime>> {
        let mut by_trip: HashMap<(FeedId, Arc<str>), Vec<RawStopTime>> = HashMap::new();
        for row in raw {
            by_trip
                .entry((row.feed.clone(), row.trip_id.clone()))
                .or_default()
                .push(row);
        }
        for rows in by_trip.values_mut() {
            rows.sort_by_key(|r| r.sequence);
        }
        by_trip
    }

    fn group_frequencies(
        raw: Vec<RawFrequency>,
    ) -> HashMap<(FeedId, Arc<str>), Vec<RawFrequency>> {
        let mut by_trip: HashMap<(FeedId, Arc<str>), Vec<RawFrequency>> = HashMap::new();
        for row in raw {
            by_trip
                .entry((row.feed.clone(), row.trip_id.clone()))
                .or_default()
                .push(row);
        }
        by_trip
    }

    /// Groups trips by identical (stop-id, pickup-type, drop-off-type)
    /// sequence, the same way the teacher's `generate_raptor_routes` derived
    /// `RaptorRoute`s from `Route`s (`repository/source/gtfs.rs`),
    /// generalized to be per-feed rather than per-`Route` since a TB pattern
    /// spans whatever trips share a stop signature regardless of
    /// display-level route grouping, and to fold in pickup/dropoff-type per
    /// spec.md §4.1 so that two trips sharing stops but differing in
    /// boarding/alighting eligibility at some stop land in distinct
    /// patterns.
    fn build_patterns(
        mut trips: Vec<TripRecord>,
        trip_to_stop_slice: &[StopTimeSlice],
        stop_times: &[StopTime],
    ) -> (Vec<Pattern>, Vec<TripRecord>) {
        let mut groups: HashMap<(FeedId, Vec<(u32, u8, u8)>), Vec<u32>> = HashMap::new();

        for (trip_idx, record) in trips.iter().enumerate() {
            let slice = trip_to_stop_slice[trip_idx];
            let signature: Vec<(u32, u8, u8)> = stop_times
                [slice.start as usize..(slice.start + slice.count) as usize]
                .iter()
                .map(|st| (st.stop_idx, st.pickup_type, st.drop_off_type))
                .collect();
            groups
                .entry((record.descriptor.feed.clone(), signature))
                .or_default()
                .push(trip_idx as u32);
        }

        let mut patterns = Vec::with_capacity(groups.len());
        for ((feed, signature), mut trip_indices) in groups {
            let pattern_idx = patterns.len() as u32;

            trip_indices.sort_by_key(|trip_idx| {
                let slice = trip_to_stop_slice[*trip_idx as usize];
                stop_times[slice.start as usize].departure
            });

            for trip_idx in &trip_indices {
                trips[*trip_idx as usize].pattern_idx = pattern_idx;
            }

            let stops: Vec<u32> = signature.iter().map(|&(stop_idx, _, _)| stop_idx).collect();
            patterns.push(Pattern {
                index: pattern_idx,
                feed,
                stops: stops.into(),
                trips: trip_indices.into(),
            });
        }

        (patterns, trips)
    }
}
