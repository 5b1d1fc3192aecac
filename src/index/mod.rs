//! The immutable in-memory representation of one or more GTFS feeds,
//! organised for O(1)/O(log n) lookup of stop-times, patterns, service
//! calendars, and per-stop sorted boarding lists (spec.md §4.1).

mod builder;
mod error;
pub mod raw;

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::model::{
    FeedId, Pattern, ServiceCalendar, ServiceDay, StopId, StopTime, StopTimeSlice, StoppingEvent,
    TripDescriptor, TripMeta,
};

pub use builder::ScheduleIndexBuilder;
pub use error::Error;

#[derive(Debug, Clone)]
pub(crate) struct TripRecord {
    pub descriptor: TripDescriptor,
    pub route_type: i32,
    pub agency_id: Arc<str>,
    pub block_id: Option<Arc<str>>,
    pub service_idx: u32,
    pub pattern_idx: u32,
}

pub(crate) struct ServiceRecord {
    pub calendar: ServiceCalendar,
}

/// A read-only, memory-efficient store of every stop, trip, pattern and
/// service calendar handed to an [`ScheduleIndexBuilder`].
///
/// Laid out as flat `Box<[T]>` entity arrays plus `HashMap` primary-key
/// lookups and `Box<[Box<[u32]>]>` adjacency indices, the same shape the
/// RAPTOR-era `Repository` this crate evolved from used for its stops/trips.
pub struct ScheduleIndex {
    stops: Box<[StopId]>,
    stop_lookup: HashMap<StopId, u32>,

    trips: Box<[TripRecord]>,
    trip_lookup: HashMap<TripDescriptor, u32>,

    stop_times: Box<[StopTime]>,
    trip_to_stop_slice: Box<[StopTimeSlice]>,

    services: Box<[ServiceRecord]>,

    patterns: Box<[Pattern]>,

    /// stop_idx -> global stop_time indices at that stop, any trip.
    stop_to_stop_times: Box<[Box<[u32]>]>,

    /// Lazily-populated, at-most-once-per-key memoization of
    /// `boardingsByPattern`, following the teacher's `DashMap`-based
    /// concurrent group-by idiom (`repository/source/gtfs.rs`).
    boarding_cache: DashMap<u32, Arc<HashMap<u32, Arc<[StoppingEvent]>>>>,
}

impl ScheduleIndex {
    pub fn builder() -> ScheduleIndexBuilder {
        ScheduleIndexBuilder::new()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    /// `stopTimes(feedId, tripDescriptor)` — spec.md §4.1.
    pub fn stop_times(&self, trip: &TripDescriptor) -> Result<&[StopTime], Error> {
        let trip_idx = self
            .trip_lookup
            .get(trip)
            .copied()
            .ok_or_else(|| Error::UnknownTrip(trip.clone()))?;
        Ok(self.stop_times_by_trip_idx(trip_idx))
    }

    /// `patternOf(feedId, tripDescriptor)` — spec.md §4.1.
    pub fn pattern_of(&self, trip: &TripDescriptor) -> Result<&Pattern, Error> {
        let trip_idx = self
            .trip_lookup
            .get(trip)
            .copied()
            .ok_or_else(|| Error::UnknownTrip(trip.clone()))?;
        Ok(&self.patterns[self.trips[trip_idx as usize].pattern_idx as usize])
    }

    /// `serviceActive(feedId, tripDescriptor, date)` — spec.md §4.1.
    pub fn service_active(&self, trip: &TripDescriptor, day: ServiceDay) -> Result<bool, Error> {
        let trip_idx = self
            .trip_lookup
            .get(trip)
            .copied()
            .ok_or_else(|| Error::UnknownTrip(trip.clone()))?;
        let service_idx = self.trips[trip_idx as usize].service_idx;
        Ok((self.services[service_idx as usize].calendar)(day))
    }

    /// Read-only view of a trip's metadata, for use with a
    /// [`crate::router::TripFilter`].
    pub fn trip_meta(&self, trip: &TripDescriptor) -> Result<TripMeta<'_>, Error> {
        let trip_idx = self
            .trip_lookup
            .get(trip)
            .copied()
            .ok_or_else(|| Error::UnknownTrip(trip.clone()))?;
        let record = &self.trips[trip_idx as usize];
        Ok(TripMeta {
            descriptor: &record.descriptor,
            route_type: record.route_type,
            agency_id: &record.agency_id,
            block_id: record.block_id.as_deref(),
        })
    }

    /// `boardingsByPattern(stopId)` — spec.md §4.1: a map from pattern index
    /// to the sorted list of boardings of that pattern at `stop`, ascending
    /// by departure time. Memoised per stop with at-most-once population.
    pub fn boardings_by_pattern(
        &self,
        stop: &StopId,
    ) -> Result<Arc<HashMap<u32, Arc<[StoppingEvent]>>>, Error> {
        let stop_idx = self
            .stop_lookup
            .get(stop)
            .copied()
            .ok_or_else(|| Error::UnknownStop(stop.clone()))?;
        Ok(self
            .boarding_cache
            .entry(stop_idx)
            .or_insert_with(|| Arc::new(self.compute_boardings_by_pattern(stop_idx)))
            .clone())
    }

    fn compute_boardings_by_pattern(&self, stop_idx: u32) -> HashMap<u32, Arc<[StoppingEvent]>> {
        let mut by_pattern: HashMap<u32, Vec<(StoppingEvent, crate::shared::time::Time)>> =
            HashMap::new();

        for &st_idx in self.stop_to_stop_times[stop_idx as usize].iter() {
            let stop_time = &self.stop_times[st_idx as usize];
            let trip_idx = stop_time.trip_idx;
            let record = &self.trips[trip_idx as usize];
            let pattern_idx = record.pattern_idx;

            // Boardings never include the last stop of a trip (spec.md §3).
            let slice = self.trip_to_stop_slice[trip_idx as usize];
            let is_last = stop_time.sequence as u32 == slice.count.saturating_sub(1);
            if is_last {
                continue;
            }

            let event = StoppingEvent::new(record.descriptor.clone(), stop_time.sequence);
            by_pattern
                .entry(pattern_idx)
                .or_default()
                .push((event, stop_time.departure));
        }

        by_pattern
            .into_iter()
            .map(|(pattern_idx, mut events)| {
                events.sort_by_key(|(_, departure)| *departure);
                let sorted: Arc<[StoppingEvent]> =
                    events.into_iter().map(|(event, _)| event).collect();
                (pattern_idx, sorted)
            })
            .collect()
    }

    /// Resolves a [`StopId`] to the stable internal index assigned to it at
    /// build time — the numbering [`crate::model::InterpolatedTransfer`] and
    /// [`crate::model::TransferRule`] reference, so that a caller building
    /// the interpolated-transfer graph of spec.md §6 from its own
    /// `StopId`-keyed walking graph can resolve it into the form
    /// [`crate::transfers::TransferBuilder::new`] expects.
    pub fn stop_idx(&self, stop: &StopId) -> Option<u32> {
        self.stop_lookup.get(stop).copied()
    }

    // --- pub(crate) fast paths used by `transfers` and `router` ---


    pub(crate) fn stop_id_by_idx(&self, stop_idx: u32) -> &StopId {
        &self.stops[stop_idx as usize]
    }

    pub(crate) fn trip_idx(&self, trip: &TripDescriptor) -> Option<u32> {
        self.trip_lookup.get(trip).copied()
    }

    pub(crate) fn trip_descriptor_by_idx(&self, trip_idx: u32) -> &TripDescriptor {
        &self.trips[trip_idx as usize].descriptor
    }

    pub(crate) fn trip_record(&self, trip_idx: u32) -> &TripRecord {
        &self.trips[trip_idx as usize]
    }

    pub(crate) fn stop_times_by_trip_idx(&self, trip_idx: u32) -> &[StopTime] {
        let slice = self.trip_to_stop_slice[trip_idx as usize];
        let start = slice.start as usize;
        let end = start + slice.count as usize;
        &self.stop_times[start..end]
    }

    pub(crate) fn pattern_by_idx(&self, pattern_idx: u32) -> &Pattern {
        &self.patterns[pattern_idx as usize]
    }

    pub(crate) fn service_active_idx(&self, service_idx: u32, day: ServiceDay) -> bool {
        (self.services[service_idx as usize].calendar)(day)
    }
}
