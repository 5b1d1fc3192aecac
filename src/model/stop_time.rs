use crate::shared::time::Time;

/// A single stopping event's schedule: when a trip arrives at and departs
/// from one stop.
///
/// `sequence` is trip-local, starts at 0, and strictly increases along the
/// trip. `arrival`/`departure` are seconds from service-day noon-minus-12h
/// (the GTFS convention) and may exceed 86 400 for trips that run past
/// midnight — see `spec.md` §3 and the overnight handling in
/// [`crate::transfers`] and [`crate::router`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StopTime {
    /// Index of the owning trip in [`crate::index::ScheduleIndex::trips`].
    pub trip_idx: u32,
    /// Index of the stop in [`crate::index::ScheduleIndex::stops`].
    pub stop_idx: u32,
    /// Zero-based, trip-local position — equal to the offset of this record
    /// within the trip's stop-time slice.
    pub sequence: u32,
    pub arrival: Time,
    pub departure: Time,
    /// Raw GTFS `pickup_type`/`drop_off_type` codes. Part of pattern
    /// identity alongside `stop_idx` (spec.md §4.1).
    pub pickup_type: u8,
    pub drop_off_type: u8,
}

/// A contiguous range within the index's flat `stop_times` table belonging
/// to one trip, enabling O(1) `stopTimes(trip)` lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopTimeSlice {
    pub start: u32,
    pub count: u32,
}
