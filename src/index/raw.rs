use std::sync::Arc;

use crate::model::{FeedId, ServiceCalendar, StopId};
use crate::shared::time::Time;

/// A stop row handed to [`super::ScheduleIndexBuilder`], before internal
/// indices are assigned.
#[derive(Debug, Clone)]
pub struct RawStop {
    pub id: StopId,
}

/// A trip row. `start_time` stays `None` for trips that are not generated
/// from a `frequencies.txt` block; [`RawFrequency`] rows cause the builder to
/// synthesize the `Some(_)` variants.
#[derive(Debug, Clone)]
pub struct RawTrip {
    pub feed: FeedId,
    pub trip_id: Arc<str>,
    pub route_id: Arc<str>,
    pub service_id: Arc<str>,
    pub route_type: i32,
    pub agency_id: Arc<str>,
    pub block_id: Option<Arc<str>>,
}

/// One `stop_times.txt` row, scoped to a base (pre-frequency-expansion) trip.
///
/// `pickup_type`/`drop_off_type` are the raw GTFS codes (`0` = regularly
/// scheduled, the common case); they fold into pattern identity alongside
/// the stop-id sequence (spec.md §4.1: "identical (stopId sequence,
/// pickup/dropoff-type sequence)").
#[derive(Debug, Clone)]
pub struct RawStopTime {
    pub feed: FeedId,
    pub trip_id: Arc<str>,
    pub stop_code: Arc<str>,
    pub sequence: u32,
    pub arrival: Time,
    pub departure: Time,
    pub pickup_type: u8,
    pub drop_off_type: u8,
}

/// A `frequencies.txt` row: the named trip is a template whose stop-times are
/// offsets to be replayed at every `start + k*headway < end`.
#[derive(Debug, Clone)]
pub struct RawFrequency {
    pub feed: FeedId,
    pub trip_id: Arc<str>,
    pub start: Time,
    pub end: Time,
    pub headway: crate::shared::time::Duration,
}

/// A `calendar.txt`/`calendar_dates.txt`-derived predicate for one
/// `service_id`, already reduced by the caller's GTFS parser.
#[derive(Clone)]
pub struct RawService {
    pub feed: FeedId,
    pub service_id: Arc<str>,
    pub calendar: ServiceCalendar,
}
