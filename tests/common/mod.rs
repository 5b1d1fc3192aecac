//! Shared fixture builders for the scenario tests of `spec.md` §8.
//!
//! Not a test binary itself (`tests/common/mod.rs`, not `tests/common.rs`)
//! so cargo does not try to run it as one.

use std::sync::Arc;

use transit_tb::index::ScheduleIndex;
use transit_tb::index::raw::{RawFrequency, RawStop, RawStopTime, RawTrip};
use transit_tb::model::{FeedId, ServiceDay, StopId};
use transit_tb::shared::time::Time;

pub const DAY: ServiceDay = ServiceDay(20260727);

pub fn feed() -> FeedId {
    FeedId::new("f")
}

pub fn stop(code: &str) -> StopId {
    StopId::new(feed(), code)
}

pub fn hms(h: u32, m: u32, s: u32) -> Time {
    Time::from_seconds(h * 3600 + m * 60 + s)
}

/// A trip descriptor as `(trip_id, route_id, [(stop_code, arrival, departure)])`.
pub struct TripSpec {
    pub trip_id: &'static str,
    pub route_id: &'static str,
    pub block_id: Option<&'static str>,
    pub stops: Vec<(&'static str, Time, Time)>,
}

pub fn trip(trip_id: &'static str, stops: Vec<(&'static str, Time, Time)>) -> TripSpec {
    TripSpec {
        trip_id,
        route_id: trip_id,
        block_id: None,
        stops,
    }
}

/// Like [`trip`], but scoped to `block_id` — the same physical vehicle
/// continuing as a different trip (spec.md §4.4's through-run suppression).
pub fn trip_with_block(
    trip_id: &'static str,
    block_id: &'static str,
    stops: Vec<(&'static str, Time, Time)>,
) -> TripSpec {
    TripSpec {
        trip_id,
        route_id: trip_id,
        block_id: Some(block_id),
        stops,
    }
}

/// Builds a [`ScheduleIndex`] over all stops referenced by `trips`, one
/// always-active service shared by every trip, and every named trip.
pub fn build_index(stops: &[&'static str], trips: Vec<TripSpec>) -> ScheduleIndex {
    let f = feed();
    let mut builder = ScheduleIndex::builder();

    for code in stops {
        builder = builder.with_stop(RawStop { id: stop(code) });
    }

    builder = builder.with_service(f.clone(), "always", |_: ServiceDay| true);

    for spec in trips {
        builder = builder.with_trip(RawTrip {
            feed: f.clone(),
            trip_id: spec.trip_id.into(),
            route_id: spec.route_id.into(),
            service_id: "always".into(),
            route_type: 3,
            agency_id: "AG".into(),
            block_id: spec.block_id.map(Arc::from),
        });
        for (sequence, (code, arrival, departure)) in spec.stops.into_iter().enumerate() {
            builder = builder.with_stop_time(RawStopTime {
                feed: f.clone(),
                trip_id: spec.trip_id.into(),
                stop_code: code.into(),
                sequence: sequence as u32,
                arrival,
                departure,
                pickup_type: 0,
                drop_off_type: 0,
            });
        }
    }

    builder.build().expect("fixture schedule is internally consistent")
}

/// A frequency-based trip: `stops` give the base-template offsets (the
/// first trip's actual times), and `(start, end, headway)` drives expansion.
pub fn build_index_with_frequency(
    stops: &[&'static str],
    trip_id: &'static str,
    template: Vec<(&'static str, Time, Time)>,
    start: Time,
    end: Time,
    headway: transit_tb::shared::time::Duration,
) -> ScheduleIndex {
    let f = feed();
    let mut builder = ScheduleIndex::builder();

    for code in stops {
        builder = builder.with_stop(RawStop { id: stop(code) });
    }
    builder = builder.with_service(f.clone(), "always", |_: ServiceDay| true);
    builder = builder.with_trip(RawTrip {
        feed: f.clone(),
        trip_id: trip_id.into(),
        route_id: trip_id.into(),
        service_id: "always".into(),
        route_type: 3,
        agency_id: "AG".into(),
        block_id: None,
    });
    for (sequence, (code, arrival, departure)) in template.into_iter().enumerate() {
        builder = builder.with_stop_time(RawStopTime {
            feed: f.clone(),
            trip_id: trip_id.into(),
            stop_code: code.into(),
            sequence: sequence as u32,
            arrival,
            departure,
            pickup_type: 0,
            drop_off_type: 0,
        });
    }
    builder = builder.with_frequency(RawFrequency {
        feed: f.clone(),
        trip_id: trip_id.into(),
        start,
        end,
        headway,
    });

    builder.build().expect("frequency fixture schedule is internally consistent")
}
