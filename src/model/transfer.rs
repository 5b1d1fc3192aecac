use crate::shared::time::Duration;

/// An explicit, GTFS `transfers.txt`-style connection between two stops,
/// optionally scoped to a specific origin and/or destination trip.
///
/// This is an *input* to [`crate::transfers::TransferBuilder`] (spec.md
/// §4.2 step 2(ii), "each explicit GTFS transfer from s"), distinct from the
/// `StoppingEvent -> StoppingEvent` edges the builder produces in the
/// [`crate::transfers::TransferMap`] it outputs.
#[derive(Debug, Clone, Copy)]
pub struct TransferRule {
    pub from_stop: u32,
    pub to_stop: u32,
    pub from_trip: Option<u32>,
    pub to_trip: Option<u32>,
    /// Overrides the walking time that would otherwise be derived from an
    /// [`InterpolatedTransfer`] between the same two stops.
    pub min_transfer_time: Option<Duration>,
}

/// A precomputed short walking connection between two nearby stops, with a
/// fixed walking-time cost. Supplied externally (spec.md §6) alongside the
/// parsed GTFS feeds — computing these from OpenStreetMap or a street-network
/// router is out of scope for this crate.
#[derive(Debug, Clone, Copy)]
pub struct InterpolatedTransfer {
    pub from_stop: u32,
    pub to_stop: u32,
    pub walk_seconds: Duration,
}
