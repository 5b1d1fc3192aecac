//! A Trip-Based (TB) public transit journey planner core.
//!
//! Given a schedule built from already-parsed GTFS-shaped rows
//! ([`index::ScheduleIndexBuilder`]), a precomputed per-service-day
//! [`transfers::TransferMap`] ([`transfers::TransferBuilder`]), and a
//! profile query (access stops, egress stops, a start instant), this crate
//! computes a Pareto-optimal set of journeys minimising
//! `(arrival time, number of transfers, -departure time)` via
//! [`router::TripBasedRouter`].
//!
//! This is a library, not an application: it has no GTFS file parser, no
//! OpenStreetMap ingestion, no street-network access/egress routing, no
//! HTTP or CLI surface, and no opinion on how a [`store::TransferStore`] is
//! persisted to disk. Callers own all of that; this crate owns the
//! schedule index, the transfer precomputation, and the round-based search.

pub mod config;
pub mod index;
pub mod model;
pub mod router;
pub mod shared;
pub mod store;
pub mod transfers;
