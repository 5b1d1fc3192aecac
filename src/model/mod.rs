//! The immutable value types that flow between [`crate::index`],
//! [`crate::transfers`] and [`crate::router`] (spec.md §3).

mod feed;
mod stop;
mod stop_time;
mod stopping_event;
mod transfer;
mod trip;

pub use feed::FeedId;
pub use stop::StopId;
pub use stop_time::{StopTime, StopTimeSlice};
pub use stopping_event::{DecodeError, StoppingEvent};
pub use transfer::{InterpolatedTransfer, TransferRule};
pub use trip::{Pattern, ServiceCalendar, ServiceDay, TripDescriptor, TripMeta};
