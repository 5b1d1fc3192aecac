use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("unknown trip {0:?}")]
    UnknownTrip(crate::model::TripDescriptor),
    #[error("unknown stop {0:?}")]
    UnknownStop(crate::model::StopId),
    #[error("trip references service {1:?} in feed {0} which was never registered")]
    UnknownService(crate::model::FeedId, std::sync::Arc<str>),
    #[error("inconsistent schedule for trip {0:?}: stop-times are not monotonic")]
    InconsistentSchedule(crate::model::TripDescriptor),
}
