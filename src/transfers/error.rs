use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("unknown stop {0:?}")]
    UnknownStop(crate::model::StopId),
    #[error("non-monotonic stop-times for trip {0:?}")]
    InconsistentStopTimes(crate::model::TripDescriptor),
    #[error("transfer candidate of trip {0:?} is scoped to a trip index missing from the index")]
    ServiceMissing(crate::model::TripDescriptor),
}
