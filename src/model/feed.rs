use std::fmt::{self, Display};
use std::sync::Arc;

/// Opaque identifier for a single GTFS feed.
///
/// Two feeds are equal iff their string identifiers match; the identifier
/// itself carries no meaning to the core beyond disambiguating stops, trips
/// and routes sourced from different schedules that share a [`ScheduleIndex`](crate::index::ScheduleIndex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedId(Arc<str>);

impl FeedId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FeedId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for FeedId {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl From<Arc<str>> for FeedId {
    fn from(value: Arc<str>) -> Self {
        Self(value)
    }
}

impl Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FeedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
