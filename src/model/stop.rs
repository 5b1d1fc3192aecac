use std::sync::Arc;

use crate::model::feed::FeedId;

/// A stop within a specific feed.
///
/// Equality is componentwise: two [`StopId`]s are equal iff both the feed and
/// the stop code match, so identically-coded stops from different feeds never
/// collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StopId {
    pub feed: FeedId,
    pub code: Arc<str>,
}

impl StopId {
    pub fn new(feed: FeedId, code: impl Into<Arc<str>>) -> Self {
        Self {
            feed,
            code: code.into(),
        }
    }
}
